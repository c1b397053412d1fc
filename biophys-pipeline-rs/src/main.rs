fn main() {
    biophys_pipeline::cli::run();
}
