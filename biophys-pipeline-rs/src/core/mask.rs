//! Binary masks and pixel coordinates.

use serde::{Deserialize, Serialize};

/// Integer pixel coordinate, row first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pixel {
    pub row: usize,
    pub col: usize,
}

impl Pixel {
    #[inline]
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Pixel shifted by `(drow, dcol)`, or `None` if it leaves the
    /// non-negative quadrant.
    #[inline]
    pub fn offset(self, drow: isize, dcol: isize) -> Option<Pixel> {
        let row = self.row.checked_add_signed(drow)?;
        let col = self.col.checked_add_signed(dcol)?;
        Some(Pixel { row, col })
    }

    /// True when the two pixels touch in 8-connectivity.
    pub fn is_adjacent(self, other: Pixel) -> bool {
        let dr = self.row.abs_diff(other.row);
        let dc = self.col.abs_diff(other.col);
        dr <= 1 && dc <= 1 && (dr, dc) != (0, 0)
    }
}

/// Row-major binary grid. Nonzero input values become `true`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryMask {
    rows: usize,
    cols: usize,
    data: Vec<bool>,
}

impl BinaryMask {
    /// Creates an all-false mask.
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![false; rows * cols],
        }
    }

    /// Creates a mask of the given size with `pixels` set.
    ///
    /// Pixels outside the grid are ignored.
    pub fn from_pixels(rows: usize, cols: usize, pixels: &[Pixel]) -> Self {
        let mut mask = Self::new(rows, cols);
        for &pixel in pixels {
            mask.set(pixel, true);
        }
        mask
    }

    /// Creates a mask from nested rows. Short rows are padded with `false`.
    pub fn from_rows<T: AsRef<[u8]>>(rows: &[T]) -> Self {
        let cols = rows.iter().map(|r| r.as_ref().len()).max().unwrap_or(0);
        let mut mask = Self::new(rows.len(), cols);
        for (r, row) in rows.iter().enumerate() {
            for (c, &value) in row.as_ref().iter().enumerate() {
                mask.data[r * cols + c] = value != 0;
            }
        }
        mask
    }

    /// Creates a mask from an 8-bit grayscale image.
    pub fn from_luma(image: &image::GrayImage) -> Self {
        let (width, height) = image.dimensions();
        let data = image.pixels().map(|p| p.0[0] != 0).collect();
        Self {
            rows: height as usize,
            cols: width as usize,
            data,
        }
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// True when `pixel` lies inside the grid.
    #[inline]
    pub fn contains(&self, pixel: Pixel) -> bool {
        pixel.row < self.rows && pixel.col < self.cols
    }

    /// Value at `pixel`; out-of-grid reads are `false`.
    #[inline]
    pub fn get(&self, pixel: Pixel) -> bool {
        self.contains(pixel) && self.data[pixel.row * self.cols + pixel.col]
    }

    /// Sets the value at `pixel` if it lies inside the grid.
    pub fn set(&mut self, pixel: Pixel, value: bool) {
        if self.contains(pixel) {
            self.data[pixel.row * self.cols + pixel.col] = value;
        }
    }

    /// Number of set pixels.
    pub fn count_nonzero(&self) -> usize {
        self.data.iter().filter(|&&v| v).count()
    }
}
