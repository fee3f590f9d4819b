//! Collects rows as they arrive, in whatever order, and writes each
//! into its place in the final image.

use crate::errors::{RenderError, Result};
use crate::planes::RasterConfig;
use crate::rows::RowResult;

/// A finished RGBA8 image, row-major, row 0 first.
#[derive(Clone, Debug, PartialEq)]
pub struct ImageBuffer {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl ImageBuffer {
    /// Pixels per row.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Number of rows.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// The raw `width * height * 4` bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.pixels
    }

    /// Gives up the raw bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.pixels
    }

    /// The bytes of one row.  Panics if `row` is out of range.
    pub fn row(&self, row: u32) -> &[u8] {
        let len = self.width as usize * 4;
        let offset = row as usize * len;
        &self.pixels[offset..offset + len]
    }

    /// The RGBA value of one pixel.  Panics if out of range.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let offset = (y as usize * self.width as usize + x as usize) * 4;
        let mut rgba = [0; 4];
        rgba.copy_from_slice(&self.pixels[offset..offset + 4]);
        rgba
    }
}

/// What the assembler has to say after accepting a row.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Progress {
    /// Still waiting on other rows.
    Pending,
    /// That was the last row.  Reported exactly once.
    Complete,
}

/// Owns the image buffer while rows are arriving.  Each row's byte
/// range is written at most once.
#[derive(Debug)]
pub struct ImageAssembler {
    config: RasterConfig,
    pixels: Vec<u8>,
    received: Vec<bool>,
    count: u32,
}

impl ImageAssembler {
    /// Allocates an empty buffer for the raster.
    pub fn new(config: &RasterConfig) -> ImageAssembler {
        ImageAssembler {
            config: *config,
            pixels: vec![0 as u8; config.len()],
            received: vec![false; config.height as usize],
            count: 0,
        }
    }

    /// Copies the row into place.  Rows that are out of range, the
    /// wrong length, or already delivered are rejected and leave the
    /// buffer untouched.
    pub fn on_row(&mut self, result: RowResult) -> Result<Progress> {
        let row = result.row;
        if row >= self.config.height {
            return Err(RenderError::RowOutOfBounds {
                row,
                height: self.config.height,
            });
        }
        let len = self.config.row_len();
        if result.pixels.len() != len {
            return Err(RenderError::RowLengthMismatch {
                row,
                expected: len,
                actual: result.pixels.len(),
            });
        }
        if self.received[row as usize] {
            return Err(RenderError::DuplicateRow { row });
        }

        let offset = row as usize * len;
        self.pixels[offset..offset + len].copy_from_slice(&result.pixels);
        self.received[row as usize] = true;
        self.count += 1;

        if self.is_complete() {
            Ok(Progress::Complete)
        } else {
            Ok(Progress::Pending)
        }
    }

    /// True once every row has arrived.
    pub fn is_complete(&self) -> bool {
        self.count == self.config.height
    }

    /// Number of distinct rows accepted so far.
    pub fn rows_received(&self) -> u32 {
        self.count
    }

    /// Rows that have not arrived yet, ascending.
    pub fn missing_rows(&self) -> Vec<u32> {
        self.received
            .iter()
            .enumerate()
            .filter(|(_, seen)| !**seen)
            .map(|(row, _)| row as u32)
            .collect()
    }

    /// Hands off the finished image.  An incomplete image is never
    /// handed off; the caller gets `Stalled` instead.
    pub fn take_buffer(self) -> Result<ImageBuffer> {
        if !self.is_complete() {
            return Err(RenderError::Stalled {
                received: self.count,
                expected: self.config.height,
            });
        }
        Ok(ImageBuffer {
            width: self.config.width,
            height: self.config.height,
            pixels: self.pixels,
        })
    }
}
