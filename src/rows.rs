//! Computes whole scanlines.  A row is the unit of work that crosses
//! thread boundaries: workers build one, send it, and never touch it
//! again.

use crate::errors::{RenderError, Result};
use crate::escape::{colorize, evaluate_until};
use crate::planes::{Pixel, PlaneMapper, RasterConfig, Viewport};
use crate::pool::CancelToken;

/// One fully computed scanline in RGBA8 order.
#[derive(Clone, Debug, PartialEq)]
pub struct RowResult {
    /// Absolute row index in the image.
    pub row: u32,
    /// `width * 4` bytes.
    pub pixels: Vec<u8>,
}

/// Anything that can produce a scanline on demand.  The worker pool
/// only knows about this trait, which is also where tests slip in
/// rows that fail or take their time.
pub trait Scanline: Sync {
    /// Produce row `row`.  Must be callable from any thread.
    ///
    /// `stop` fires when the render is over, whether cancelled, timed
    /// out or failed elsewhere.  A row that takes a while should look
    /// at it and give up with `RenderError::Cancelled`; the pool joins
    /// every unit before it returns.
    fn scan(&self, row: u32, stop: &CancelToken) -> Result<RowResult>;
}

/// The Mandelbrot row computer.  Once built it is immutable and is
/// shared by reference among all workers.
#[derive(Copy, Clone, Debug)]
pub struct MandelbrotRows {
    plane: PlaneMapper,
    config: RasterConfig,
}

impl MandelbrotRows {
    /// Takes the viewport and raster configuration for one render.
    pub fn new(viewport: &Viewport, config: &RasterConfig) -> MandelbrotRows {
        MandelbrotRows {
            plane: PlaneMapper::new(viewport, config),
            config: *config,
        }
    }

    /// The raster this computer renders into.
    pub fn config(&self) -> &RasterConfig {
        &self.config
    }
}

impl Scanline for MandelbrotRows {
    fn scan(&self, row: u32, stop: &CancelToken) -> Result<RowResult> {
        compute_row(row, &self.plane, &self.config, stop)
    }
}

/// Walk one row of the raster left to right, evaluating and coloring
/// each pixel.  Gives up with `Cancelled` as soon as `stop` fires,
/// between pixels or partway through a deep one.
pub fn compute_row(
    row: u32,
    plane: &PlaneMapper,
    config: &RasterConfig,
    stop: &CancelToken,
) -> Result<RowResult> {
    let mut pixels = Vec::with_capacity(config.row_len());
    for column in 0..config.width {
        if stop.is_cancelled() {
            return Err(RenderError::Cancelled);
        }
        let c = plane.pixel_to_point(&Pixel(column, row));
        let iterations =
            evaluate_until(c.re, c.im, config.max_iter, stop).ok_or(RenderError::Cancelled)?;
        pixels.extend_from_slice(&colorize(iterations, config.max_iter));
    }
    Ok(RowResult { row, pixels })
}
