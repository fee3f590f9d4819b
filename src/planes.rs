//! Contains the PlaneMapper struct, which describes a relationship
//! between a rectangle on the integral plane with an origin at 0,0
//! (the raster), and a rectangle on the complex plane with an
//! arbitrary pair of corners (the viewport).
use num::Complex;

use crate::errors::{RenderError, Result};

/// The rectangle of the complex plane that gets mapped onto the
/// raster.  `(x1, y1)` lands on pixel (0, 0); `(x2, y2)` is the far
/// corner, one pixel past the last column and row.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Viewport {
    /// Real part of the first corner.
    pub x1: f64,
    /// Imaginary part of the first corner.
    pub y1: f64,
    /// Real part of the second corner.
    pub x2: f64,
    /// Imaginary part of the second corner.
    pub y2: f64,
}

impl Viewport {
    /// Builds a viewport from its two corners.
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Viewport {
        Viewport { x1, y1, x2, y2 }
    }

    /// Builds a viewport from two complex numbers, treating the real
    /// part as x and the imaginary part as y.
    pub fn from_corners(first: Complex<f64>, second: Complex<f64>) -> Viewport {
        Viewport::new(first.re, first.im, second.re, second.im)
    }

    /// The viewport must be non-empty and must not be inverted.  Not
    /// checked by anything downstream, so call this before dispatch.
    pub fn validate(&self) -> Result<()> {
        let finite = [self.x1, self.y1, self.x2, self.y2]
            .iter()
            .all(|v| v.is_finite());
        if !finite || self.x1 >= self.x2 || self.y1 >= self.y2 {
            return Err(RenderError::InvalidViewport {
                x1: self.x1,
                y1: self.y1,
                x2: self.x2,
                y2: self.y2,
            });
        }
        Ok(())
    }
}

impl Default for Viewport {
    fn default() -> Viewport {
        Viewport::new(-2.5, -2.0, 1.0, 2.0)
    }
}

/// Output dimensions and the iteration cap.  Shared, read-only, by
/// every worker.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RasterConfig {
    /// Pixels per row.
    pub width: u32,
    /// Number of rows.
    pub height: u32,
    /// Iterations after which a point is considered inside the set.
    pub max_iter: u32,
}

impl RasterConfig {
    /// Bytes in one RGBA8 row.
    pub fn row_len(&self) -> usize {
        self.width as usize * 4
    }

    /// Bytes in the whole RGBA8 image.
    pub fn len(&self) -> usize {
        self.row_len() * self.height as usize
    }

    /// Describes that the raster has no pixels at all.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Rejects zero dimensions, a zero iteration cap, and images too
    /// large to address.
    pub fn validate(&self) -> Result<()> {
        let reason = if self.width == 0 {
            "width must be at least 1"
        } else if self.height == 0 {
            "height must be at least 1"
        } else if self.max_iter == 0 {
            "iteration cap must be at least 1"
        } else if (self.width as usize)
            .checked_mul(self.height as usize)
            .and_then(|n| n.checked_mul(4))
            .is_none()
        {
            "image is too large to allocate"
        } else {
            return Ok(());
        };
        Err(RenderError::InvalidRasterConfig {
            reason: reason.to_string(),
        })
    }
}

impl Default for RasterConfig {
    fn default() -> RasterConfig {
        RasterConfig {
            width: 1000,
            height: 1000,
            max_iter: 1000,
        }
    }
}

/// Describes the column and row of a pixel on the raster.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Pixel(pub u32, pub u32);

/// Maps pixels on the raster to points on the complex plane.  The
/// per-pixel step is computed once, at construction.
#[derive(Copy, Clone, Debug)]
pub struct PlaneMapper {
    origin: Complex<f64>,
    // Width and height of one pixel, in complex-plane units.
    step: (f64, f64),
}

impl PlaneMapper {
    /// Takes the viewport and the raster it is rendered into.
    pub fn new(viewport: &Viewport, config: &RasterConfig) -> PlaneMapper {
        PlaneMapper {
            origin: Complex::new(viewport.x1, viewport.y1),
            step: (
                (viewport.x2 - viewport.x1) / f64::from(config.width),
                (viewport.y2 - viewport.y1) / f64::from(config.height),
            ),
        }
    }

    /// The complex-plane size of one pixel, as (dx, dy).
    pub fn step(&self) -> (f64, f64) {
        self.step
    }

    /// Given the column and row of a pixel on the raster, return the
    /// complex number at that pixel's upper-left corner.
    pub fn pixel_to_point(&self, pixel: &Pixel) -> Complex<f64> {
        Complex::new(
            self.origin.re + f64::from(pixel.0) * self.step.0,
            self.origin.im + f64::from(pixel.1) * self.step.1,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raster(width: u32, height: u32) -> RasterConfig {
        RasterConfig {
            width,
            height,
            max_iter: 10,
        }
    }

    #[test]
    fn viewport_fails_on_inverted_shape() {
        assert!(Viewport::new(1.0, -1.0, -1.0, 1.0).validate().is_err());
        assert!(Viewport::new(-1.0, 1.0, 1.0, -1.0).validate().is_err());
    }

    #[test]
    fn viewport_fails_on_empty_shape() {
        assert!(Viewport::new(0.0, -1.0, 0.0, 1.0).validate().is_err());
    }

    #[test]
    fn viewport_fails_on_nan() {
        assert!(Viewport::new(std::f64::NAN, -1.0, 1.0, 1.0)
            .validate()
            .is_err());
    }

    #[test]
    fn viewport_passes_on_good_shape() {
        assert!(Viewport::default().validate().is_ok());
        assert!(Viewport::new(0.0, 0.0, 1.0, 1.0).validate().is_ok());
    }

    #[test]
    fn raster_rejects_zeroes() {
        assert!(raster(0, 5).validate().is_err());
        assert!(raster(5, 0).validate().is_err());
        let cfg = RasterConfig {
            max_iter: 0,
            ..raster(5, 5)
        };
        assert!(cfg.validate().is_err());
        assert!(raster(5, 5).validate().is_ok());
    }

    #[test]
    fn raster_lengths() {
        let cfg = raster(3, 2);
        assert_eq!(cfg.row_len(), 12);
        assert_eq!(cfg.len(), 24);
        assert!(!cfg.is_empty());
    }

    #[test]
    fn pixel_to_point_on_positive_planes() {
        let pm = PlaneMapper::new(&Viewport::new(0.0, 0.0, 5.0, 5.0), &raster(5, 5));
        assert_eq!(pm.pixel_to_point(&Pixel(0, 0)), Complex::new(0.0, 0.0));
        assert_eq!(pm.pixel_to_point(&Pixel(2, 2)), Complex::new(2.0, 2.0));
        assert_eq!(pm.pixel_to_point(&Pixel(4, 4)), Complex::new(4.0, 4.0));
    }

    #[test]
    fn pixel_to_points_on_mixed_planes() {
        let pm = PlaneMapper::new(&Viewport::new(-2.0, -2.0, 2.0, 2.0), &raster(4, 4));
        assert_eq!(pm.pixel_to_point(&Pixel(2, 2)), Complex::new(0.0, 0.0));
        assert_eq!(pm.pixel_to_point(&Pixel(0, 0)), Complex::new(-2.0, -2.0));
        assert_eq!(pm.pixel_to_point(&Pixel(4, 4)), Complex::new(2.0, 2.0));
    }

    #[test]
    fn step_follows_non_square_rasters() {
        let pm = PlaneMapper::new(&Viewport::new(-2.0, -1.0, 2.0, 1.0), &raster(8, 2));
        assert_eq!(pm.step(), (0.5, 1.0));
        assert_eq!(pm.pixel_to_point(&Pixel(1, 1)), Complex::new(-1.5, 0.0));
    }
}
