//! The escape-time function, and the palette that turns an escape
//! count into a color.
//!
//! Both functions are pure: the same inputs always produce the same
//! outputs, which is what lets the workers run in any order and still
//! produce byte-identical images.

use num::Complex;

use crate::pool::CancelToken;

/// Opaque black, used for points that never escape.
pub const INSIDE: [u8; 4] = [0, 0, 0, 255];

// Iterations between looks at a stop token.  A power of two.
const STOP_CHECK: u32 = 1 << 12;

/// This is our classic iterator function.  Starting at zero, repeatedly
/// square and add `c` until the squared magnitude reaches 4.0 or
/// `max_iter` iterations have been done.  Returns the number of
/// iterations performed; `max_iter` means the point never escaped and
/// is taken to be inside the set.
///
/// Undefined for `max_iter == 0`; the raster configuration rejects it.
#[inline]
pub fn evaluate(cx: f64, cy: f64, max_iter: u32) -> u32 {
    escape_time(cx, cy, max_iter, || false).unwrap_or(max_iter)
}

/// `evaluate`, abandoned with `None` once `stop` fires.  The token is
/// read every few thousand iterations, so a deep point does not hold
/// up a render that has been called off.
#[inline]
pub fn evaluate_until(cx: f64, cy: f64, max_iter: u32, stop: &CancelToken) -> Option<u32> {
    escape_time(cx, cy, max_iter, || stop.is_cancelled())
}

#[inline]
fn escape_time<F: Fn() -> bool>(cx: f64, cy: f64, max_iter: u32, stopped: F) -> Option<u32> {
    let c = Complex::new(cx, cy);
    let mut z = Complex::new(0.0_f64, 0.0_f64);
    let mut i = 0;
    while i < max_iter && z.norm_sqr() < 4.0 {
        if i & (STOP_CHECK - 1) == STOP_CHECK - 1 && stopped() {
            return None;
        }
        z = z * z + c;
        i += 1;
    }
    Some(i)
}

/// Maps an escape count onto the color wheel.  Points inside the set
/// are black; everything else gets a hue proportional to how long it
/// took to escape, at full saturation and half lightness.
pub fn colorize(iterations: u32, max_iter: u32) -> [u8; 4] {
    if iterations >= max_iter {
        return INSIDE;
    }
    let hue = 360.0 * f64::from(iterations) / f64::from(max_iter);
    let (r, g, b) = hsl_to_rgb(hue, 1.0, 0.5);
    [r, g, b, 255]
}

/// Converts hue (degrees), saturation and lightness (both 0..=1) to
/// RGB, rounding each channel to the nearest integer.
pub fn hsl_to_rgb(hue: f64, saturation: f64, lightness: f64) -> (u8, u8, u8) {
    if saturation == 0.0 {
        let v = channel(lightness);
        return (v, v, v);
    }
    let q = if lightness < 0.5 {
        lightness * (1.0 + saturation)
    } else {
        lightness + saturation - lightness * saturation
    };
    let p = 2.0 * lightness - q;
    let h = hue / 360.0;
    (
        channel(hue_to_rgb(p, q, h + 1.0 / 3.0)),
        channel(hue_to_rgb(p, q, h)),
        channel(hue_to_rgb(p, q, h - 1.0 / 3.0)),
    )
}

fn hue_to_rgb(p: f64, q: f64, t: f64) -> f64 {
    let t = if t < 0.0 {
        t + 1.0
    } else if t > 1.0 {
        t - 1.0
    } else {
        t
    };
    if t < 1.0 / 6.0 {
        p + (q - p) * 6.0 * t
    } else if t < 1.0 / 2.0 {
        q
    } else if t < 2.0 / 3.0 {
        p + (q - p) * (2.0 / 3.0 - t) * 6.0
    } else {
        p
    }
}

#[inline]
fn channel(v: f64) -> u8 {
    (v * 255.0).round().max(0.0).min(255.0) as u8
}
