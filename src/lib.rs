#![deny(missing_docs)]
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Parallel Mandelbrot renderer
//!
//! The Mandelbrot set is the set of points `c` on the complex plane
//! for which repeatedly squaring and adding `c`, starting from zero,
//! never runs off to infinity.  Points outside the set do run off,
//! and how quickly they do it (the "escape time") is the number used
//! to color the image.
//!
//! Rendering is embarrassingly parallel: every pixel depends only on
//! its own coordinates.  This crate cuts the image into contiguous
//! bands of rows, one band per worker thread.  Each worker computes
//! its rows one at a time and sends them to the calling thread, which
//! drops each row into its place in the final RGBA buffer.  Because a
//! row's position depends only on its index, the image comes out
//! byte-identical however the workers' rows happen to interleave.
//!
//! ```no_run
//! let request = mandelbrot::RenderRequest::default();
//! let image = mandelbrot::render(&request).unwrap();
//! assert_eq!(image.as_bytes().len(), 1000 * 1000 * 4);
//! ```

extern crate crossbeam;
extern crate failure;
extern crate itertools;
extern crate log;
extern crate num;
extern crate num_cpus;

pub mod assembler;
pub mod errors;
pub mod escape;
pub mod partition;
pub mod planes;
pub mod pool;
pub mod render;
pub mod request;
pub mod rows;

pub use assembler::{ImageAssembler, ImageBuffer, Progress};
pub use errors::{RenderError, Result};
pub use escape::{colorize, evaluate};
pub use partition::{default_workers, partition, RowRange};
pub use planes::{RasterConfig, Viewport};
pub use pool::{CancelToken, WorkerPool};
pub use render::{render, render_rows, render_with, RenderOptions};
pub use request::RenderRequest;
pub use rows::{compute_row, MandelbrotRows, RowResult, Scanline};
