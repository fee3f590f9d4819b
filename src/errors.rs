// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Everything that can go wrong between receiving a render request
//! and handing back a finished image buffer.

use failure::Fail;

/// Shorthand used throughout the crate.
pub type Result<T> = std::result::Result<T, RenderError>;

/// The error taxonomy of the renderer.  Configuration errors are
/// raised before a single worker is spawned; the rest describe a
/// render that was dispatched but could not be completed.
#[derive(Debug, Clone, PartialEq, Fail)]
pub enum RenderError {
    /// The complex-plane rectangle is empty, inverted, or not finite.
    #[fail(
        display = "invalid viewport ({}, {}) - ({}, {}): the first corner must be above and to the left of the second",
        x1, y1, x2, y2
    )]
    InvalidViewport {
        /// Left edge.
        x1: f64,
        /// Top edge.
        y1: f64,
        /// Right edge.
        x2: f64,
        /// Bottom edge.
        y2: f64,
    },

    /// Zero-sized output, a zero iteration cap, or a buffer too large
    /// to address.
    #[fail(display = "invalid raster configuration: {}", reason)]
    InvalidRasterConfig {
        /// What was wrong with it.
        reason: String,
    },

    /// A render-request parameter was supplied but could not be parsed.
    #[fail(display = "could not parse parameter {} from '{}'", name, value)]
    InvalidParameter {
        /// The parameter's key.
        name: String,
        /// The raw text that was supplied.
        value: String,
    },

    /// A worker stopped before it delivered every row it was assigned.
    #[fail(
        display = "worker {} failed on rows {}..={}: {}",
        unit, start_row, end_row, reason
    )]
    WorkerFailure {
        /// The worker's index within the dispatch.
        unit: usize,
        /// First row the worker did not deliver.
        start_row: u32,
        /// Last row of the worker's range.
        end_row: u32,
        /// The cause, as reported by the worker.
        reason: String,
    },

    /// A failed row range was retried on a fresh worker and failed again.
    #[fail(
        display = "render failed on rows {}..={} after retry: {}",
        start_row, end_row, reason
    )]
    RenderFailed {
        /// First undelivered row.
        start_row: u32,
        /// Last row of the range.
        end_row: u32,
        /// The cause of the final failure.
        reason: String,
    },

    /// The row ranges handed to the pool do not cover the image exactly
    /// once.  Should never happen.
    #[fail(
        display = "row ranges cover {} of {} rows, or overlap",
        covered, height
    )]
    IncompletePartition {
        /// Image height.
        height: u32,
        /// Rows accounted for by the ranges.
        covered: u64,
    },

    /// The same row was delivered twice.
    #[fail(display = "row {} was delivered more than once", row)]
    DuplicateRow {
        /// The offending row.
        row: u32,
    },

    /// A row index that does not exist in the image.
    #[fail(display = "row {} is outside an image {} rows high", row, height)]
    RowOutOfBounds {
        /// The offending row.
        row: u32,
        /// Image height.
        height: u32,
    },

    /// A row whose pixel data is not exactly `width * 4` bytes long.
    #[fail(
        display = "row {} has {} bytes, expected {}",
        row, actual, expected
    )]
    RowLengthMismatch {
        /// The offending row.
        row: u32,
        /// `width * 4`.
        expected: usize,
        /// What was delivered.
        actual: usize,
    },

    /// The image did not complete before the deadline.
    #[fail(display = "render stalled: {} of {} rows received", received, expected)]
    Stalled {
        /// Rows assembled so far.
        received: u32,
        /// Image height.
        expected: u32,
    },

    /// The caller cancelled the render.
    #[fail(display = "render cancelled")]
    Cancelled,
}
