//! Ties the pieces together: validate the request, split the rows,
//! dispatch them to the pool, and assemble what comes back.

use std::time::{Duration, Instant};

use log::{debug, error, info};

use crate::assembler::{ImageAssembler, ImageBuffer, Progress};
use crate::errors::Result;
use crate::partition::{check_partition, check_workers, partition};
use crate::planes::RasterConfig;
use crate::pool::{CancelToken, WorkerPool};
use crate::request::RenderRequest;
use crate::rows::{MandelbrotRows, Scanline};

/// How a render copes with things going wrong.
#[derive(Clone, Debug)]
pub struct RenderOptions {
    /// Deadline for the whole image; `None` waits forever.
    pub timeout: Option<Duration>,
    /// Re-dispatch a failed row range once before giving up.
    pub retry: bool,
    /// Fire this to abandon the render.
    pub cancel: CancelToken,
}

impl Default for RenderOptions {
    fn default() -> RenderOptions {
        RenderOptions {
            timeout: None,
            retry: true,
            cancel: CancelToken::new(),
        }
    }
}

/// Render the Mandelbrot set with default options.
pub fn render(request: &RenderRequest) -> Result<ImageBuffer> {
    render_with(request, &RenderOptions::default())
}

/// Render the Mandelbrot set.  Configuration errors are reported
/// before any worker is started.
pub fn render_with(request: &RenderRequest, options: &RenderOptions) -> Result<ImageBuffer> {
    request.validate()?;
    let rows = MandelbrotRows::new(&request.viewport, &request.config);
    info!(
        "rendering {}x{} over ({}, {}) - ({}, {}), {} iterations, {} workers",
        request.config.width,
        request.config.height,
        request.viewport.x1,
        request.viewport.y1,
        request.viewport.x2,
        request.viewport.y2,
        request.config.max_iter,
        request.workers
    );
    render_rows(&rows, &request.config, request.workers, options)
}

/// Render any scanline source into an image of the given size.  The
/// configuration is assumed to be valid; the worker count is checked.
pub fn render_rows<S: Scanline>(
    source: &S,
    config: &RasterConfig,
    workers: usize,
    options: &RenderOptions,
) -> Result<ImageBuffer> {
    let started = Instant::now();
    check_workers(workers)?;
    let ranges = partition(config.height, workers);
    check_partition(&ranges, config.height)?;

    let pool = WorkerPool::new()
        .with_timeout(options.timeout)
        .with_retry(options.retry)
        .with_cancel(options.cancel.clone());

    let mut assembler = ImageAssembler::new(config);
    let dispatched = pool.dispatch(&ranges, source, |row| {
        if assembler.on_row(row)? == Progress::Complete {
            debug!("last row arrived after {:?}", started.elapsed());
        }
        Ok(())
    });

    match dispatched.and_then(|_| assembler.take_buffer()) {
        Ok(image) => {
            info!(
                "rendered {} rows with {} workers in {:?}",
                config.height,
                ranges.len(),
                started.elapsed()
            );
            Ok(image)
        }
        Err(e) => {
            error!("render failed: {}", e);
            Err(e)
        }
    }
}
