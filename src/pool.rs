//! The worker pool.  One scoped thread per row range, each streaming
//! finished rows back over a channel to the caller's thread, which
//! hands them to a callback one at a time, in arrival order.
//!
//! Units never share mutable state: each borrows the same read-only
//! row computer and owns the rows it builds until it sends them.  A
//! unit that fails (its scanline returns an error, or panics) reports
//! the rows it did not deliver; those rows get one more chance on a
//! fresh unit before the render is declared failed.
//!
//! When a dispatch ends early, its units are halted through the same
//! token their scanlines are handed, so a row underway is abandoned
//! rather than finished.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam::channel::{self, RecvTimeoutError, Sender};
use crossbeam::thread::Scope;
use log::{debug, warn};

use crate::errors::{RenderError, Result};
use crate::partition::RowRange;
use crate::rows::{RowResult, Scanline};

// How long the dispatcher waits on the channel before looking at the
// cancel token and the deadline again.
const POLL: Duration = Duration::from_millis(25);

/// A shared flag that asks a render to stop.  Clones share the flag.
/// The dispatcher notices within `POLL` and halts its units, which
/// drop whatever row they are in the middle of.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// A token that has not fired.
    pub fn new() -> CancelToken {
        CancelToken::default()
    }

    /// Fire the token.  There is no way to un-fire it.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Has anyone called `cancel`?
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

enum Event {
    Row(RowResult),
    Finished {
        unit: usize,
    },
    Failed {
        unit: usize,
        remaining: RowRange,
        reason: String,
    },
}

struct Unit {
    range: RowRange,
    retry: bool,
}

/// Dispatches row ranges to parallel workers.
#[derive(Clone, Debug)]
pub struct WorkerPool {
    timeout: Option<Duration>,
    retry: bool,
    cancel: CancelToken,
}

impl Default for WorkerPool {
    fn default() -> WorkerPool {
        WorkerPool {
            timeout: None,
            retry: true,
            cancel: CancelToken::new(),
        }
    }
}

impl WorkerPool {
    /// No deadline, one retry per failed range, and a private cancel
    /// token.
    pub fn new() -> WorkerPool {
        WorkerPool::default()
    }

    /// Give up, with `Stalled`, if the rows have not all arrived by
    /// this long after dispatch.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> WorkerPool {
        self.timeout = timeout;
        self
    }

    /// Whether a failed range is re-dispatched once before giving up.
    pub fn with_retry(mut self, retry: bool) -> WorkerPool {
        self.retry = retry;
        self
    }

    /// Watch this token for cancellation.
    pub fn with_cancel(mut self, cancel: CancelToken) -> WorkerPool {
        self.cancel = cancel;
        self
    }

    /// Spawns one unit per range and feeds every row they produce to
    /// `on_row`, on the calling thread.  Returns once every unit has
    /// finished, or as soon as something goes wrong; in the latter
    /// case the remaining units are halted and joined before this
    /// returns.
    ///
    /// Rows from one unit arrive in ascending order.  Nothing is
    /// promised about the interleaving of different units.
    pub fn dispatch<S, F>(&self, ranges: &[RowRange], source: &S, mut on_row: F) -> Result<()>
    where
        S: Scanline,
        F: FnMut(RowResult) -> Result<()>,
    {
        let halt = CancelToken::new();
        let expected: u32 = ranges.iter().map(|r| r.len()).sum();
        let deadline = self.timeout.map(|t| Instant::now() + t);
        let cancel = &self.cancel;

        let outcome = crossbeam::scope(|scope| {
            let (events, incoming) = channel::unbounded();
            let mut units: Vec<Unit> = Vec::with_capacity(ranges.len());
            for range in ranges {
                spawn_unit(scope, units.len(), *range, source, &events, cancel, &halt);
                units.push(Unit {
                    range: *range,
                    retry: false,
                });
            }

            let mut running = units.len();
            let mut received: u32 = 0;
            let result = loop {
                if cancel.is_cancelled() {
                    break Err(RenderError::Cancelled);
                }
                if running == 0 {
                    break Ok(());
                }
                let wait = match deadline {
                    Some(deadline) => {
                        let now = Instant::now();
                        if now >= deadline {
                            break Err(RenderError::Stalled { received, expected });
                        }
                        (deadline - now).min(POLL)
                    }
                    None => POLL,
                };

                match incoming.recv_timeout(wait) {
                    Ok(Event::Row(row)) => {
                        if let Err(e) = on_row(row) {
                            break Err(e);
                        }
                        received += 1;
                    }
                    Ok(Event::Finished { unit }) => {
                        debug!("unit {} finished rows {:?}", unit, units[unit].range);
                        running -= 1;
                    }
                    Ok(Event::Failed {
                        unit,
                        remaining,
                        reason,
                    }) => {
                        running -= 1;
                        warn!(
                            "unit {} failed with rows {}..={} undelivered: {}",
                            unit, remaining.start, remaining.end, reason
                        );
                        if !self.retry {
                            break Err(RenderError::WorkerFailure {
                                unit,
                                start_row: remaining.start,
                                end_row: remaining.end,
                                reason,
                            });
                        }
                        if units[unit].retry {
                            break Err(RenderError::RenderFailed {
                                start_row: remaining.start,
                                end_row: remaining.end,
                                reason,
                            });
                        }
                        let id = units.len();
                        warn!("retrying rows {}..={} on unit {}", remaining.start, remaining.end, id);
                        spawn_unit(scope, id, remaining, source, &events, cancel, &halt);
                        units.push(Unit {
                            range: remaining,
                            retry: true,
                        });
                        running += 1;
                    }
                    Err(RecvTimeoutError::Timeout) => {}
                    // We hold a sender ourselves, so this cannot happen.
                    Err(RecvTimeoutError::Disconnected) => break Ok(()),
                }
            };
            if result.is_err() {
                halt.cancel();
            }
            result
        });

        match outcome {
            Ok(result) => result,
            Err(cause) => Err(RenderError::RenderFailed {
                start_row: ranges.first().map_or(0, |r| r.start),
                end_row: ranges.last().map_or(0, |r| r.end),
                reason: panic_message(&*cause),
            }),
        }
    }
}

fn spawn_unit<'env, S: Scanline>(
    scope: &Scope<'env>,
    unit: usize,
    range: RowRange,
    source: &'env S,
    events: &Sender<Event>,
    cancel: &'env CancelToken,
    halt: &'env CancelToken,
) {
    let events = events.clone();
    debug!("unit {} assigned rows {}..={}", unit, range.start, range.end);
    scope.spawn(move |_| run_unit(unit, range, source, &events, cancel, halt));
}

fn run_unit<S: Scanline>(
    unit: usize,
    range: RowRange,
    source: &S,
    events: &Sender<Event>,
    cancel: &CancelToken,
    halt: &CancelToken,
) {
    for row in range.rows() {
        if cancel.is_cancelled() || halt.is_cancelled() {
            debug!("unit {} stopping before row {}", unit, row);
            return;
        }
        let reason = match panic::catch_unwind(AssertUnwindSafe(|| source.scan(row, halt))) {
            Ok(Ok(result)) => {
                if events.send(Event::Row(result)).is_err() {
                    return;
                }
                continue;
            }
            Ok(Err(_)) if halt.is_cancelled() => {
                debug!("unit {} abandoned row {}", unit, row);
                return;
            }
            Ok(Err(e)) => e.to_string(),
            Err(cause) => panic_message(&*cause),
        };
        let _ = events.send(Event::Failed {
            unit,
            remaining: RowRange::new(row, range.end),
            reason,
        });
        return;
    }
    let _ = events.send(Event::Finished { unit });
}

// `crossbeam::scope` hands back every panic it joined, boxed up in a
// `Vec`; the first one is reported.
fn panic_message(cause: &(dyn Any + Send)) -> String {
    if let Some(s) = cause.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = cause.downcast_ref::<String>() {
        s.clone()
    } else if let Some(first) = cause
        .downcast_ref::<Vec<Box<dyn Any + Send>>>()
        .and_then(|causes| causes.first())
    {
        panic_message(&**first)
    } else {
        "worker panicked".to_string()
    }
}
