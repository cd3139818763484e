// src/processing/parallel.rs
use std::{
    any::Any,
    panic::{self, AssertUnwindSafe},
    sync::Arc,
    thread,
    time::Duration,
};

use flume::{RecvError, Selector, Sender};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::error::{Error, ItemError};
use crate::processing::partition::{partition, Range};
use crate::utils::context::Context;

/// Which deadline a worker checks after its producer returns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerDeadline {
    /// Each worker gets its own `timeout`, counted from when the worker starts.
    /// A worker that starts late can outlive the overall deadline.
    #[default]
    PerWorker,
    /// Workers share the overall deadline and see the batch's cancellation
    /// once `run` returns.
    Overall,
}

/// One published producer result.
struct Record<T, E> {
    range: Range,
    outcome: Result<T, ItemError<E>>,
}

/// Fixed description of one fan-out call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Batch {
    total_count: usize,
    unit_size: usize,
    timeout: Duration,
    worker_deadline: WorkerDeadline,
}

enum Wake<T, E> {
    Record(Record<T, E>),
    Closed,
    Cancelled,
    Expired,
}

/// Cancels the batch context when `run` returns, including early returns.
struct CancelOnDrop(Context);

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        self.0.cancel();
    }
}

impl Batch {
    /// `unit_size == 0` runs the whole count as a single range.
    pub fn new(total_count: usize, unit_size: usize, timeout: Duration) -> Self {
        Self {
            total_count,
            unit_size,
            timeout,
            worker_deadline: WorkerDeadline::default(),
        }
    }

    pub fn with_worker_deadline(mut self, worker_deadline: WorkerDeadline) -> Self {
        self.worker_deadline = worker_deadline;
        self
    }

    pub fn total_count(&self) -> usize {
        self.total_count
    }

    pub fn unit_size(&self) -> usize {
        self.unit_size
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn worker_deadline(&self) -> WorkerDeadline {
        self.worker_deadline
    }

    pub fn ranges(&self) -> Vec<Range> {
        partition(self.total_count, self.unit_size)
    }

    /// Runs `producer` once per range, each on its own thread, then feeds every
    /// result that arrived before the deadline to `consumer` on the calling
    /// thread, in completion order.
    ///
    /// Per-range failures reach the consumer as `Err(ItemError)` and do not fail
    /// the call. Returns `Error::TimedOut` or `Error::Cancelled` when some ranges
    /// never arrived; their consumers are not called.
    ///
    /// Producers are never interrupted. A producer still running when `run`
    /// returns keeps its thread until it finishes, and its result is dropped.
    pub fn run<T, E, P, C>(&self, ctx: &Context, producer: P, mut consumer: C) -> Result<(), Error>
    where
        T: Send + 'static,
        E: Send + 'static,
        P: Fn(&Context, Range) -> Result<T, E> + Send + Sync + 'static,
        C: FnMut(&Context, Range, Result<T, ItemError<E>>),
    {
        if self.total_count == 0 {
            return Err(Error::EmptyBatch);
        }

        let ranges = self.ranges();
        let expected = ranges.len();

        let batch_ctx = ctx.with_timeout(self.timeout);
        let _guard = CancelOnDrop(batch_ctx.clone());

        debug!(
            total_count = self.total_count,
            unit_size = self.unit_size,
            ranges = expected,
            timeout = ?self.timeout,
            "Starting batch"
        );

        let (tx, rx) = flume::bounded(expected);
        let producer = Arc::new(producer);

        for range in ranges {
            let worker_parent = match self.worker_deadline {
                WorkerDeadline::PerWorker => ctx.clone(),
                WorkerDeadline::Overall => batch_ctx.clone(),
            };
            let timeout = self.timeout;
            let worker_deadline = self.worker_deadline;
            let producer = Arc::clone(&producer);
            let sink = tx.clone();

            thread::Builder::new()
                .name(format!("batch-{}", range.from))
                .spawn(move || {
                    let worker_ctx = match worker_deadline {
                        WorkerDeadline::PerWorker => worker_parent.with_timeout(timeout),
                        WorkerDeadline::Overall => worker_parent,
                    };
                    run_worker(&worker_ctx, range, producer.as_ref(), &sink);
                })?;
        }
        drop(tx);

        let done = batch_ctx.done();
        let deadline = batch_ctx.deadline();
        let mut records = Vec::with_capacity(expected);
        let mut failure = None;

        while records.len() < expected {
            let selector = Selector::new()
                .recv(&rx, |received: Result<Record<T, E>, RecvError>| match received {
                    Ok(record) => Wake::Record(record),
                    Err(RecvError::Disconnected) => Wake::Closed,
                })
                .recv(&done, |_| Wake::Cancelled);

            let wake = match deadline {
                Some(deadline) => selector.wait_deadline(deadline).unwrap_or(Wake::Expired),
                None => selector.wait(),
            };

            let collected = records.len();
            match wake {
                Wake::Record(record) => records.push(record),
                Wake::Expired => {
                    failure = Some(Error::TimedOut { collected, expected });
                    break;
                }
                Wake::Cancelled => {
                    failure = Some(Error::Cancelled { collected, expected });
                    break;
                }
                Wake::Closed if ctx.is_cancelled() => {
                    failure = Some(Error::Cancelled { collected, expected });
                    break;
                }
                Wake::Closed if batch_ctx.is_expired() => {
                    failure = Some(Error::TimedOut { collected, expected });
                    break;
                }
                Wake::Closed => return Err(Error::UnexpectedClose { collected, expected }),
            }
        }
        drop(rx);

        if let Some(err) = &failure {
            warn!(
                collected = records.len(),
                expected,
                error = %err,
                "Batch stopped before all ranges arrived"
            );
        }

        for Record { range, outcome } in records {
            consumer(&batch_ctx, range, outcome);
        }

        match failure {
            Some(err) => Err(err),
            None => {
                debug!(ranges = expected, "Batch complete");
                Ok(())
            }
        }
    }
}

fn run_worker<T, E, P>(ctx: &Context, range: Range, producer: &P, sink: &Sender<Record<T, E>>)
where
    P: Fn(&Context, Range) -> Result<T, E>,
{
    let outcome = match panic::catch_unwind(AssertUnwindSafe(|| producer(ctx, range))) {
        Ok(result) => result.map_err(ItemError::Producer),
        Err(payload) => Err(ItemError::Panicked(panic_message(payload.as_ref()))),
    };

    if ctx.is_done() {
        trace!(from = range.from, count = range.count, "Discarding late range result");
        return;
    }

    // The aggregator may already have stopped listening
    if sink.try_send(Record { range, outcome }).is_err() {
        trace!(from = range.from, "Result channel gone, dropping range result");
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
