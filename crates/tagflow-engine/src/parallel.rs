//! Parallel batch execution over a pool of worker threads.
//!
//! Elements are partitioned round-robin, each worker runs the entire
//! multi-stage pipeline on its own partition, and results come back over an
//! mpsc channel joined under an explicit deadline. A timeout or any worker
//! failure aborts the whole run: no partial result is ever returned.

use std::num::NonZeroUsize;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use tagflow_model::{DataKind, Element, RunResult};

use crate::error::EngineError;
use crate::process::{Process, panic_message};

/// Distribute items into `buckets` round-robin batches: item `i` goes to
/// bucket `i % buckets`. Buckets left empty are dropped.
///
/// ```
/// use tagflow_engine::distribute;
///
/// let batches = distribute((1..=9).collect::<Vec<_>>(), 4);
/// assert_eq!(
///     batches.iter().map(Vec::len).collect::<Vec<_>>(),
///     vec![3, 2, 2, 2],
/// );
/// ```
pub fn distribute<T>(items: Vec<T>, buckets: usize) -> Vec<Vec<T>> {
    let buckets = buckets.max(1);
    let mut batches: Vec<Vec<T>> = (0..buckets).map(|_| Vec::new()).collect();
    for (i, item) in items.into_iter().enumerate() {
        batches[i % buckets].push(item);
    }
    batches.retain(|batch| !batch.is_empty());
    batches
}

impl<V, M> Process<V, M>
where
    V: DataKind + Clone + Send + Sync + 'static,
    M: Send + Sync + 'static,
{
    /// Run the pipeline in parallel with a worker count derived from the
    /// hardware concurrency.
    pub fn run_parallel(
        &self,
        elements: Vec<Element<V>>,
        timeout: Duration,
    ) -> Result<RunResult<V>, EngineError> {
        let workers = thread::available_parallelism()
            .map(NonZeroUsize::get)
            .unwrap_or(1);
        self.run_parallel_with(elements, workers, timeout)
    }

    /// Run the pipeline in parallel over an explicit number of workers.
    ///
    /// Each worker independently runs the full multi-stage pipeline on its
    /// round-robin partition; results are merged with
    /// [`RunResult::concatenate`] in completion order. On timeout the run
    /// fails with [`EngineError::Timeout`] and outstanding workers are
    /// abandoned; their results are discarded.
    pub fn run_parallel_with(
        &self,
        elements: Vec<Element<V>>,
        workers: usize,
        timeout: Duration,
    ) -> Result<RunResult<V>, EngineError> {
        let batches = distribute(elements, workers);
        if batches.is_empty() {
            return Ok(RunResult::empty());
        }

        let process = Arc::new(self.clone());
        let (sender, receiver) = mpsc::channel();
        let expected = batches.len();

        for (index, batch) in batches.into_iter().enumerate() {
            let process = Arc::clone(&process);
            let sender = sender.clone();
            let spawned = thread::Builder::new()
                .name(format!("tagflow-worker-{index}"))
                .spawn(move || {
                    let outcome = catch_unwind(AssertUnwindSafe(|| process.run(batch)));
                    let report = outcome.map_err(|panic| panic_message(panic.as_ref()));
                    // The receiver may already be gone after a timeout.
                    let _ = sender.send((index, report));
                });
            if let Err(err) = spawned {
                tracing::error!(worker = index, error = %err, "could not spawn worker");
                return Err(EngineError::Worker {
                    index,
                    message: format!("could not spawn worker thread: {err}"),
                });
            }
        }
        drop(sender);

        let deadline = Instant::now() + timeout;
        let mut results = Vec::with_capacity(expected);
        while results.len() < expected {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match receiver.recv_timeout(remaining) {
                Ok((_, Ok(result))) => results.push(result),
                Ok((index, Err(message))) => {
                    tracing::error!(worker = index, message, "parallel run aborted");
                    return Err(EngineError::Worker { index, message });
                }
                Err(RecvTimeoutError::Timeout) => {
                    let outstanding = expected - results.len();
                    tracing::error!(?timeout, outstanding, "parallel run timed out");
                    return Err(EngineError::Timeout {
                        timeout,
                        outstanding,
                    });
                }
                Err(RecvTimeoutError::Disconnected) => {
                    let outstanding = expected - results.len();
                    tracing::error!(outstanding, "worker channel closed unexpectedly");
                    return Err(EngineError::ChannelClosed { outstanding });
                }
            }
        }
        Ok(RunResult::concatenate(results))
    }
}
