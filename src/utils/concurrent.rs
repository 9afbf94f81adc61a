//! Bounded worker pool for independent per-artifact tasks.
//!
//! Tasks are submitted fire-and-forget and awaited through a single barrier
//! with an overall deadline. There is no per-task cancellation.

use std::any::Any;
use std::num::NonZeroUsize;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{debug, error};

/// Default overall deadline for a batch of tasks
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Error, Debug)]
pub enum PoolError {
    #[error("Failed to build worker pool: {0}")]
    Build(#[from] rayon::ThreadPoolBuildError),

    #[error("Tasks did not complete within {0:?}")]
    Timeout(Duration),

    #[error("Task {index} panicked")]
    TaskPanicked { index: usize },
}

/// Worker pool configuration
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Number of worker threads; 0 picks [`default_thread_count`]
    pub threads: usize,
    /// Overall deadline for one batch
    pub timeout: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            threads: 0,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// All available cores, leaving two free on machines with more than four
#[must_use]
pub fn default_thread_count() -> usize {
    let cores = std::thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1);
    if cores > 4 {
        cores - 2
    } else {
        cores
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "unknown panic payload"
    }
}

/// A fixed-size pool running one closure per work item
pub struct WorkerPool {
    pool: rayon::ThreadPool,
    threads: usize,
    timeout: Duration,
}

impl WorkerPool {
    /// Build a pool from `config`
    ///
    /// # Errors
    ///
    /// Returns `PoolError::Build` if the threads cannot be spawned.
    pub fn new(config: &PoolConfig) -> Result<Self, PoolError> {
        let threads = if config.threads == 0 {
            default_thread_count()
        } else {
            config.threads
        };

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("ingredients-worker-{i}"))
            .panic_handler(|payload| {
                error!("Worker task panicked: {}", panic_message(payload.as_ref()));
            })
            .build()?;

        debug!("Started worker pool with {threads} threads");

        Ok(Self {
            pool,
            threads,
            timeout: config.timeout,
        })
    }

    #[must_use]
    pub fn threads(&self) -> usize {
        self.threads
    }

    /// Run `task` on every item and wait for all of them.
    ///
    /// Results are returned in input order, one slot per item. A task that
    /// panicked leaves `PoolError::TaskPanicked` in its slot; the others still
    /// run to completion. Tasks never share mutable state; anything they share
    /// must be behind an `Arc`.
    ///
    /// # Errors
    ///
    /// Returns `PoolError::Timeout` if the batch outlives the deadline.
    pub fn map<T, R, F>(
        &self,
        items: Vec<T>,
        task: F,
    ) -> Result<Vec<Result<R, PoolError>>, PoolError>
    where
        T: Send + 'static,
        R: Send + 'static,
        F: Fn(T) -> R + Send + Sync + 'static,
    {
        let total = items.len();
        let task = Arc::new(task);
        let (tx, rx) = mpsc::channel();

        for (index, item) in items.into_iter().enumerate() {
            let tx = tx.clone();
            let task = Arc::clone(&task);
            self.pool.spawn(move || {
                let result = task(item);
                // The receiver only goes away after a timeout
                let _ = tx.send((index, result));
            });
        }
        drop(tx);

        let deadline = Instant::now().checked_add(self.timeout);
        let mut slots: Vec<Option<R>> = (0..total).map(|_| None).collect();
        let mut received = 0usize;

        loop {
            let next = match deadline {
                Some(deadline) => rx.recv_timeout(deadline.saturating_duration_since(Instant::now())),
                None => rx.recv().map_err(|_| RecvTimeoutError::Disconnected),
            };
            match next {
                Ok((index, result)) => {
                    slots[index] = Some(result);
                    received += 1;
                }
                Err(RecvTimeoutError::Disconnected) => break,
                Err(RecvTimeoutError::Timeout) => return Err(PoolError::Timeout(self.timeout)),
            }
        }

        if received < total {
            error!("{} of {total} task(s) panicked", total - received);
        }

        Ok(slots
            .into_iter()
            .enumerate()
            .map(|(index, slot)| slot.ok_or(PoolError::TaskPanicked { index }))
            .collect())
    }

    /// Like [`WorkerPool::map`], but fails if any task panicked.
    ///
    /// # Errors
    ///
    /// Returns `PoolError::Timeout` if the batch outlives the deadline, or the
    /// first `PoolError::TaskPanicked` in input order.
    pub fn map_all<T, R, F>(&self, items: Vec<T>, task: F) -> Result<Vec<R>, PoolError>
    where
        T: Send + 'static,
        R: Send + 'static,
        F: Fn(T) -> R + Send + Sync + 'static,
    {
        self.map(items, task)?.into_iter().collect()
    }
}
