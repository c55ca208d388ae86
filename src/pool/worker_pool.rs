// src/pool/worker_pool.rs

//! Persistent worker threads that run one parallel-for "round" at a time.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};

use tracing::{debug, error, trace};

use crate::errors::{JobGraphError, Result};
use crate::pool::round::{lock, panic_message, Completion, Mail, Mailbox, RoundFn, ThreadInfo};

/// One persistent worker thread and the mailbox it parks on.
struct Worker {
    mailbox: Arc<Mailbox>,
    handle: Option<JoinHandle<()>>,
}

impl Worker {
    fn spawn(index: usize, completion: Arc<Completion>) -> std::io::Result<Self> {
        let mailbox = Arc::new(Mailbox::new());
        let thread_mailbox = Arc::clone(&mailbox);

        let handle = thread::Builder::new()
            .name(format!("jobgraph-worker-{index}"))
            .spawn(move || worker_loop(index, &thread_mailbox, &completion))?;

        Ok(Self {
            mailbox,
            handle: Some(handle),
        })
    }
}

fn worker_loop(index: usize, mailbox: &Mailbox, completion: &Completion) {
    trace!(worker = index, "worker started");

    loop {
        match mailbox.wait() {
            Mail::Shutdown => break,
            Mail::Empty => continue,
            Mail::Round { job, info } => {
                if let Err(payload) = catch_unwind(AssertUnwindSafe(|| job(info))) {
                    error!(
                        worker = index,
                        thread_id = info.thread_id,
                        panic = %panic_message(payload.as_ref()),
                        "round body panicked on worker thread"
                    );
                }
                drop(job);
                completion.signal();
            }
        }
    }

    trace!(worker = index, "worker stopped");
}

/// A grow-only set of parked threads executing parallel-for rounds.
///
/// [`WorkerPool::run`] wakes exactly `thread_count` workers, hands each its
/// [`ThreadInfo`], and blocks until every one of them has finished. Workers
/// park on their own mailbox between rounds, so no threads are spawned or
/// joined per round.
pub struct WorkerPool {
    /// Live workers. Held for the whole duration of a round, which also
    /// single-flights concurrent callers of [`WorkerPool::run`].
    workers: Mutex<Vec<Worker>>,
    completion: Arc<Completion>,
}

impl WorkerPool {
    /// Create a pool without any threads; workers are spawned on demand.
    pub fn new() -> Self {
        Self {
            workers: Mutex::new(Vec::new()),
            completion: Arc::new(Completion::new()),
        }
    }

    /// Create a pool and eagerly spawn `thread_count` workers.
    pub fn with_threads(thread_count: usize) -> Result<Self> {
        let pool = Self::new();
        {
            let mut workers = lock(&pool.workers);
            pool.grow(&mut workers, thread_count)?;
        }
        Ok(pool)
    }

    /// Number of worker threads currently alive.
    pub fn live_threads(&self) -> usize {
        lock(&self.workers).len()
    }

    /// Run `job` once on each of `thread_count` workers and wait for all of
    /// them.
    ///
    /// - `thread_count == 0` returns immediately without invoking `job`.
    /// - Missing workers are spawned first; the pool never shrinks.
    /// - A panic inside `job` is caught and logged on the worker; it still
    ///   counts as a completion.
    pub fn run<T, F>(&self, thread_count: usize, data: Arc<T>, job: F) -> Result<()>
    where
        T: Send + Sync + 'static,
        F: Fn(ThreadInfo, &T) + Send + Sync + 'static,
    {
        if thread_count == 0 {
            return Ok(());
        }

        let mut workers = lock(&self.workers);
        self.grow(&mut workers, thread_count)?;

        let round: RoundFn = Arc::new(move |info: ThreadInfo| job(info, &data));

        self.completion.reset();
        for (thread_id, worker) in workers.iter().take(thread_count).enumerate() {
            worker.mailbox.post(Mail::Round {
                job: Arc::clone(&round),
                info: ThreadInfo {
                    thread_id,
                    thread_count,
                },
            });
        }
        drop(round);

        self.completion.wait_for(thread_count);
        Ok(())
    }

    fn grow(&self, workers: &mut Vec<Worker>, thread_count: usize) -> Result<()> {
        while workers.len() < thread_count {
            let index = workers.len();
            let worker = Worker::spawn(index, Arc::clone(&self.completion))
                .map_err(JobGraphError::WorkerSpawn)?;
            workers.push(worker);
            debug!(worker = index, "spawned pool worker");
        }
        Ok(())
    }
}

impl Default for WorkerPool {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("live_threads", &self.live_threads())
            .finish()
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        let workers = self
            .workers
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner);

        for worker in workers.iter() {
            worker.mailbox.post(Mail::Shutdown);
        }

        for worker in workers.iter_mut() {
            if let Some(handle) = worker.handle.take() {
                if handle.join().is_err() {
                    error!("pool worker exited with a panic");
                }
            }
        }
    }
}
