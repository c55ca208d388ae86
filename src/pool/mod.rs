// src/pool/mod.rs

//! Parallel-for worker pool.
//!
//! - [`worker_pool`] owns the persistent threads and the round protocol.
//! - [`round`] holds the mailbox / completion-counter primitives and the
//!   [`ThreadInfo`] handed to every round invocation.

pub mod round;
pub mod worker_pool;

pub use round::ThreadInfo;
pub use worker_pool::WorkerPool;
