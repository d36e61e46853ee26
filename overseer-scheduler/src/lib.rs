//! Elastic worker-pool scheduler.
//!
//! A single FIFO queue feeds a pool of OS-thread workers sized by queue
//! pressure (grow above a 1.5 pending/worker ratio, shrink below 0.5),
//! bounded by `[min_threads, max_threads]`. Every asynchronous thing the
//! service does — controller actions, timer expiry, connection-pool
//! handoffs — runs as a job on one of these workers; nothing is ever
//! invoked synchronously on a caller's thread.

mod pool;
mod timer;

pub use pool::{Job, SchedulerHandle};
pub use timer::{TimerHandle, TimerOutcome};
