use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::timer::{TimerHandle, TimerOutcome};

/// A unit of work posted to the scheduler: a future run to completion on
/// whichever worker thread dequeues it.
pub type Job = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

enum WorkItem {
    Job(Job),
    /// Posted to retire exactly one worker; the worker that dequeues it
    /// decrements the pool and exits instead of looping again.
    Retire,
}

struct Inner {
    min_threads: usize,
    max_threads: usize,
    queue: Mutex<VecDeque<WorkItem>>,
    not_empty: Condvar,
    worker_count: AtomicUsize,
    next_worker_id: AtomicU64,
    workers: Mutex<HashMap<u64, JoinHandle<()>>>,
    stopped: AtomicBool,
}

/// An elastic pool of OS-thread workers backed by a single FIFO queue, sized
/// by queue pressure: the pool grows when the backlog outpaces its workers
/// and shrinks when it's starved, bounded by `[min_threads, max_threads]`.
///
/// Each worker drives its own lightweight current-thread Tokio runtime so it
/// can execute async jobs to completion; workers never share a runtime.
#[derive(Clone)]
pub struct SchedulerHandle(Arc<Inner>);

impl SchedulerHandle {
    pub fn start(min_threads: usize, max_threads: usize) -> Self {
        assert!(min_threads >= 1, "min_threads must be at least 1");
        assert!(max_threads >= min_threads, "max_threads must be >= min_threads");
        let inner = Arc::new(Inner {
            min_threads,
            max_threads,
            queue: Mutex::new(VecDeque::new()),
            not_empty: Condvar::new(),
            worker_count: AtomicUsize::new(0),
            next_worker_id: AtomicU64::new(0),
            workers: Mutex::new(HashMap::new()),
            stopped: AtomicBool::new(false),
        });
        for _ in 0..min_threads {
            spawn_worker(&inner);
        }
        SchedulerHandle(inner)
    }

    /// Post a job to the FIFO queue, waking one idle worker and re-checking
    /// whether the pool should grow or shrink.
    pub fn submit<F>(&self, fut: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.submit_job(Box::pin(fut));
    }

    pub(crate) fn submit_job(&self, job: Job) {
        {
            let mut queue = self.0.queue.lock().unwrap();
            queue.push_back(WorkItem::Job(job));
        }
        self.0.not_empty.notify_one();
        self.resize();
    }

    /// Arm a one-shot timer. The handler runs as an ordinary scheduler job
    /// once the delay elapses or `TimerHandle::cancel` is called, whichever
    /// comes first — never synchronously on the caller's thread.
    pub fn schedule_after<F>(&self, delay: Duration, on_outcome: F) -> TimerHandle
    where
        F: FnOnce(TimerOutcome) -> Job + Send + 'static,
    {
        crate::timer::schedule(self.clone(), delay, on_outcome)
    }

    pub fn worker_count(&self) -> usize {
        self.0.worker_count.load(Ordering::SeqCst)
    }

    /// Number of jobs sitting in the queue, not yet picked up by a worker.
    pub fn pending_count(&self) -> usize {
        self.0
            .queue
            .lock()
            .unwrap()
            .iter()
            .filter(|item| matches!(item, WorkItem::Job(_)))
            .count()
    }

    /// Stop accepting growth decisions, drain the queue, and join every
    /// worker thread. Jobs already queued still run; nothing new should be
    /// submitted after calling this.
    pub fn stop(&self) {
        self.0.stopped.store(true, Ordering::SeqCst);
        self.0.not_empty.notify_all();
        let handles: Vec<JoinHandle<()>> =
            self.0.workers.lock().unwrap().drain().map(|(_, h)| h).collect();
        for handle in handles {
            let _ = handle.join();
        }
    }

    /// Recompute `pending / workers` and grow or shrink the pool per the
    /// 1.5 / 0.5 resize thresholds.
    fn resize(&self) {
        let workers = self.0.worker_count.load(Ordering::SeqCst);
        if workers == 0 {
            return;
        }
        let pending = self.pending_count();
        let ratio = pending as f64 / workers as f64;

        if ratio > 1.5 {
            let grow = ((workers as f64) * (ratio - 1.0)).ceil().max(1.0) as usize;
            let target = (workers + grow).min(self.0.max_threads);
            for _ in workers..target {
                spawn_worker(&self.0);
            }
        } else if ratio < 0.5 {
            let shrink = ((workers as f64) * (1.0 - ratio)).ceil().max(1.0) as usize;
            let target = workers.saturating_sub(shrink).max(self.0.min_threads);
            let to_retire = workers.saturating_sub(target);
            if to_retire > 0 {
                let mut queue = self.0.queue.lock().unwrap();
                for _ in 0..to_retire {
                    queue.push_back(WorkItem::Retire);
                }
                drop(queue);
                self.0.not_empty.notify_all();
            }
        }
    }
}

fn spawn_worker(inner: &Arc<Inner>) {
    let inner = Arc::clone(inner);
    let id = inner.next_worker_id.fetch_add(1, Ordering::SeqCst);
    inner.worker_count.fetch_add(1, Ordering::SeqCst);
    let registry = Arc::clone(&inner);
    let handle = thread::Builder::new()
        .name(format!("overseer-worker-{id}"))
        .spawn(move || worker_loop(inner, id))
        .expect("failed to spawn scheduler worker thread");
    registry.workers.lock().unwrap().insert(id, handle);
}

fn worker_loop(inner: Arc<Inner>, id: u64) {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("failed to build worker runtime");

    loop {
        let item = {
            let mut queue = inner.queue.lock().unwrap();
            loop {
                if let Some(item) = queue.pop_front() {
                    break Some(item);
                }
                if inner.stopped.load(Ordering::SeqCst) {
                    break None;
                }
                queue = inner.not_empty.wait(queue).unwrap();
            }
        };

        let Some(item) = item else {
            break;
        };

        match item {
            WorkItem::Retire => {
                inner.worker_count.fetch_sub(1, Ordering::SeqCst);
                break;
            }
            WorkItem::Job(job) => {
                let outcome = std::panic::catch_unwind(AssertUnwindSafe(|| runtime.block_on(job)));
                if outcome.is_err() {
                    tracing::error!(worker_id = id, "scheduler job panicked, retiring worker");
                    inner.worker_count.fetch_sub(1, Ordering::SeqCst);
                    inner.workers.lock().unwrap().remove(&id);
                    break;
                }
            }
        }
    }
}
