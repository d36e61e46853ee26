use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use overseer_error::{ClientError, OverseerError};
use overseer_scheduler::{SchedulerHandle, TimerOutcome};

use crate::request::{Request, RequestFailure, RequestResult};

pub type GroupCompletionHandler = Box<dyn FnOnce(Vec<RequestResult>) + Send>;

/// A group of requests sharing a single deadline (§4.C9 `RequestManager`).
/// The group completion fires exactly once, whether every request finished
/// on its own or the deadline cut the stragglers short.
pub struct RequestManager {
    requests: Vec<Arc<Request>>,
    scheduler: SchedulerHandle,
    pending: AtomicUsize,
    results: Mutex<Vec<Option<RequestResult>>>,
    timer: Mutex<Option<overseer_scheduler::TimerHandle>>,
    running: AtomicBool,
    fired: AtomicBool,
    completion: Mutex<Option<GroupCompletionHandler>>,
}

impl RequestManager {
    pub fn new(requests: Vec<Arc<Request>>, scheduler: SchedulerHandle) -> Arc<RequestManager> {
        let count = requests.len();
        Arc::new(RequestManager {
            requests,
            scheduler,
            pending: AtomicUsize::new(count),
            results: Mutex::new((0..count).map(|_| None).collect()),
            timer: Mutex::new(None),
            running: AtomicBool::new(false),
            fired: AtomicBool::new(false),
            completion: Mutex::new(None),
        })
    }

    /// Refuses to re-start if already running. Arms a deadline timer when
    /// `timeout` is non-zero, then posts every child request to the
    /// scheduler; they proceed independently of this call returning.
    pub fn start(
        self: &Arc<Self>,
        timeout: Duration,
        on_complete: GroupCompletionHandler,
    ) -> Result<(), OverseerError> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(OverseerError::Client(ClientError::InternalError {
                detail: Some("request group already started".into()),
            }));
        }
        *self.completion.lock().unwrap() = Some(on_complete);

        if self.requests.is_empty() {
            self.fire();
            return Ok(());
        }

        if !timeout.is_zero() {
            let manager = Arc::clone(self);
            let handle = self.scheduler.schedule_after(timeout, move |outcome| {
                let manager = Arc::clone(&manager);
                Box::pin(async move { manager.on_timer(outcome) })
            });
            *self.timer.lock().unwrap() = Some(handle);
        }

        for (index, request) in self.requests.iter().cloned().enumerate() {
            let manager = Arc::clone(self);
            self.scheduler.submit(async move {
                request
                    .clone()
                    .run(Box::new(move |result| manager.record(index, result)))
                    .await;
            });
        }

        Ok(())
    }

    fn record(&self, index: usize, result: RequestResult) {
        if self.fired.load(Ordering::SeqCst) {
            return;
        }
        {
            let mut results = self.results.lock().unwrap();
            if results[index].is_some() {
                // Already filled in by a deadline timeout racing this completion.
                return;
            }
            results[index] = Some(result);
        }
        if self.pending.fetch_sub(1, Ordering::SeqCst) == 1 {
            if let Some(timer) = self.timer.lock().unwrap().take() {
                timer.cancel();
            }
            self.fire();
        }
    }

    fn on_timer(&self, outcome: TimerOutcome) {
        if outcome == TimerOutcome::Cancelled {
            return;
        }
        let mut results = self.results.lock().unwrap();
        for (index, slot) in results.iter_mut().enumerate() {
            if slot.is_none() {
                let request = &self.requests[index];
                request.cancel();
                *slot = Some(RequestResult {
                    endpoint: request.endpoint().clone(),
                    summary: request.summary(),
                    response: None,
                    error: Some(RequestFailure::Overseer(OverseerError::Client(
                        ClientError::RequestTimedOut { detail: None },
                    ))),
                });
            }
        }
        drop(results);
        self.fire();
    }

    fn fire(&self) {
        if self.fired.swap(true, Ordering::SeqCst) {
            return;
        }
        let results = self
            .results
            .lock()
            .unwrap()
            .drain(..)
            .map(|slot| slot.expect("every slot is filled before fire() runs"))
            .collect();
        if let Some(handler) = self.completion.lock().unwrap().take() {
            handler(results);
        }
    }
}
