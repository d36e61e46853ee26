use std::sync::{Arc, Condvar, Mutex};
use std::thread;
use std::time::Duration;

use crate::pool::{Job, SchedulerHandle};

/// Whether a timer ran to its deadline or was cancelled first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerOutcome {
    Fired,
    Cancelled,
}

struct TimerState {
    cancelled: Mutex<bool>,
    condvar: Condvar,
}

/// A handle to a timer armed with `SchedulerHandle::schedule_after`. Dropping
/// it has no effect on the timer; call `cancel()` explicitly.
pub struct TimerHandle {
    state: Arc<TimerState>,
}

impl TimerHandle {
    /// Request cancellation. If the timer already fired this is a no-op; the
    /// handler still runs exactly once either way.
    pub fn cancel(&self) {
        let mut cancelled = self.state.cancelled.lock().unwrap();
        *cancelled = true;
        self.state.condvar.notify_all();
    }
}

/// Spawn a dedicated timer thread that waits out `delay` (or wakes early on
/// cancellation) and posts the resulting job to the scheduler — timer
/// expiry is itself scheduler work, never run on the timer thread.
pub(crate) fn schedule<F>(scheduler: SchedulerHandle, delay: Duration, on_outcome: F) -> TimerHandle
where
    F: FnOnce(TimerOutcome) -> Job + Send + 'static,
{
    let state = Arc::new(TimerState {
        cancelled: Mutex::new(false),
        condvar: Condvar::new(),
    });
    let state_for_thread = Arc::clone(&state);

    thread::Builder::new()
        .name("overseer-timer".into())
        .spawn(move || {
            let guard = state_for_thread.cancelled.lock().unwrap();
            let (guard, wait_result) = state_for_thread
                .condvar
                .wait_timeout_while(guard, delay, |cancelled| !*cancelled)
                .unwrap();
            let outcome = if *guard {
                TimerOutcome::Cancelled
            } else {
                debug_assert!(wait_result.timed_out());
                TimerOutcome::Fired
            };
            drop(guard);
            let job = on_outcome(outcome);
            scheduler.submit_job(job);
        })
        .expect("failed to spawn timer thread");

    TimerHandle { state }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::SchedulerHandle as Scheduler;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration as StdDuration;

    #[test]
    fn fires_after_delay_when_not_cancelled() {
        let scheduler = Scheduler::start(1, 2);
        let fired = Arc::new(AtomicBool::new(false));
        let fired2 = Arc::clone(&fired);
        let _handle = scheduler.schedule_after(StdDuration::from_millis(20), move |outcome| {
            Box::pin(async move {
                assert_eq!(outcome, TimerOutcome::Fired);
                fired2.store(true, Ordering::SeqCst);
            })
        });
        thread::sleep(StdDuration::from_millis(150));
        assert!(fired.load(Ordering::SeqCst));
        scheduler.stop();
    }

    #[test]
    fn cancel_before_deadline_reports_cancelled() {
        let scheduler = Scheduler::start(1, 2);
        let outcome_seen = Arc::new(Mutex::new(None));
        let outcome_seen2 = Arc::clone(&outcome_seen);
        let handle = scheduler.schedule_after(StdDuration::from_millis(500), move |outcome| {
            Box::pin(async move {
                *outcome_seen2.lock().unwrap() = Some(outcome);
            })
        });
        handle.cancel();
        thread::sleep(StdDuration::from_millis(100));
        assert_eq!(*outcome_seen.lock().unwrap(), Some(TimerOutcome::Cancelled));
        scheduler.stop();
    }
}
