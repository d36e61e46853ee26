//! In-flight request admission gate (§4.C10).
//!
//! A single counter tracks requests currently being dispatched. Once it
//! exceeds the configured cap, new requests are rejected with a synthetic
//! "server overloaded" error before the controller is ever touched.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

pub struct AdmissionGate {
    in_flight: AtomicUsize,
    cap: usize,
}

/// Releases its slot when dropped, so every early return in a handler still
/// frees the counter.
pub struct Admitted(Arc<AdmissionGate>);

impl Drop for Admitted {
    fn drop(&mut self) {
        self.0.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

impl AdmissionGate {
    pub fn new(cap: usize) -> Arc<Self> {
        Arc::new(AdmissionGate {
            in_flight: AtomicUsize::new(0),
            cap,
        })
    }

    /// Try to admit one request. Returns `None` if the cap is already
    /// reached; the caller should respond 503 without dispatching.
    pub fn try_admit(self: &Arc<Self>) -> Option<Admitted> {
        loop {
            let current = self.in_flight.load(Ordering::SeqCst);
            if current >= self.cap {
                return None;
            }
            if self
                .in_flight
                .compare_exchange(current, current + 1, Ordering::SeqCst, Ordering::SeqCst)
                .is_ok()
            {
                return Some(Admitted(Arc::clone(self)));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admits_up_to_cap_then_rejects() {
        let gate = AdmissionGate::new(2);
        let a = gate.try_admit().unwrap();
        let b = gate.try_admit().unwrap();
        assert!(gate.try_admit().is_none());
        drop(a);
        assert!(gate.try_admit().is_some());
        drop(b);
    }
}
