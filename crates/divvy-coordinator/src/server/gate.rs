//! Connection admission under a concurrency cap.
//!
//! The gate holds the process-wide count of open sessions and the configured
//! maximum. Admission decisions happen at accept time under a single mutex;
//! nothing queues behind the gate, so there is no starvation concern. The
//! count is mutated only while holding the gate's lock, and the lock is
//! never held across I/O.

use std::sync::{Arc, Mutex};

/// Caps the number of concurrently open peer sessions.
pub struct AdmissionGate {
    /// Sessions currently between assignment and close.
    count: Mutex<usize>,
    /// Maximum concurrently admitted sessions.
    max: usize,
}

impl AdmissionGate {
    /// Creates a gate admitting at most `max` concurrent sessions.
    pub fn new(max: usize) -> Arc<Self> {
        Arc::new(Self {
            count: Mutex::new(0),
            max,
        })
    }

    /// Admits the caller iff the cap has not been reached.
    ///
    /// On admission the count is incremented and a permit is returned; the
    /// permit releases the slot exactly once, when dropped at the session's
    /// terminal state. On refusal the count is left unchanged.
    pub fn try_admit(self: &Arc<Self>) -> Option<AdmissionPermit> {
        let mut count = self.count.lock().unwrap_or_else(|e| e.into_inner());
        if *count < self.max {
            *count += 1;
            Some(AdmissionPermit {
                gate: Arc::clone(self),
            })
        } else {
            None
        }
    }

    /// Number of sessions currently holding a permit.
    pub fn active(&self) -> usize {
        *self.count.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// The configured cap.
    pub const fn max(&self) -> usize {
        self.max
    }

    fn release(&self) {
        let mut count = self.count.lock().unwrap_or_else(|e| e.into_inner());
        *count = count.saturating_sub(1);
    }
}

/// Slot held by one admitted session; releases on drop.
pub struct AdmissionPermit {
    gate: Arc<AdmissionGate>,
}

impl Drop for AdmissionPermit {
    fn drop(&mut self) {
        self.gate.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::scope;

    #[test]
    fn admits_up_to_the_cap() {
        let gate = AdmissionGate::new(2);

        let first = gate.try_admit().expect("first admission");
        let second = gate.try_admit().expect("second admission");
        assert!(gate.try_admit().is_none(), "cap exceeded");
        assert_eq!(gate.active(), 2);

        drop(first);
        assert_eq!(gate.active(), 1);
        let _third = gate.try_admit().expect("slot freed by drop");
        assert_eq!(gate.active(), 2);

        drop(second);
        drop(_third);
        assert_eq!(gate.active(), 0);
    }

    #[test]
    fn refusal_leaves_count_unchanged() {
        let gate = AdmissionGate::new(0);
        assert!(gate.try_admit().is_none());
        assert_eq!(gate.active(), 0);
    }

    #[test]
    fn count_tracks_concurrent_admit_and_release() {
        const THREADS: usize = 8;
        const ROUNDS: usize = 256;

        let gate = AdmissionGate::new(THREADS);

        scope(|s| {
            for _ in 0..THREADS {
                let gate = Arc::clone(&gate);
                s.spawn(move || {
                    for _ in 0..ROUNDS {
                        if let Some(permit) = gate.try_admit() {
                            let active = gate.active();
                            assert!(active >= 1 && active <= THREADS);
                            drop(permit);
                        }
                    }
                });
            }
        });

        assert_eq!(gate.active(), 0);
    }
}
