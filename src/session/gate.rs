// src/session/gate.rs

use std::sync::atomic::{AtomicBool, Ordering};

/// Single-flight guard in front of the grading request.
///
/// `try_acquire` is a compare-and-swap, so out of any number of callers racing
/// on an open gate exactly one wins. The winner must call it before its first
/// await point.
#[derive(Debug, Default)]
pub struct SubmissionGate {
    submitting: AtomicBool,
}

impl SubmissionGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Closes the gate. Returns `false` if it was already closed.
    pub fn try_acquire(&self) -> bool {
        self.submitting
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Reopens the gate after a failed submission.
    pub fn release(&self) {
        self.submitting.store(false, Ordering::Release);
    }

    pub fn is_closed(&self) -> bool {
        self.submitting.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::AtomicUsize;
    use std::thread;

    use super::*;

    #[test]
    fn only_first_acquire_wins() {
        let gate = SubmissionGate::new();

        assert!(gate.try_acquire());
        assert!(!gate.try_acquire());
        assert!(gate.is_closed());

        gate.release();
        assert!(!gate.is_closed());
        assert!(gate.try_acquire());
    }

    #[test]
    fn racing_threads_admit_exactly_one() {
        let gate = Arc::new(SubmissionGate::new());
        let winners = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let gate = Arc::clone(&gate);
                let winners = Arc::clone(&winners);
                thread::spawn(move || {
                    if gate.try_acquire() {
                        winners.fetch_add(1, Ordering::SeqCst);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(winners.load(Ordering::SeqCst), 1);
    }
}
