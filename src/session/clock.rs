// src/session/clock.rs

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::thread::{self, ThreadId};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tokio_util::sync::CancellationToken;

use crate::config::TICK_INTERVAL;
use crate::error::ClockError;

/// Receives countdown notifications.
///
/// Both callbacks run synchronously on the clock's task and must not block.
/// Calling `Clock::stop` from inside a callback is allowed.
pub trait ClockListener: Send + Sync {
    fn on_tick(&self, remaining_seconds: u64);

    fn on_expired(&self);
}

/// Countdown ticking once per period on the tokio runtime.
///
/// Stopping cancels the ticking task. Once `stop` returns no further
/// notification is delivered, even if a tick was already due.
pub struct Clock {
    period: Duration,
    inner: Arc<ClockInner>,
}

struct ClockInner {
    remaining: AtomicU64,
    /// Token of the current run; `None` before the first start.
    run: Mutex<Option<CancellationToken>>,
    /// Held while a notification is being delivered.
    delivery: Mutex<()>,
    /// Thread currently delivering, so a re-entrant `stop` does not wait on itself.
    delivering_on: Mutex<Option<ThreadId>>,
}

enum Advance {
    Ticked,
    Expired,
    Cancelled,
}

impl Default for Clock {
    fn default() -> Self {
        Self::new(TICK_INTERVAL)
    }
}

impl Clock {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            inner: Arc::new(ClockInner {
                remaining: AtomicU64::new(0),
                run: Mutex::new(None),
                delivery: Mutex::new(()),
                delivering_on: Mutex::new(None),
            }),
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Starts counting down from `duration_seconds`.
    ///
    /// The listener is held weakly: once it is dropped the clock stops on
    /// its next tick.
    pub fn start(
        &self,
        duration_seconds: u64,
        listener: Weak<dyn ClockListener>,
    ) -> Result<(), ClockError> {
        if duration_seconds == 0 {
            return Err(ClockError::ZeroDuration);
        }
        let runtime = Handle::try_current().map_err(|_| ClockError::NoRuntime)?;

        let mut run = lock(&self.inner.run);
        if run.as_ref().is_some_and(|token| !token.is_cancelled()) {
            return Err(ClockError::AlreadyRunning);
        }

        let token = CancellationToken::new();
        self.inner.remaining.store(duration_seconds, Ordering::Release);
        *run = Some(token.clone());

        runtime.spawn(tick_loop(Arc::clone(&self.inner), token, self.period, listener));
        tracing::debug!(duration_seconds, period = ?self.period, "clock started");
        Ok(())
    }

    /// Stops the countdown. Idempotent and callable from any state.
    pub fn stop(&self) {
        if let Some(token) = lock(&self.inner.run).as_ref() {
            token.cancel();
        }

        // A listener stopping the clock from its own callback already holds
        // the delivery lock on this thread.
        if *lock(&self.inner.delivering_on) == Some(thread::current().id()) {
            return;
        }
        // Wait out a delivery that started on another thread before the cancel.
        drop(lock(&self.inner.delivery));
    }

    pub fn is_running(&self) -> bool {
        lock(&self.inner.run)
            .as_ref()
            .is_some_and(|token| !token.is_cancelled())
    }

    pub fn remaining_seconds(&self) -> u64 {
        self.inner.remaining.load(Ordering::Acquire)
    }
}

impl Drop for Clock {
    fn drop(&mut self) {
        if let Some(token) = lock(&self.inner.run).as_ref() {
            token.cancel();
        }
    }
}

impl ClockInner {
    /// Decrements and notifies, unless the run was cancelled first.
    fn advance(&self, token: &CancellationToken, listener: &dyn ClockListener) -> Advance {
        let _delivery = lock(&self.delivery);
        if token.is_cancelled() {
            return Advance::Cancelled;
        }

        let remaining = match self
            .remaining
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |r| r.checked_sub(1))
        {
            Ok(previous) => previous - 1,
            Err(_) => 0,
        };

        *lock(&self.delivering_on) = Some(thread::current().id());
        listener.on_tick(remaining);
        let outcome = if remaining > 0 {
            Advance::Ticked
        } else {
            // The tick callback may already have stopped the clock.
            if !token.is_cancelled() {
                listener.on_expired();
            }
            Advance::Expired
        };
        *lock(&self.delivering_on) = None;

        outcome
    }
}

async fn tick_loop(
    inner: Arc<ClockInner>,
    token: CancellationToken,
    period: Duration,
    listener: Weak<dyn ClockListener>,
) {
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Burst);

    loop {
        tokio::select! {
            biased;
            _ = token.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let Some(listener) = listener.upgrade() else {
            tracing::debug!("clock listener dropped, stopping");
            token.cancel();
            break;
        };

        match inner.advance(&token, listener.as_ref()) {
            Advance::Ticked => {}
            Advance::Expired => {
                tracing::debug!("clock expired");
                token.cancel();
                break;
            }
            Advance::Cancelled => break,
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
