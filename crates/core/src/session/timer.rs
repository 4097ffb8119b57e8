use chrono::{DateTime, TimeDelta, Utc};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::warn;

/// Longest countdown the timer will run; longer requests are clamped
const MAX_COUNTDOWN: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

/// Single-shot countdown that runs a callback when it elapses
///
/// At most one countdown is pending: arming cancels the previous one first.
/// Dropping the timer cancels it.
#[derive(Debug, Default)]
pub struct IdleTimer {
    handle: Option<JoinHandle<()>>,
    deadline: Option<Instant>,
    expires_at: Option<DateTime<Utc>>,
}

impl IdleTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel any pending countdown and start a new one
    ///
    /// Must be called from within a tokio runtime.
    pub fn arm<F>(&mut self, duration: Duration, on_expire: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.cancel();

        let duration = if duration > MAX_COUNTDOWN {
            warn!(
                "Idle timeout of {}s is out of range; clamping to {}s",
                duration.as_secs(),
                MAX_COUNTDOWN.as_secs()
            );
            MAX_COUNTDOWN
        } else {
            duration
        };

        self.deadline = Instant::now().checked_add(duration);
        self.expires_at = TimeDelta::from_std(duration)
            .ok()
            .and_then(|delta| Utc::now().checked_add_signed(delta));
        self.handle = Some(tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            on_expire();
        }));
    }

    /// Cancel the pending countdown; returns whether one was pending
    pub fn cancel(&mut self) -> bool {
        self.deadline = None;
        self.expires_at = None;
        match self.handle.take() {
            Some(handle) => {
                let pending = !handle.is_finished();
                handle.abort();
                pending
            }
            None => false,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.handle
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Monotonic deadline of the pending countdown
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline.filter(|_| self.is_pending())
    }

    /// Wall-clock time at which the pending countdown elapses
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at.filter(|_| self.is_pending())
    }
}

impl Drop for IdleTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}
