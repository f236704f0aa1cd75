//! Local quota on real synthesis calls.
//!
//! A window opens with the first unit consumed and lasts `window`. The reset
//! is computed lazily when the next request arrives; there is no timer task.

use std::time::Duration;

use parking_lot::Mutex;
use serde::Serialize;
use tokio::time::Instant;

#[derive(Debug)]
struct QuotaState {
    used: u32,
    window_start: Option<Instant>,
}

/// Snapshot of the quota window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QuotaUsage {
    pub used: u32,
    pub limit: u32,
    /// Time until the current window resets (zero when no window is open)
    #[serde(with = "duration_secs")]
    pub resets_in: Duration,
}

/// Counter of synthesis calls per time window.
#[derive(Debug)]
pub struct QuotaWindow {
    limit: u32,
    window: Duration,
    state: Mutex<QuotaState>,
}

impl QuotaWindow {
    pub fn new(limit: u32, window: Duration) -> Self {
        Self {
            limit,
            window,
            state: Mutex::new(QuotaState {
                used: 0,
                window_start: None,
            }),
        }
    }

    #[inline]
    pub fn limit(&self) -> u32 {
        self.limit
    }

    #[inline]
    pub fn window(&self) -> Duration {
        self.window
    }

    fn roll(&self, state: &mut QuotaState, now: Instant) {
        if let Some(start) = state.window_start {
            if now.duration_since(start) >= self.window {
                state.used = 0;
                state.window_start = None;
            }
        }
    }

    fn resets_in(&self, state: &QuotaState, now: Instant) -> Duration {
        state
            .window_start
            .map(|start| self.window.saturating_sub(now.duration_since(start)))
            .unwrap_or(Duration::ZERO)
    }

    /// Atomically consumes `units`, all or nothing.
    ///
    /// Returns the time until the window resets when there is not enough
    /// quota left.
    pub fn try_acquire(&self, units: u32) -> Result<(), Duration> {
        let now = Instant::now();
        let mut state = self.state.lock();
        self.roll(&mut state, now);

        if state.used.saturating_add(units) > self.limit {
            return Err(self.resets_in(&state, now));
        }
        if state.window_start.is_none() {
            state.window_start = Some(now);
        }
        state.used += units;
        Ok(())
    }

    /// Returns whether `units` could be acquired right now.
    pub fn has_capacity(&self, units: u32) -> bool {
        let now = Instant::now();
        let mut state = self.state.lock();
        self.roll(&mut state, now);
        state.used.saturating_add(units) <= self.limit
    }

    /// Time until the current window resets.
    pub fn retry_after(&self) -> Duration {
        let now = Instant::now();
        let mut state = self.state.lock();
        self.roll(&mut state, now);
        self.resets_in(&state, now)
    }

    pub fn usage(&self) -> QuotaUsage {
        let now = Instant::now();
        let mut state = self.state.lock();
        self.roll(&mut state, now);
        QuotaUsage {
            used: state.used,
            limit: self.limit,
            resets_in: self.resets_in(&state, now),
        }
    }

    /// Closes the current window.
    pub fn reset(&self) {
        let mut state = self.state.lock();
        state.used = 0;
        state.window_start = None;
    }
}

mod duration_secs {
    use std::time::Duration;

    use serde::Serializer;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_secs())
    }
}
