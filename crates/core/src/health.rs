//! Availability state machine for the local store.
//!
//! A database failure moves the store to `Degraded` for a cooldown window;
//! while degraded, callers short-circuit to their empty/no-op path instead
//! of hammering a broken connection. The transition functions are pure and
//! take the current instant from an injected clock.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};

/// Cooldown applied after a store failure.
pub const DEGRADED_COOLDOWN_SECS: i64 = 5;

/// Source of the current instant.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock implementation used outside tests.
#[derive(Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Store availability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthState {
    Healthy,
    Degraded { until: DateTime<Utc> },
}

impl HealthState {
    /// Transition after a failed store operation.
    pub fn on_failure(self, now: DateTime<Utc>) -> HealthState {
        HealthState::Degraded {
            until: now + Duration::seconds(DEGRADED_COOLDOWN_SECS),
        }
    }

    /// Probe before a store operation. Returns the next state and whether
    /// the operation may proceed. A degraded store recovers once the
    /// cooldown has elapsed.
    pub fn probe(self, now: DateTime<Utc>) -> (HealthState, bool) {
        match self {
            HealthState::Healthy => (HealthState::Healthy, true),
            HealthState::Degraded { until } if now >= until => (HealthState::Healthy, true),
            degraded => (degraded, false),
        }
    }
}

/// Shared health cell injected into store components.
pub struct HealthCell {
    state: Mutex<HealthState>,
    clock: Arc<dyn Clock>,
}

impl HealthCell {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Mutex::new(HealthState::Healthy),
            clock,
        }
    }

    /// Whether the store may be used right now. Advances a degraded state
    /// back to healthy when the cooldown has elapsed.
    pub fn available(&self) -> bool {
        let now = self.clock.now();
        let mut state = self.state.lock().expect("health lock");
        let (next, available) = state.probe(now);
        *state = next;
        available
    }

    /// Record a store failure and start the cooldown.
    pub fn record_failure(&self) {
        let now = self.clock.now();
        let mut state = self.state.lock().expect("health lock");
        *state = state.on_failure(now);
    }

    pub fn state(&self) -> HealthState {
        *self.state.lock().expect("health lock")
    }
}
