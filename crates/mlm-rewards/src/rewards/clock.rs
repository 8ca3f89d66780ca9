use chrono::{DateTime, Duration, Utc};
use std::sync::Mutex;

/// Source of the current instant for creation and transition timestamps.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn set(&self, instant: DateTime<Utc>) {
        *self.lock() = instant;
    }

    /// Moves the clock forward, returning the new instant. The clock is left untouched
    /// when the result falls outside the representable range.
    pub fn advance(&self, by: Duration) -> Result<DateTime<Utc>, ClockError> {
        let mut guard = self.lock();
        let next = guard
            .checked_add_signed(by)
            .ok_or(ClockError::OutOfRange { from: *guard, by })?;
        *guard = next;
        Ok(next)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, DateTime<Utc>> {
        // A poisoned clock still holds a valid instant.
        self.now
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClockError {
    #[error("cannot move clock from {from} by {by}")]
    OutOfRange { from: DateTime<Utc>, by: Duration },
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.lock()
    }
}
