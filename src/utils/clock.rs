use chrono::{DateTime, Utc};

/// Represents an entity responsible for providing the current time across the
/// application. Session durations are measured through this, so tests can
/// drive time explicitly.
pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
