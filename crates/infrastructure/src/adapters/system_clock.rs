//! Wall-clock adapter for the `Clock` port.

use chrono::{DateTime, Utc};
use tollgate_application::ports::Clock;

/// Reads the operating system's UTC time. Session expiry in production is
/// judged against this clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
