//! # The Injected Clock
//!
//! Every "now" in the engine flows through [`Clock`]. The opphør scan is
//! anchored on the current month and attestation entries are timestamped;
//! both must be reproducible in tests, so the engine never reads the system
//! clock directly.

use chrono::{DateTime, Utc};

use crate::periode::Maaned;

/// Source of the current instant.
///
/// Implementations must be cheap to call; the engine may consult the clock
/// several times within one transition.
pub trait Clock {
    /// The current instant in UTC.
    fn now(&self) -> DateTime<Utc>;

    /// The current calendar month, derived from [`Clock::now`].
    fn naavaerende_maaned(&self) -> Maaned {
        Maaned::from_date(self.now().date_naive())
    }
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock pinned to a fixed instant.
///
/// Used by tests and by replay tooling that must re-run a decision as of a
/// historical instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(DateTime<Utc>);

impl FixedClock {
    /// Pin the clock to the given instant.
    pub fn at(instant: DateTime<Utc>) -> Self {
        Self(instant)
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}
