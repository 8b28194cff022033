// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wall-clock source for persisted timestamps and daily file names.

use std::fmt::Debug;

use chrono::{Local, NaiveDateTime};
use parking_lot::Mutex;

/// Returns the current local wall-clock time.
pub trait Clock: Debug + Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

/// The system's local time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// A clock that reports whatever it was last set to.
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<NaiveDateTime>,
}

impl FixedClock {
    pub fn new(now: NaiveDateTime) -> Self {
        FixedClock {
            now: Mutex::new(now),
        }
    }

    pub fn set(&self, now: NaiveDateTime) {
        *self.now.lock() = now;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        *self.now.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn fixed_clock_moves_only_when_set() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 31)
            .unwrap()
            .and_hms_opt(23, 59, 59)
            .unwrap();
        let clock = FixedClock::new(start);
        assert_eq!(clock.now(), start);
        let next = start + chrono::Duration::seconds(1);
        clock.set(next);
        assert_eq!(clock.now(), next);
    }
}
