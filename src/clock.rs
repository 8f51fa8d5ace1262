use std::cell::Cell;
use std::rc::Rc;

use chrono::{Local, NaiveDateTime};

use crate::domain::Clock;

/// Wall clock; calendar days follow the local timezone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Hand-driven clock. Clones share the instant, so a ledger holding one
/// handle sees adjustments made through another.
#[derive(Debug, Clone)]
pub struct FixedClock(Rc<Cell<NaiveDateTime>>);

impl FixedClock {
    pub fn at(start: NaiveDateTime) -> Self {
        Self(Rc::new(Cell::new(start)))
    }

    pub fn set(&self, to: NaiveDateTime) {
        self.0.set(to);
    }

    pub fn advance_days(&self, days: i64) {
        self.0.set(self.0.get() + chrono::Duration::days(days));
    }
}

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn clones_share_the_instant() {
        let start = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        let clock = FixedClock::at(start);
        let handle = clock.clone();

        handle.advance_days(2);
        assert_eq!(clock.today(), NaiveDate::from_ymd_opt(2024, 3, 3).unwrap());
        assert_eq!(clock.now(), start + chrono::Duration::days(2));
    }
}
