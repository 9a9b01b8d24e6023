//! Sources of "today" for date-based rules.

use chrono::{DateTime, NaiveDate, Utc};

/// Generic definition of a clock.
pub trait Clock: Send + Sync {
    /// Returns the current UTC time.
    fn now_utc(&self) -> DateTime<Utc>;

    /// Returns the current calendar date.
    fn today(&self) -> NaiveDate {
        self.now_utc().date_naive()
    }
}

/// Clock implementation that uses the system clock.
#[derive(Clone, Default)]
pub struct SystemClock {}

impl Clock for SystemClock {
    fn now_utc(&self) -> DateTime<Utc> {
        Utc::now()
    }
}


#[cfg(test)]
mod tests {
    use super::testutils::SettableClock;
    use super::*;

    #[test]
    fn test_systemclock_trivial() {
        let clock = SystemClock::default();
        let now1 = clock.now_utc();
        let now2 = clock.now_utc();
        assert!(now2 >= now1);
    }

    #[test]
    fn test_settableclock_today_follows_set() {
        let clock = SettableClock::at_date(NaiveDate::from_ymd_opt(2024, 2, 28).unwrap());
        assert_eq!(NaiveDate::from_ymd_opt(2024, 2, 28).unwrap(), clock.today());

        clock.set(
            NaiveDate::from_ymd_opt(2024, 2, 29).unwrap().and_hms_opt(23, 59, 59).unwrap().and_utc(),
        );
        assert_eq!(NaiveDate::from_ymd_opt(2024, 2, 29).unwrap(), clock.today());
    }
}
