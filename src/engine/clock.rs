use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;

/// Time source seam. The engine never reads ambient system time directly;
/// it asks its injected clock, so tests can pin "now".
pub trait Clock: Send + Sync {
    fn now_utc(&self) -> DateTime<Utc>;
}

/// Production clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_utc(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Deterministic clock for tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now_utc(&self) -> DateTime<Utc> {
        self.0
    }
}

/// The calendar day as observed in the facility's timezone, independent of
/// the host clock's zone configuration.
pub fn local_day(now: DateTime<Utc>, timezone: Tz) -> NaiveDate {
    now.with_timezone(&timezone).date_naive()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    #[test]
    fn local_day_matches_utc_midday() {
        let now = utc("2026-08-10T15:00:00Z");
        let day = local_day(now, chrono_tz::America::Guayaquil);
        assert_eq!(day, NaiveDate::from_ymd_opt(2026, 8, 10).unwrap());
    }

    #[test]
    fn local_day_lags_utc_after_utc_midnight() {
        // 03:00 UTC is still 22:00 the previous evening in Guayaquil (UTC-5).
        let now = utc("2026-08-11T03:00:00Z");
        let day = local_day(now, chrono_tz::America::Guayaquil);
        assert_eq!(day, NaiveDate::from_ymd_opt(2026, 8, 10).unwrap());
    }

    #[test]
    fn local_day_leads_utc_in_eastern_zones() {
        let now = utc("2026-08-10T22:00:00Z");
        let day = local_day(now, chrono_tz::Asia::Tokyo);
        assert_eq!(day, NaiveDate::from_ymd_opt(2026, 8, 11).unwrap());
    }

    #[test]
    fn fixed_clock_is_deterministic() {
        let clock = FixedClock(utc("2026-08-10T15:00:00Z"));
        assert_eq!(clock.now_utc(), clock.now_utc());
    }
}
