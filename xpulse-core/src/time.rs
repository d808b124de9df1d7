//! Week calendar in a fixed timezone.
//!
//! Weeks run Sunday..Saturday. Host time zone never matters: every
//! local-time question is answered in the zone the calendar was built with.

use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc, Weekday};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TrackerError};

/// Source of "now". Injected so controller behaviour is reproducible.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self { now: Mutex::new(now) }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner) = now;
    }

    pub fn advance(&self, by: Duration) {
        let mut guard = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *guard += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayCategory {
    Weekend,
    Weekday,
}

/// Sunday is day 0. chrono numbers from Monday, hence the shift.
pub fn days_since_sunday(weekday: Weekday) -> u32 {
    (weekday.num_days_from_monday() + 1) % 7
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Calendar {
    tz: Tz,
}

impl Calendar {
    /// Build a calendar from an IANA zone name like "Asia/Kolkata".
    pub fn new(tz: &str) -> Result<Self> {
        let tz: Tz = tz
            .parse()
            .map_err(|_| TrackerError::Config(format!("invalid timezone: {tz}")))?;
        Ok(Self { tz })
    }

    pub fn now(&self, clock: &dyn Clock) -> DateTime<Tz> {
        self.local(clock.now())
    }

    pub fn local(&self, instant: DateTime<Utc>) -> DateTime<Tz> {
        instant.with_timezone(&self.tz)
    }

    /// Calendar date of `instant` in the configured zone.
    pub fn date_of(&self, instant: DateTime<Utc>) -> NaiveDate {
        self.local(instant).date_naive()
    }

    /// Sunday (local date) of the week containing `instant`.
    pub fn week_start_date(&self, instant: DateTime<Utc>) -> NaiveDate {
        week_start_of_date(self.date_of(instant))
    }

    /// Sunday 00:00:00 local of the week containing `instant`.
    pub fn week_start(&self, instant: DateTime<Utc>) -> DateTime<Tz> {
        self.resolve_local(self.week_start_date(instant).and_time(NaiveTime::MIN))
    }

    /// First and last day (Sunday, Saturday) of the bucket keyed by `week_start`.
    pub fn week_bounds(&self, week_start: NaiveDate) -> (NaiveDate, NaiveDate) {
        (week_start, week_start + Duration::days(6))
    }

    pub fn day_category(&self, instant: DateTime<Utc>) -> DayCategory {
        match self.local(instant).weekday() {
            Weekday::Sat | Weekday::Sun => DayCategory::Weekend,
            _ => DayCategory::Weekday,
        }
    }

    /// Saturday 23:59 local of the given week bucket.
    pub fn default_deadline(&self, week_start: NaiveDate) -> DateTime<Utc> {
        let (_, saturday) = self.week_bounds(week_start);
        let ndt = saturday.and_time(NaiveTime::MIN) + Duration::minutes(23 * 60 + 59);
        self.resolve_local(ndt).with_timezone(&Utc)
    }

    /// (year, month) of `instant` in the configured zone.
    pub fn month_key(&self, instant: DateTime<Utc>) -> (i32, u32) {
        let local = self.local(instant);
        (local.year(), local.month())
    }

    /// Parse a caller-supplied deadline like "2026-02-20 23:59" (or the
    /// `datetime-local` form "2026-02-20T23:59") as local time in the zone.
    pub fn parse_local_deadline(&self, local: &str) -> Result<DateTime<Utc>> {
        let trimmed = local.trim();
        let ndt = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M")
            .or_else(|_| NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M"))
            .map_err(|e| TrackerError::Validation(format!("invalid local datetime '{trimmed}': {e}")))?;

        let local_dt = self.tz.from_local_datetime(&ndt).single().ok_or_else(|| {
            TrackerError::Validation(format!(
                "ambiguous or invalid local time (DST?): {trimmed} {}",
                self.tz
            ))
        })?;

        Ok(local_dt.with_timezone(&Utc))
    }

    /// Map a local wall-clock time to an instant, stepping past DST gaps.
    fn resolve_local(&self, ndt: NaiveDateTime) -> DateTime<Tz> {
        let mut probe = ndt;
        for _ in 0..4 {
            if let Some(dt) = self.tz.from_local_datetime(&probe).earliest() {
                return dt;
            }
            probe += Duration::minutes(30);
        }
        self.tz.from_utc_datetime(&ndt)
    }
}

/// Sunday on or before `date`.
pub fn week_start_of_date(date: NaiveDate) -> NaiveDate {
    date - Duration::days(days_since_sunday(date.weekday()) as i64)
}
