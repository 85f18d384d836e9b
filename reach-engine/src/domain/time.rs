//! Timestamps for reachability search.
//!
//! Schedules publish times relative to a service day, and trips that run past
//! midnight keep counting hours (`"25:10:00"` is ten past one the next
//! morning). `ReachTime` stores the resolved calendar date and time of day so
//! comparisons across midnight stay correct.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Error returned when parsing an invalid time string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid time: {reason}")]
pub struct TimeError {
    reason: &'static str,
}

impl TimeError {
    fn new(reason: &'static str) -> Self {
        Self { reason }
    }
}

/// A date-aware timestamp with second precision.
///
/// # Examples
///
/// ```
/// use reach_engine::domain::ReachTime;
/// use chrono::NaiveDate;
///
/// let date = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
/// let time = ReachTime::parse_hhmm("14:30", date).unwrap();
/// assert_eq!(time.to_string(), "14:30:00");
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReachTime {
    date: NaiveDate,
    time: NaiveTime,
}

impl ReachTime {
    /// Create a new ReachTime from date and time components.
    pub fn new(date: NaiveDate, time: NaiveTime) -> Self {
        Self { date, time }
    }

    /// Create a ReachTime from a full datetime.
    pub fn from_datetime(dt: NaiveDateTime) -> Self {
        Self {
            date: dt.date(),
            time: dt.time(),
        }
    }

    /// Parse a time from "HH:MM" format with a given base date.
    ///
    /// ```
    /// use reach_engine::domain::ReachTime;
    /// use chrono::NaiveDate;
    ///
    /// let date = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
    ///
    /// assert!(ReachTime::parse_hhmm("00:00", date).is_ok());
    /// assert!(ReachTime::parse_hhmm("23:59", date).is_ok());
    /// assert!(ReachTime::parse_hhmm("1430", date).is_err());
    /// assert!(ReachTime::parse_hhmm("25:00", date).is_err());
    /// ```
    pub fn parse_hhmm(s: &str, date: NaiveDate) -> Result<Self, TimeError> {
        let bytes = s.as_bytes();
        if bytes.len() != 5 {
            return Err(TimeError::new("expected HH:MM format"));
        }
        if bytes.get(2) != Some(&b':') {
            return Err(TimeError::new("expected colon at position 2"));
        }

        let hour = parse_digits(&bytes[0..2]).ok_or_else(|| TimeError::new("invalid hour digits"))?;
        if hour > 23 {
            return Err(TimeError::new("hour must be 0-23"));
        }
        let minute =
            parse_digits(&bytes[3..5]).ok_or_else(|| TimeError::new("invalid minute digits"))?;
        if minute > 59 {
            return Err(TimeError::new("minute must be 0-59"));
        }

        let time = NaiveTime::from_hms_opt(hour, minute, 0)
            .ok_or_else(|| TimeError::new("invalid time"))?;
        Ok(Self { date, time })
    }

    /// Parse a schedule time in "H:MM:SS" or "HH:MM:SS" form relative to a
    /// service day. Hours may exceed 23 for trips running past midnight.
    ///
    /// ```
    /// use reach_engine::domain::ReachTime;
    /// use chrono::NaiveDate;
    ///
    /// let day = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
    /// let late = ReachTime::parse_service_time("25:10:00", day).unwrap();
    /// assert_eq!(late.date(), NaiveDate::from_ymd_opt(2024, 3, 16).unwrap());
    /// assert_eq!(late.to_string(), "01:10:00");
    /// ```
    pub fn parse_service_time(s: &str, service_date: NaiveDate) -> Result<Self, TimeError> {
        let mut parts = s.trim().split(':');
        let (Some(h), Some(m), Some(sec), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(TimeError::new("expected H:MM:SS format"));
        };

        if h.is_empty() || h.len() > 3 || m.len() != 2 || sec.len() != 2 {
            return Err(TimeError::new("expected H:MM:SS format"));
        }
        let hours = parse_digits(h.as_bytes()).ok_or_else(|| TimeError::new("invalid hour digits"))?;
        let minutes =
            parse_digits(m.as_bytes()).ok_or_else(|| TimeError::new("invalid minute digits"))?;
        let seconds =
            parse_digits(sec.as_bytes()).ok_or_else(|| TimeError::new("invalid second digits"))?;
        if minutes > 59 || seconds > 59 {
            return Err(TimeError::new("minutes and seconds must be 0-59"));
        }

        let offset = i64::from(hours) * 3600 + i64::from(minutes) * 60 + i64::from(seconds);
        Self::from_service_seconds(service_date, offset)
            .ok_or_else(|| TimeError::new("time out of range"))
    }

    /// Resolve seconds after midnight of a service day to a timestamp.
    pub fn from_service_seconds(service_date: NaiveDate, seconds: i64) -> Option<Self> {
        let midnight = service_date.and_hms_opt(0, 0, 0)?;
        let dt = midnight.checked_add_signed(Duration::seconds(seconds))?;
        Some(Self::from_datetime(dt))
    }

    /// Returns the date component.
    pub fn date(&self) -> NaiveDate {
        self.date
    }

    /// Returns the time component.
    pub fn time(&self) -> NaiveTime {
        self.time
    }

    /// Converts to a NaiveDateTime.
    pub fn to_datetime(&self) -> NaiveDateTime {
        self.date.and_time(self.time)
    }

    /// Seconds since the Unix epoch, treating the timestamp as UTC.
    pub fn epoch_seconds(&self) -> i64 {
        self.to_datetime().and_utc().timestamp()
    }

    /// Add a duration, returning `None` on overflow.
    pub fn checked_add(&self, duration: Duration) -> Option<Self> {
        self.to_datetime()
            .checked_add_signed(duration)
            .map(Self::from_datetime)
    }

    /// Subtract a duration, returning `None` on overflow.
    pub fn checked_sub(&self, duration: Duration) -> Option<Self> {
        self.to_datetime()
            .checked_sub_signed(duration)
            .map(Self::from_datetime)
    }

    /// Add a duration, clamping to the representable range.
    pub fn saturating_add(&self, duration: Duration) -> Self {
        self.checked_add(duration).unwrap_or_else(|| {
            if duration < Duration::zero() {
                Self::from_datetime(NaiveDateTime::MIN)
            } else {
                Self::from_datetime(NaiveDateTime::MAX)
            }
        })
    }

    /// Subtract a duration, clamping to the representable range.
    pub fn saturating_sub(&self, duration: Duration) -> Self {
        self.saturating_add(-duration)
    }

    /// Returns the duration between two times.
    ///
    /// Returns a negative duration if `other` is after `self`.
    pub fn signed_duration_since(&self, other: Self) -> Duration {
        self.to_datetime().signed_duration_since(other.to_datetime())
    }

    /// Absolute distance in time between two timestamps.
    pub fn abs_diff(&self, other: Self) -> Duration {
        self.signed_duration_since(other).abs()
    }
}

impl Ord for ReachTime {
    fn cmp(&self, other: &Self) -> Ordering {
        self.to_datetime().cmp(&other.to_datetime())
    }
}

impl PartialOrd for ReachTime {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Debug for ReachTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ReachTime({} {:02}:{:02}:{:02})",
            self.date,
            self.time.hour(),
            self.time.minute(),
            self.time.second()
        )
    }
}

impl fmt::Display for ReachTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}:{:02}:{:02}",
            self.time.hour(),
            self.time.minute(),
            self.time.second()
        )
    }
}

/// Parse a short run of ASCII digits into a u32.
fn parse_digits(bytes: &[u8]) -> Option<u32> {
    if bytes.is_empty() {
        return None;
    }
    bytes.iter().try_fold(0u32, |acc, b| {
        let digit = (*b as char).to_digit(10)?;
        acc.checked_mul(10)?.checked_add(digit)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn parse_valid_hhmm() {
        let d = date(2024, 3, 15);
        let t = ReachTime::parse_hhmm("14:30", d).unwrap();
        assert_eq!(t.time().hour(), 14);
        assert_eq!(t.time().minute(), 30);
        assert_eq!(t.date(), d);
    }

    #[test]
    fn parse_invalid_hhmm() {
        let d = date(2024, 3, 15);
        assert!(ReachTime::parse_hhmm("1430", d).is_err());
        assert!(ReachTime::parse_hhmm("14-30", d).is_err());
        assert!(ReachTime::parse_hhmm("ab:cd", d).is_err());
        assert!(ReachTime::parse_hhmm("24:00", d).is_err());
        assert!(ReachTime::parse_hhmm("12:60", d).is_err());
    }

    #[test]
    fn parse_service_time_same_day() {
        let d = date(2024, 3, 15);
        let t = ReachTime::parse_service_time("8:05:30", d).unwrap();
        assert_eq!(t.date(), d);
        assert_eq!(t.to_string(), "08:05:30");
    }

    #[test]
    fn parse_service_time_past_midnight() {
        let d = date(2024, 3, 15);
        let t = ReachTime::parse_service_time("24:00:00", d).unwrap();
        assert_eq!(t.date(), date(2024, 3, 16));
        assert_eq!(t.to_string(), "00:00:00");
    }

    #[test]
    fn parse_service_time_rejects_garbage() {
        let d = date(2024, 3, 15);
        assert!(ReachTime::parse_service_time("08:05", d).is_err());
        assert!(ReachTime::parse_service_time("08:5:00", d).is_err());
        assert!(ReachTime::parse_service_time("08:05:61", d).is_err());
        assert!(ReachTime::parse_service_time("x8:05:00", d).is_err());
        assert!(ReachTime::parse_service_time("08:05:00:00", d).is_err());
    }

    #[test]
    fn ordering_across_days() {
        let t1 = ReachTime::parse_hhmm("23:00", date(2024, 3, 15)).unwrap();
        let t2 = ReachTime::parse_hhmm("01:00", date(2024, 3, 16)).unwrap();
        assert!(t1 < t2);
    }

    #[test]
    fn add_and_subtract() {
        let d = date(2024, 3, 15);
        let t = ReachTime::parse_hhmm("23:30", d).unwrap();

        let later = t.checked_add(Duration::hours(1)).unwrap();
        assert_eq!(later.to_string(), "00:30:00");
        assert_eq!(later.date(), date(2024, 3, 16));

        let earlier = t.checked_sub(Duration::minutes(45)).unwrap();
        assert_eq!(earlier.to_string(), "22:45:00");
    }

    #[test]
    fn saturating_add_clamps() {
        let t = ReachTime::from_datetime(NaiveDateTime::MAX);
        assert_eq!(t.saturating_add(Duration::seconds(1)), t);
    }

    #[test]
    fn duration_between() {
        let d = date(2024, 3, 15);
        let t1 = ReachTime::parse_hhmm("10:00", d).unwrap();
        let t2 = ReachTime::parse_hhmm("12:30", d).unwrap();

        assert_eq!(t2.signed_duration_since(t1), Duration::minutes(150));
        assert_eq!(t1.signed_duration_since(t2), Duration::minutes(-150));
        assert_eq!(t1.abs_diff(t2), Duration::minutes(150));
    }
}
