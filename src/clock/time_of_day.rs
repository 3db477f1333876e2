use std::fmt;

use chrono::{NaiveDateTime, NaiveTime, Timelike};

/// Minutes since midnight.
///
/// Schedules are time-of-day policies, not absolute-timestamp policies:
/// every "is the employee early/late" decision compares both sides on this
/// axis and ignores the calendar date entirely. Seconds are dropped at
/// construction, matching the minute granularity of schedule data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct TimeOfDay(u16);

impl TimeOfDay {
    pub fn new(hour: u32, minute: u32) -> Option<Self> {
        if hour < 24 && minute < 60 {
            Some(TimeOfDay((hour * 60 + minute) as u16))
        } else {
            None
        }
    }

    pub fn hour(self) -> u32 {
        u32::from(self.0) / 60
    }

    pub fn minute(self) -> u32 {
        u32::from(self.0) % 60
    }

    /// Signed minutes from `earlier` to `self`. Negative when `self` is
    /// before `earlier` on the time-of-day axis.
    pub fn minutes_since(self, earlier: TimeOfDay) -> i64 {
        i64::from(self.0) - i64::from(earlier.0)
    }

    pub fn as_naive_time(self) -> NaiveTime {
        NaiveTime::from_hms_opt(self.hour(), self.minute(), 0)
            .expect("minutes since midnight are always in range")
    }
}

impl From<NaiveTime> for TimeOfDay {
    fn from(t: NaiveTime) -> Self {
        TimeOfDay((t.hour() * 60 + t.minute()) as u16)
    }
}

impl From<NaiveDateTime> for TimeOfDay {
    fn from(dt: NaiveDateTime) -> Self {
        TimeOfDay::from(dt.time())
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_out_of_range_components() {
        assert!(TimeOfDay::new(24, 0).is_none());
        assert!(TimeOfDay::new(9, 60).is_none());
        assert!(TimeOfDay::new(23, 59).is_some());
    }

    #[test]
    fn orders_on_the_time_axis() {
        let nine = TimeOfDay::new(9, 0).unwrap();
        let five_pm = TimeOfDay::new(17, 0).unwrap();
        assert!(nine < five_pm);
        assert_eq!(five_pm.minutes_since(nine), 8 * 60);
        assert_eq!(nine.minutes_since(five_pm), -(8 * 60));
    }

    #[test]
    fn drops_calendar_and_seconds_from_timestamps() {
        let a = NaiveDateTime::parse_from_str("2024-09-15T08:45:59", "%Y-%m-%dT%H:%M:%S").unwrap();
        let b = NaiveDateTime::parse_from_str("2031-01-02T08:45:00", "%Y-%m-%dT%H:%M:%S").unwrap();
        assert_eq!(TimeOfDay::from(a), TimeOfDay::from(b));
    }

    #[test]
    fn round_trips_to_naive_time() {
        let t = TimeOfDay::new(13, 20).unwrap();
        assert_eq!(t.as_naive_time(), NaiveTime::from_hms_opt(13, 20, 0).unwrap());
        assert_eq!(t.to_string(), "13:20");
    }
}
