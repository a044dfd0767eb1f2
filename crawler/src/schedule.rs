//! Weekly schedule for the crawler service.

use crate::config::ConfigError;
use chrono::{Datelike, Duration, NaiveDateTime, NaiveTime, Weekday};
use std::fmt;

/// A weekly point in time: day of the week plus local time of day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeeklySchedule {
    pub day: Weekday,
    pub time: NaiveTime,
}

impl WeeklySchedule {
    /// Parse a day name (`"sunday"`, `"Sun"`, ...) and a time (`HH:MM` or `HH:MM:SS`).
    pub fn parse(day: &str, time: &str) -> Result<Self, ConfigError> {
        let day = day
            .trim()
            .parse::<Weekday>()
            .map_err(|_| ConfigError::InvalidScheduleDay(day.to_string()))?;
        let time = NaiveTime::parse_from_str(time.trim(), "%H:%M:%S")
            .or_else(|_| NaiveTime::parse_from_str(time.trim(), "%H:%M"))
            .map_err(|_| ConfigError::InvalidScheduleTime(time.to_string()))?;
        Ok(WeeklySchedule { day, time })
    }

    /// Next scheduled run after `now`.
    ///
    /// The run always lands on a later day, between one and seven days
    /// ahead. When `now` falls on the scheduled weekday the next run is a
    /// week later, even if the scheduled time has not passed yet today.
    pub fn next_after(&self, now: NaiveDateTime) -> NaiveDateTime {
        let start = i64::from(now.weekday().num_days_from_sunday());
        let mut target = i64::from(self.day.num_days_from_sunday());
        if target <= start {
            target += 7;
        }
        (now.date() + Duration::days(target - start)).and_time(self.time)
    }
}

impl fmt::Display for WeeklySchedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "every {} at {}", self.day, self.time)
    }
}
