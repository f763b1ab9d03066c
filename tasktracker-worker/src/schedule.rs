/// Wall-clock daily schedule
///
/// Fires once per day at a fixed UTC time of day, independent of when the
/// worker was started.

use chrono::{DateTime, Duration, NaiveTime, Timelike, Utc};

/// Error constructing a schedule
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScheduleError {
    #[error("Invalid time of day {hour:02}:{minute:02}")]
    InvalidTime { hour: u32, minute: u32 },
}

/// Once a day at `hour:minute` UTC
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailySchedule {
    at: NaiveTime,
}

impl DailySchedule {
    /// Creates a schedule firing at `hour:minute` UTC
    ///
    /// # Errors
    ///
    /// Returns `ScheduleError::InvalidTime` unless `hour < 24` and `minute < 60`.
    pub fn new(hour: u32, minute: u32) -> Result<Self, ScheduleError> {
        NaiveTime::from_hms_opt(hour, minute, 0)
            .map(|at| Self { at })
            .ok_or(ScheduleError::InvalidTime { hour, minute })
    }

    pub fn hour(&self) -> u32 {
        self.at.hour()
    }

    pub fn minute(&self) -> u32 {
        self.at.minute()
    }

    /// First firing instant strictly after `now`
    pub fn next_after(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let today = now.date_naive().and_time(self.at).and_utc();

        if today > now {
            today
        } else {
            today + Duration::days(1)
        }
    }
}

impl Default for DailySchedule {
    /// 03:00 UTC
    fn default() -> Self {
        Self {
            at: NaiveTime::MIN + Duration::hours(3),
        }
    }
}
