use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

use super::schedule::ScheduleType;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, Display, EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum AttendanceStatus {
    Ongoing,
    Break,
    Done,
    UnpaidLeave,
    PaidLeave,
}

impl AttendanceStatus {
    /// Leave statuses are set by administrative edits and never leave
    /// through clock events.
    pub fn is_leave(self) -> bool {
        matches!(
            self,
            AttendanceStatus::UnpaidLeave | AttendanceStatus::PaidLeave
        )
    }
}

/// One row per (employee, calendar day). Totals are hours.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Attendance {
    pub id: u64,
    pub employee_id: u64,
    pub date: NaiveDate,
    pub status: AttendanceStatus,
    pub schedule_type: ScheduleType,
    pub time_in: Option<NaiveTime>,
    pub time_out: Option<NaiveTime>,
    pub lunch_time_in: Option<NaiveTime>,
    pub lunch_time_out: Option<NaiveTime>,
    pub time_total: f64,
    pub time_hours_worked: f64,
    pub over_time_total: f64,
    pub lunch_time_total: f64,
}

pub const ATTENDANCE_COLUMNS: &str = "id, employee_id, date, status, schedule_type, time_in, time_out, \
     lunch_time_in, lunch_time_out, time_total, time_hours_worked, over_time_total, \
     lunch_time_total";
