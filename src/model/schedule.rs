use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, Display, EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ScheduleType {
    Fixed,
    Flexi,
    SuperFlexi,
}

impl ScheduleType {
    /// FIXED is the only type that clamps clock events to the scheduled
    /// window; the flexi variants treat start/end as nominal.
    pub fn is_fixed(self) -> bool {
        self == ScheduleType::Fixed
    }
}

/// Reference data edited only through department-schedule management.
/// Time columns carry hour/minute only; the date axis never participates
/// in schedule comparisons.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Schedule {
    pub id: u64,
    pub schedule_type: ScheduleType,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub lunch_start_time: NaiveTime,
    pub lunch_end_time: NaiveTime,
    pub limit_work_hours_day: Option<f64>,
    pub allowed_overtime: bool,
}
