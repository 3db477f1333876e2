use chrono::NaiveTime;
use serde::Serialize;

use super::schedule::ScheduleType;

/// Join entity mapping (department, role) to a schedule.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct DepartmentSchedule {
    pub id: u64,
    pub name: String,
    pub role: String,
    pub department_id: u64,
    pub schedule_id: u64,
}

/// Join row flattened with its schedule, as listing endpoints return it.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct DepartmentScheduleDetail {
    pub id: u64,
    pub name: String,
    pub role: String,
    pub department_id: u64,
    pub schedule_id: u64,
    pub schedule_type: ScheduleType,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub lunch_start_time: NaiveTime,
    pub lunch_end_time: NaiveTime,
    pub limit_work_hours_day: Option<f64>,
    pub allowed_overtime: bool,
}

pub const DETAIL_COLUMNS: &str = "ds.id, ds.name, ds.role, ds.department_id, ds.schedule_id, \
     s.schedule_type, s.start_time, s.end_time, s.lunch_start_time, s.lunch_end_time, \
     s.limit_work_hours_day, s.allowed_overtime";
