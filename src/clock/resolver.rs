use sqlx::MySqlPool;

use crate::error::ApiError;
use crate::model::schedule::Schedule;

/// Look up the schedule configured for an employee's role within their
/// department: first matching `department_schedules` row, joined to its
/// schedule. Schedules are mutable administrative data, so the result is
/// read fresh on every clock event and never cached.
pub async fn resolve_schedule(
    pool: &MySqlPool,
    role: &str,
    department_id: u64,
) -> Result<Schedule, ApiError> {
    let schedule = sqlx::query_as::<_, Schedule>(
        r#"
        SELECT s.id, s.schedule_type, s.start_time, s.end_time,
               s.lunch_start_time, s.lunch_end_time,
               s.limit_work_hours_day, s.allowed_overtime
        FROM department_schedules ds
        JOIN schedules s ON s.id = ds.schedule_id
        WHERE ds.department_id = ? AND ds.role = ?
        ORDER BY ds.id
        LIMIT 1
        "#,
    )
    .bind(department_id)
    .bind(role)
    .fetch_optional(pool)
    .await?;

    schedule.ok_or_else(|| ApiError::validation("Employee schedule not found"))
}
