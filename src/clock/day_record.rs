//! Owner of the single per-employee-per-day attendance row. Each state
//! transition is a dedicated UPDATE that names every field it touches;
//! fields it does not name are deliberately kept.

use chrono::{NaiveDate, NaiveTime};
use sqlx::MySqlPool;

use crate::error::ApiError;
use crate::model::attendance::{ATTENDANCE_COLUMNS, Attendance, AttendanceStatus};
use crate::model::schedule::ScheduleType;

use super::durations::DayTotals;

pub async fn find_for_day(
    pool: &MySqlPool,
    employee_id: u64,
    date: NaiveDate,
) -> Result<Option<Attendance>, sqlx::Error> {
    let sql = format!(
        "SELECT {ATTENDANCE_COLUMNS} FROM attendance WHERE employee_id = ? AND date = ?"
    );

    sqlx::query_as::<_, Attendance>(&sql)
        .bind(employee_id)
        .bind(date)
        .fetch_optional(pool)
        .await
}

/// First time-in of the day. The callers query-before-insert, and the
/// UNIQUE(employee_id, date) key turns the remaining race between two
/// concurrent time-ins into a rejected duplicate instead of a second row.
pub async fn create_for_day(
    pool: &MySqlPool,
    employee_id: u64,
    date: NaiveDate,
    schedule_type: ScheduleType,
    time_in: NaiveTime,
) -> Result<(), ApiError> {
    let result = sqlx::query(
        r#"
        INSERT INTO attendance (employee_id, date, status, schedule_type, time_in)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(employee_id)
    .bind(date)
    .bind(AttendanceStatus::Ongoing)
    .bind(schedule_type)
    .bind(time_in)
    .execute(pool)
    .await;

    match result {
        Ok(_) => Ok(()),
        Err(e) => {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.code().as_deref() == Some("23000") {
                    return Err(ApiError::conflict("Attendance record already exists for today"));
                }
            }
            Err(e.into())
        }
    }
}

/// Re-entry after a DONE day: status back to ONGOING, clock-out and every
/// derived total cleared.
pub async fn reopen(pool: &MySqlPool, attendance_id: u64) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE attendance
        SET status = ?, time_out = NULL,
            time_total = 0, time_hours_worked = 0, over_time_total = 0
        WHERE id = ?
        "#,
    )
    .bind(AttendanceStatus::Ongoing)
    .bind(attendance_id)
    .execute(pool)
    .await?;

    Ok(())
}

/// Clock-out: record the effective out-time, all derived totals, and mark
/// the day DONE.
pub async fn close(
    pool: &MySqlPool,
    attendance_id: u64,
    time_out: NaiveTime,
    totals: &DayTotals,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE attendance
        SET status = ?, time_out = ?,
            time_total = ?, time_hours_worked = ?, over_time_total = ?
        WHERE id = ?
        "#,
    )
    .bind(AttendanceStatus::Done)
    .bind(time_out)
    .bind(totals.time_total)
    .bind(totals.time_hours_worked)
    .bind(totals.over_time_total)
    .bind(attendance_id)
    .execute(pool)
    .await?;

    Ok(())
}

/// Lunch-in: sets (or re-asserts, when resuming) the lunch-in time and
/// clears the lunch-out side so a later lunch-out recomputes the total.
pub async fn start_lunch(
    pool: &MySqlPool,
    attendance_id: u64,
    lunch_time_in: NaiveTime,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE attendance
        SET status = ?, lunch_time_in = ?, lunch_time_out = NULL, lunch_time_total = 0
        WHERE id = ?
        "#,
    )
    .bind(AttendanceStatus::Break)
    .bind(lunch_time_in)
    .bind(attendance_id)
    .execute(pool)
    .await?;

    Ok(())
}

/// Lunch-out: records the effective lunch-out and total, back to ONGOING.
pub async fn end_lunch(
    pool: &MySqlPool,
    attendance_id: u64,
    lunch_time_out: NaiveTime,
    lunch_time_total: f64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE attendance
        SET status = ?, lunch_time_out = ?, lunch_time_total = ?
        WHERE id = ?
        "#,
    )
    .bind(AttendanceStatus::Ongoing)
    .bind(lunch_time_out)
    .bind(lunch_time_total)
    .bind(attendance_id)
    .execute(pool)
    .await?;

    Ok(())
}

/// Clock events toggle the employee's active flag as a side effect.
pub async fn set_employee_active(
    pool: &MySqlPool,
    employee_id: u64,
    is_active: bool,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE employees SET is_active = ? WHERE id = ?")
        .bind(is_active)
        .bind(employee_id)
        .execute(pool)
        .await?;

    Ok(())
}
