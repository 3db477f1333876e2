use actix_web::{HttpResponse, web};
use chrono::{DateTime, Local, NaiveDateTime};
use serde::Deserialize;
use serde_json::json;
use sqlx::MySqlPool;
use tracing::info;

use crate::clock::day_record;
use crate::clock::durations::{
    self, LunchWindowViolation, check_lunch_window, clamp_lunch_out, effective_time_in,
    lunch_hours,
};
use crate::clock::resolver::resolve_schedule;
use crate::clock::time_of_day::TimeOfDay;
use crate::error::ApiError;
use crate::model::attendance::{ATTENDANCE_COLUMNS, AttendanceStatus};
use crate::model::employee::{EMPLOYEE_COLUMNS, Employee};

/// Body shared by all four clock endpoints.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClockRequest {
    pub employee_id: Option<u64>,
    pub time_stamp: Option<String>,
}

impl ClockRequest {
    /// Validate the two required fields. `what` names the event for the
    /// error message ("time in", "lunch time out", ...).
    fn parts(&self, what: &str) -> Result<(u64, NaiveDateTime), ApiError> {
        let employee_id = self.employee_id.ok_or_else(|| {
            ApiError::validation(format!("Employee ID and {what} are required"))
        })?;
        let raw = self
            .time_stamp
            .as_deref()
            .ok_or_else(|| ApiError::validation(format!("Invalid {what}")))?;

        Ok((employee_id, parse_timestamp(raw, what)?))
    }
}

/// Clock events arrive as RFC 3339 or bare `YYYY-MM-DDTHH:MM:SS`
/// timestamps. The offset, if any, is dropped: the system tracks a single
/// site clock.
fn parse_timestamp(raw: &str, what: &str) -> Result<NaiveDateTime, ApiError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.naive_local())
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f"))
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S"))
        .map_err(|_| ApiError::validation(format!("Invalid {what}")))
}

async fn load_employee(pool: &MySqlPool, employee_id: u64) -> Result<Employee, ApiError> {
    let sql = format!("SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE id = ?");

    sqlx::query_as::<_, Employee>(&sql)
        .bind(employee_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| ApiError::not_found("Employee not found"))
}

/// An employee can only clock against a schedule when both role and
/// department are assigned.
fn assignment(employee: &Employee) -> Result<(&str, u64), ApiError> {
    match (employee.role.as_deref(), employee.department_id) {
        (Some(role), Some(department_id)) if !role.is_empty() => Ok((role, department_id)),
        _ => Err(ApiError::validation(
            "Employee is not assigned to a department",
        )),
    }
}

/// POST /clock/time-in
///
/// NONE -> ONGOING, or reopen of an existing non-BREAK record. Early
/// arrivals on FIXED schedules are clamped forward to the scheduled start.
pub async fn time_in(
    pool: web::Data<MySqlPool>,
    payload: web::Json<ClockRequest>,
) -> Result<HttpResponse, ApiError> {
    let (employee_id, stamp) = payload.parts("time in")?;

    let employee = load_employee(pool.get_ref(), employee_id).await?;
    let (role, department_id) = assignment(&employee)?;
    let schedule = resolve_schedule(pool.get_ref(), role, department_id).await?;

    match day_record::find_for_day(pool.get_ref(), employee_id, stamp.date()).await? {
        Some(record) if record.status == AttendanceStatus::Break => {
            return Err(ApiError::conflict("Time currently on break"));
        }
        Some(record) if record.status.is_leave() => {
            return Err(ApiError::conflict("Attendance already marked as leave"));
        }
        Some(record) => {
            // Same-day re-entry resumes the record instead of erroring.
            day_record::reopen(pool.get_ref(), record.id).await?;
        }
        None => {
            let effective = effective_time_in(TimeOfDay::from(stamp), &schedule);
            day_record::create_for_day(
                pool.get_ref(),
                employee_id,
                stamp.date(),
                schedule.schedule_type,
                effective.as_naive_time(),
            )
            .await?;

            info!(employee_id, time_in = %effective, "time-in recorded");
        }
    }

    day_record::set_employee_active(pool.get_ref(), employee_id, true).await?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Attendance record successfully created"
    })))
}

/// POST /clock/time-out
///
/// ONGOING -> DONE. Overtime and clamping follow the schedule type; the
/// lunch total recorded earlier in the day is deducted from worked hours.
pub async fn time_out(
    pool: web::Data<MySqlPool>,
    payload: web::Json<ClockRequest>,
) -> Result<HttpResponse, ApiError> {
    let (employee_id, stamp) = payload.parts("time out")?;

    let employee = load_employee(pool.get_ref(), employee_id).await?;
    let (role, department_id) = assignment(&employee)?;
    let schedule = resolve_schedule(pool.get_ref(), role, department_id).await?;

    let record = day_record::find_for_day(pool.get_ref(), employee_id, stamp.date())
        .await?
        .ok_or_else(|| ApiError::conflict("Attendance record not found or already clocked out"))?;

    if record.time_out.is_some() {
        return Err(ApiError::conflict("Already clocked out"));
    }
    let time_in = record
        .time_in
        .ok_or_else(|| ApiError::conflict("Time in is required"))?;
    if record.status == AttendanceStatus::Break {
        return Err(ApiError::conflict("Time currently on break"));
    }

    let resolved = durations::resolve_time_out(
        TimeOfDay::from(time_in),
        TimeOfDay::from(stamp),
        record.lunch_time_total,
        &schedule,
    );

    day_record::close(
        pool.get_ref(),
        record.id,
        resolved.effective_time_out.as_naive_time(),
        &resolved.totals,
    )
    .await?;
    day_record::set_employee_active(pool.get_ref(), employee_id, false).await?;

    info!(
        employee_id,
        time_out = %resolved.effective_time_out,
        hours_worked = resolved.totals.time_hours_worked,
        overtime = resolved.totals.over_time_total,
        "time-out recorded"
    );

    Ok(HttpResponse::Ok().json(json!({
        "message": "Attendance updated"
    })))
}

/// POST /clock/lunch-in
///
/// ONGOING -> BREAK. FIXED schedules only accept lunch-in inside the
/// configured window; resuming a break keeps the original lunch-in.
pub async fn lunch_in(
    pool: web::Data<MySqlPool>,
    payload: web::Json<ClockRequest>,
) -> Result<HttpResponse, ApiError> {
    let (employee_id, stamp) = payload.parts("lunch time in")?;

    let employee = load_employee(pool.get_ref(), employee_id).await?;
    let (role, department_id) = assignment(&employee)?;

    let record = day_record::find_for_day(pool.get_ref(), employee_id, stamp.date())
        .await?
        .ok_or_else(|| ApiError::conflict("Attendance record not found"))?;

    if record.time_out.is_some() {
        return Err(ApiError::conflict("Already clocked out"));
    }
    if record.status == AttendanceStatus::Break {
        return Err(ApiError::conflict("Time currently on break"));
    }
    if record.status.is_leave() {
        return Err(ApiError::conflict("Attendance already marked as leave"));
    }

    let schedule = resolve_schedule(pool.get_ref(), role, department_id).await?;

    match check_lunch_window(TimeOfDay::from(stamp), &schedule) {
        Ok(()) => {}
        Err(LunchWindowViolation::TooEarly) => {
            return Err(ApiError::validation("Lunch time in is too early"));
        }
        Err(LunchWindowViolation::TooLate) => {
            return Err(ApiError::validation("Lunch time in is too late"));
        }
    }

    // Resuming an interrupted break keeps the original lunch-in.
    let lunch_time_in = record.lunch_time_in.unwrap_or_else(|| stamp.time());

    day_record::start_lunch(pool.get_ref(), record.id, lunch_time_in).await?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Lunch time in recorded"
    })))
}

/// POST /clock/lunch-out
///
/// BREAK -> ONGOING. On FIXED schedules a late lunch-out is capped at the
/// scheduled lunch end before the total is computed.
pub async fn lunch_out(
    pool: web::Data<MySqlPool>,
    payload: web::Json<ClockRequest>,
) -> Result<HttpResponse, ApiError> {
    let (employee_id, stamp) = payload.parts("lunch time out")?;

    let employee = load_employee(pool.get_ref(), employee_id).await?;
    let (role, department_id) = assignment(&employee)?;

    let record = day_record::find_for_day(pool.get_ref(), employee_id, stamp.date())
        .await?
        .ok_or_else(|| ApiError::conflict("Lunch has not been started"))?;

    let lunch_time_in = record
        .lunch_time_in
        .ok_or_else(|| ApiError::conflict("Lunch has not been started"))?;
    if record.lunch_time_out.is_some() {
        return Err(ApiError::conflict("Lunch has already ended"));
    }
    if record.time_out.is_some() {
        return Err(ApiError::conflict("Already clocked out"));
    }

    let schedule = resolve_schedule(pool.get_ref(), role, department_id).await?;

    let effective = clamp_lunch_out(TimeOfDay::from(stamp), &schedule);
    let total = lunch_hours(TimeOfDay::from(lunch_time_in), effective);

    day_record::end_lunch(pool.get_ref(), record.id, effective.as_naive_time(), total).await?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Lunch time out recorded"
    })))
}

/// GET /clock/today/{employee_id}
pub async fn attendance_today(
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<HttpResponse, ApiError> {
    let employee_id = path.into_inner();

    let employee = load_employee(pool.get_ref(), employee_id).await?;

    let sql = format!(
        "SELECT {ATTENDANCE_COLUMNS} FROM attendance WHERE employee_id = ? AND date = ?"
    );
    let record = sqlx::query_as::<_, crate::model::attendance::Attendance>(&sql)
        .bind(employee.id)
        .bind(Local::now().date_naive())
        .fetch_optional(pool.get_ref())
        .await?
        .ok_or_else(|| ApiError::not_found("Attendance record not found"))?;

    Ok(HttpResponse::Ok().json(record))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rfc3339_and_naive_timestamps() {
        assert!(parse_timestamp("2024-09-15T08:45:00Z", "time in").is_ok());
        assert!(parse_timestamp("2024-09-15T08:45:00+08:00", "time in").is_ok());
        assert!(parse_timestamp("2024-09-15T08:45:00", "time in").is_ok());
        assert!(parse_timestamp("2024-09-15 08:45:00", "time in").is_ok());
    }

    #[test]
    fn rejects_garbage_timestamps() {
        let err = parse_timestamp("next tuesday", "time in").unwrap_err();
        assert!(matches!(err, ApiError::Validation(msg) if msg == "Invalid time in"));
    }

    #[test]
    fn request_requires_both_fields() {
        let no_id = ClockRequest {
            employee_id: None,
            time_stamp: Some("2024-09-15T08:45:00".into()),
        };
        assert!(matches!(
            no_id.parts("time in"),
            Err(ApiError::Validation(_))
        ));

        let no_stamp = ClockRequest {
            employee_id: Some(1),
            time_stamp: None,
        };
        assert!(matches!(
            no_stamp.parts("lunch time out"),
            Err(ApiError::Validation(msg)) if msg == "Invalid lunch time out"
        ));
    }

    #[test]
    fn offset_is_dropped_from_rfc3339() {
        let parsed = parse_timestamp("2024-09-15T08:45:00+08:00", "time in").unwrap();
        assert_eq!(TimeOfDay::from(parsed), TimeOfDay::new(8, 45).unwrap());
    }
}
