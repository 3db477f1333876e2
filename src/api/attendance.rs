use std::str::FromStr;

use actix_web::{HttpResponse, web};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::MySqlPool;
use tracing::info;

use crate::auth::auth::AuthUser;
use crate::clock::time_of_day::TimeOfDay;
use crate::error::ApiError;
use crate::model::attendance::{ATTENDANCE_COLUMNS, Attendance, AttendanceStatus};
use crate::model::schedule::ScheduleType;

/// Attendance row joined with the owning employee's display fields.
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct AttendanceWithEmployee {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub attendance: Attendance,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
}

const JOINED_COLUMNS: &str = "a.id, a.employee_id, a.date, a.status, a.schedule_type, a.time_in, \
     a.time_out, a.lunch_time_in, a.lunch_time_out, a.time_total, a.time_hours_worked, \
     a.over_time_total, a.lunch_time_total, e.username, e.first_name, e.last_name";

#[derive(Debug, Deserialize)]
pub struct AttendanceFilter {
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAttendance {
    pub employee_id: u64,
    pub date: NaiveDate,
    pub status: AttendanceStatus,
    pub schedule_type: ScheduleType,
    pub time_in: Option<NaiveDateTime>,
    pub time_out: Option<NaiveDateTime>,
    pub lunch_time_in: Option<NaiveDateTime>,
    pub lunch_time_out: Option<NaiveDateTime>,
    pub over_time_total: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAttendance {
    pub date: Option<NaiveDate>,
    pub status: Option<AttendanceStatus>,
    pub schedule_type: Option<ScheduleType>,
    pub time_in: Option<NaiveDateTime>,
    pub time_out: Option<NaiveDateTime>,
    pub lunch_time_in: Option<NaiveDateTime>,
    pub lunch_time_out: Option<NaiveDateTime>,
    pub over_time_total: Option<f64>,
}

/// Totals derived from a complete in/out pair; zeros while the day is
/// still open. Lunch is only deducted once both lunch events exist.
fn derive_totals(
    time_in: Option<NaiveTime>,
    time_out: Option<NaiveTime>,
    lunch_time_in: Option<NaiveTime>,
    lunch_time_out: Option<NaiveTime>,
) -> (f64, f64, f64) {
    let (Some(time_in), Some(time_out)) = (time_in, time_out) else {
        return (0.0, 0.0, 0.0);
    };

    let lunch_total = match (lunch_time_in, lunch_time_out) {
        (Some(lin), Some(lout)) => {
            crate::clock::durations::lunch_hours(TimeOfDay::from(lin), TimeOfDay::from(lout))
        }
        _ => 0.0,
    };

    let minutes = TimeOfDay::from(time_out).minutes_since(TimeOfDay::from(time_in));
    let time_total = if minutes < 0 { 0.0 } else { minutes as f64 / 60.0 };
    let hours_worked = (time_total - lunch_total).max(0.0);

    (time_total, hours_worked, lunch_total)
}

/// GET /attendance
pub async fn list_attendance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<AttendanceFilter>,
) -> Result<HttpResponse, ApiError> {
    auth.require_leader_or_admin()?;

    let status = query
        .status
        .as_deref()
        .map(|raw| {
            AttendanceStatus::from_str(raw)
                .map_err(|_| ApiError::validation("Invalid attendance status"))
        })
        .transpose()?;

    let mut sql = format!(
        "SELECT {JOINED_COLUMNS} FROM attendance a JOIN employees e ON e.id = a.employee_id"
    );
    if status.is_some() {
        sql.push_str(" WHERE a.status = ?");
    }
    sql.push_str(" ORDER BY a.date ASC, a.id ASC");

    let mut q = sqlx::query_as::<_, AttendanceWithEmployee>(&sql);
    if let Some(status) = status {
        q = q.bind(status);
    }

    let rows = q.fetch_all(pool.get_ref()).await?;

    if rows.is_empty() {
        return Err(ApiError::not_found("No attendance found"));
    }

    Ok(HttpResponse::Ok().json(rows))
}

/// GET /attendance/{id}
pub async fn get_attendance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<HttpResponse, ApiError> {
    auth.require_leader_or_admin()?;

    let attendance_id = path.into_inner();

    let sql = format!(
        "SELECT {JOINED_COLUMNS} FROM attendance a JOIN employees e ON e.id = a.employee_id \
         WHERE a.id = ?"
    );
    let row = sqlx::query_as::<_, AttendanceWithEmployee>(&sql)
        .bind(attendance_id)
        .fetch_optional(pool.get_ref())
        .await?
        .ok_or_else(|| ApiError::not_found("Attendance not found"))?;

    Ok(HttpResponse::Ok().json(row))
}

/// GET /attendance/employee/{id}
pub async fn list_attendance_by_employee(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<HttpResponse, ApiError> {
    auth.require_leader_or_admin()?;

    let employee_id = path.into_inner();

    let exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM employees WHERE id = ?)",
    )
    .bind(employee_id)
    .fetch_one(pool.get_ref())
    .await?;

    if !exists {
        return Err(ApiError::not_found("Employee not found"));
    }

    let sql = format!(
        "SELECT {ATTENDANCE_COLUMNS} FROM attendance WHERE employee_id = ? ORDER BY date ASC"
    );
    let rows = sqlx::query_as::<_, Attendance>(&sql)
        .bind(employee_id)
        .fetch_all(pool.get_ref())
        .await?;

    if rows.is_empty() {
        return Err(ApiError::not_found(
            "No attendance records found for this employee",
        ));
    }

    Ok(HttpResponse::Ok().json(rows))
}

/// POST /attendance
pub async fn create_attendance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateAttendance>,
) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;

    let exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM employees WHERE id = ?)",
    )
    .bind(payload.employee_id)
    .fetch_one(pool.get_ref())
    .await?;

    if !exists {
        return Err(ApiError::not_found("Employee not found"));
    }

    let duplicate = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM attendance WHERE employee_id = ? AND date = ?)",
    )
    .bind(payload.employee_id)
    .bind(payload.date)
    .fetch_one(pool.get_ref())
    .await?;

    if duplicate {
        return Err(ApiError::conflict("Attendance that day record already exists"));
    }

    let time_in = payload.time_in.map(|dt| dt.time());
    let time_out = payload.time_out.map(|dt| dt.time());
    let lunch_time_in = payload.lunch_time_in.map(|dt| dt.time());
    let lunch_time_out = payload.lunch_time_out.map(|dt| dt.time());

    let (time_total, hours_worked, lunch_total) =
        derive_totals(time_in, time_out, lunch_time_in, lunch_time_out);

    sqlx::query(
        r#"
        INSERT INTO attendance
            (employee_id, date, status, schedule_type, time_in, time_out,
             lunch_time_in, lunch_time_out, time_total, time_hours_worked,
             over_time_total, lunch_time_total)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(payload.employee_id)
    .bind(payload.date)
    .bind(payload.status)
    .bind(payload.schedule_type)
    .bind(time_in)
    .bind(time_out)
    .bind(lunch_time_in)
    .bind(lunch_time_out)
    .bind(time_total)
    .bind(hours_worked)
    .bind(payload.over_time_total.unwrap_or(0.0))
    .bind(lunch_total)
    .execute(pool.get_ref())
    .await?;

    info!(employee_id = payload.employee_id, date = %payload.date, "attendance record created");

    Ok(HttpResponse::Created().json(json!({
        "message": "Attendance record created successfully"
    })))
}

/// PUT /attendance/{id}
///
/// Administrative fix-up: each payload field either replaces the stored
/// value or keeps it, decided per field; totals are recomputed from the
/// merged clock times.
pub async fn update_attendance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<UpdateAttendance>,
) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;

    let attendance_id = path.into_inner();

    let sql = format!("SELECT {ATTENDANCE_COLUMNS} FROM attendance WHERE id = ?");
    let existing = sqlx::query_as::<_, Attendance>(&sql)
        .bind(attendance_id)
        .fetch_optional(pool.get_ref())
        .await?
        .ok_or_else(|| ApiError::not_found("Attendance record not found"))?;

    let date = payload.date.unwrap_or(existing.date);
    let status = payload.status.unwrap_or(existing.status);
    let schedule_type = payload.schedule_type.unwrap_or(existing.schedule_type);
    let time_in = payload.time_in.map(|dt| dt.time()).or(existing.time_in);
    let time_out = payload.time_out.map(|dt| dt.time()).or(existing.time_out);
    let lunch_time_in = payload
        .lunch_time_in
        .map(|dt| dt.time())
        .or(existing.lunch_time_in);
    let lunch_time_out = payload
        .lunch_time_out
        .map(|dt| dt.time())
        .or(existing.lunch_time_out);
    let over_time_total = payload.over_time_total.unwrap_or(existing.over_time_total);

    let (time_total, hours_worked, lunch_total) =
        derive_totals(time_in, time_out, lunch_time_in, lunch_time_out);

    sqlx::query(
        r#"
        UPDATE attendance
        SET date = ?, status = ?, schedule_type = ?, time_in = ?, time_out = ?,
            lunch_time_in = ?, lunch_time_out = ?, time_total = ?,
            time_hours_worked = ?, over_time_total = ?, lunch_time_total = ?
        WHERE id = ?
        "#,
    )
    .bind(date)
    .bind(status)
    .bind(schedule_type)
    .bind(time_in)
    .bind(time_out)
    .bind(lunch_time_in)
    .bind(lunch_time_out)
    .bind(time_total)
    .bind(hours_worked)
    .bind(over_time_total)
    .bind(lunch_total)
    .bind(attendance_id)
    .execute(pool.get_ref())
    .await?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Attendance record updated successfully"
    })))
}

/// DELETE /attendance/{id}
pub async fn delete_attendance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;

    let attendance_id = path.into_inner();

    let result = sqlx::query("DELETE FROM attendance WHERE id = ?")
        .bind(attendance_id)
        .execute(pool.get_ref())
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Attendance record not found"));
    }

    Ok(HttpResponse::Ok().json(json!({
        "message": "Attendance record deleted successfully"
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nt(hour: u32, minute: u32) -> Option<NaiveTime> {
        NaiveTime::from_hms_opt(hour, minute, 0)
    }

    #[test]
    fn totals_need_a_complete_day() {
        assert_eq!(derive_totals(nt(8, 0), None, None, None), (0.0, 0.0, 0.0));
        assert_eq!(derive_totals(None, nt(17, 0), None, None), (0.0, 0.0, 0.0));
    }

    #[test]
    fn totals_deduct_lunch_when_present() {
        let (total, worked, lunch) = derive_totals(nt(8, 0), nt(18, 0), nt(12, 0), nt(13, 0));
        assert_eq!(total, 10.0);
        assert_eq!(lunch, 1.0);
        assert_eq!(worked, 9.0);

        let (total, worked, lunch) = derive_totals(nt(8, 0), nt(16, 0), None, None);
        assert_eq!((total, worked, lunch), (8.0, 8.0, 0.0));
    }

    #[test]
    fn totals_never_go_negative() {
        let (total, worked, _) = derive_totals(nt(17, 0), nt(9, 0), None, None);
        assert_eq!((total, worked), (0.0, 0.0));
    }
}
