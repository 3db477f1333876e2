use actix_web::{HttpResponse, web};
use chrono::{NaiveDateTime, NaiveTime};
use serde::Deserialize;
use serde_json::json;
use sqlx::MySqlPool;
use tracing::info;

use crate::auth::auth::AuthUser;
use crate::clock::time_of_day::TimeOfDay;
use crate::error::ApiError;
use crate::model::department_schedule::{
    DETAIL_COLUMNS, DepartmentSchedule, DepartmentScheduleDetail,
};
use crate::model::employee::normalize_role;
use crate::model::schedule::{Schedule, ScheduleType};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListFilter {
    pub department_id: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDepartmentSchedule {
    pub department_id: u64,
    pub role: String,
    pub name: String,
    pub schedule_type: ScheduleType,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub lunch_start_time: NaiveDateTime,
    pub lunch_end_time: NaiveDateTime,
    pub limit_work_hours_day: Option<f64>,
    pub allowed_overtime: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDepartmentSchedule {
    pub role: Option<String>,
    pub name: Option<String>,
    pub schedule_type: Option<ScheduleType>,
    pub start_time: Option<NaiveDateTime>,
    pub end_time: Option<NaiveDateTime>,
    pub lunch_start_time: Option<NaiveDateTime>,
    pub lunch_end_time: Option<NaiveDateTime>,
    pub limit_work_hours_day: Option<f64>,
    pub allowed_overtime: Option<bool>,
}

/// Windows crossing midnight are unsupported; rejecting them here keeps
/// every time-of-day comparison downstream well defined.
fn validate_windows(
    start: NaiveTime,
    end: NaiveTime,
    lunch_start: NaiveTime,
    lunch_end: NaiveTime,
) -> Result<(), ApiError> {
    if TimeOfDay::from(start) >= TimeOfDay::from(end) {
        return Err(ApiError::validation("Start time must be before end time"));
    }
    if TimeOfDay::from(lunch_start) > TimeOfDay::from(lunch_end) {
        return Err(ApiError::validation(
            "Lunch start time must not be after lunch end time",
        ));
    }
    Ok(())
}

/// GET /department-schedule
pub async fn list_department_schedules(
    pool: web::Data<MySqlPool>,
    query: web::Query<ListFilter>,
) -> Result<HttpResponse, ApiError> {
    let mut sql = format!(
        "SELECT {DETAIL_COLUMNS} FROM department_schedules ds \
         JOIN schedules s ON s.id = ds.schedule_id"
    );
    if query.department_id.is_some() {
        sql.push_str(" WHERE ds.department_id = ?");
    }
    sql.push_str(" ORDER BY ds.id ASC");

    let mut q = sqlx::query_as::<_, DepartmentScheduleDetail>(&sql);
    if let Some(department_id) = query.department_id {
        q = q.bind(department_id);
    }

    let schedules = q.fetch_all(pool.get_ref()).await?;

    Ok(HttpResponse::Ok().json(schedules))
}

/// GET /department-schedule/{id}
pub async fn get_department_schedule(
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<HttpResponse, ApiError> {
    let department_schedule_id = path.into_inner();

    let sql = format!(
        "SELECT {DETAIL_COLUMNS} FROM department_schedules ds \
         JOIN schedules s ON s.id = ds.schedule_id WHERE ds.id = ?"
    );
    let detail = sqlx::query_as::<_, DepartmentScheduleDetail>(&sql)
        .bind(department_schedule_id)
        .fetch_optional(pool.get_ref())
        .await?
        .ok_or_else(|| ApiError::not_found("Department schedule not found"))?;

    Ok(HttpResponse::Ok().json(detail))
}

/// POST /department-schedule
pub async fn create_department_schedule(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateDepartmentSchedule>,
) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;

    let role = normalize_role(&payload.role);
    if role.is_empty() || payload.name.trim().is_empty() {
        return Err(ApiError::validation("Role and schedule name are required"));
    }

    let start_time = payload.start_time.time();
    let end_time = payload.end_time.time();
    let lunch_start_time = payload.lunch_start_time.time();
    let lunch_end_time = payload.lunch_end_time.time();
    validate_windows(start_time, end_time, lunch_start_time, lunch_end_time)?;

    let exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM departments WHERE id = ?)",
    )
    .bind(payload.department_id)
    .fetch_one(pool.get_ref())
    .await?;

    if !exists {
        return Err(ApiError::not_found("Department not found"));
    }

    let schedule = sqlx::query(
        r#"
        INSERT INTO schedules
            (schedule_type, start_time, end_time, lunch_start_time, lunch_end_time,
             limit_work_hours_day, allowed_overtime)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(payload.schedule_type)
    .bind(start_time)
    .bind(end_time)
    .bind(lunch_start_time)
    .bind(lunch_end_time)
    .bind(payload.limit_work_hours_day)
    .bind(payload.allowed_overtime.unwrap_or(false))
    .execute(pool.get_ref())
    .await?;

    let schedule_id = schedule.last_insert_id();

    let join = sqlx::query(
        "INSERT INTO department_schedules (name, role, department_id, schedule_id) \
         VALUES (?, ?, ?, ?)",
    )
    .bind(payload.name.trim())
    .bind(&role)
    .bind(payload.department_id)
    .bind(schedule_id)
    .execute(pool.get_ref())
    .await?;

    info!(
        department_id = payload.department_id,
        role = %role,
        schedule_id,
        "department schedule created"
    );

    Ok(HttpResponse::Created().json(json!({
        "id": join.last_insert_id(),
        "scheduleId": schedule_id,
        "message": "Department schedule created successfully"
    })))
}

/// PUT /department-schedule/{id}
pub async fn update_department_schedule(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<UpdateDepartmentSchedule>,
) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;

    let department_schedule_id = path.into_inner();

    let join = sqlx::query_as::<_, DepartmentSchedule>(
        "SELECT id, name, role, department_id, schedule_id \
         FROM department_schedules WHERE id = ?",
    )
    .bind(department_schedule_id)
    .fetch_optional(pool.get_ref())
    .await?
    .ok_or_else(|| ApiError::not_found("Department schedule not found"))?;

    let schedule = sqlx::query_as::<_, Schedule>(
        "SELECT id, schedule_type, start_time, end_time, lunch_start_time, lunch_end_time, \
         limit_work_hours_day, allowed_overtime FROM schedules WHERE id = ?",
    )
    .bind(join.schedule_id)
    .fetch_optional(pool.get_ref())
    .await?
    .ok_or_else(|| ApiError::not_found("Schedule not found"))?;

    let role = payload
        .role
        .as_deref()
        .map(normalize_role)
        .unwrap_or(join.role);
    let name = payload.name.clone().unwrap_or(join.name);
    let schedule_type = payload.schedule_type.unwrap_or(schedule.schedule_type);
    let start_time = payload
        .start_time
        .map(|dt| dt.time())
        .unwrap_or(schedule.start_time);
    let end_time = payload
        .end_time
        .map(|dt| dt.time())
        .unwrap_or(schedule.end_time);
    let lunch_start_time = payload
        .lunch_start_time
        .map(|dt| dt.time())
        .unwrap_or(schedule.lunch_start_time);
    let lunch_end_time = payload
        .lunch_end_time
        .map(|dt| dt.time())
        .unwrap_or(schedule.lunch_end_time);
    let limit_work_hours_day = payload.limit_work_hours_day.or(schedule.limit_work_hours_day);
    let allowed_overtime = payload.allowed_overtime.unwrap_or(schedule.allowed_overtime);

    validate_windows(start_time, end_time, lunch_start_time, lunch_end_time)?;

    let mut tx = pool.get_ref().begin().await?;

    sqlx::query(
        r#"
        UPDATE schedules
        SET schedule_type = ?, start_time = ?, end_time = ?,
            lunch_start_time = ?, lunch_end_time = ?,
            limit_work_hours_day = ?, allowed_overtime = ?
        WHERE id = ?
        "#,
    )
    .bind(schedule_type)
    .bind(start_time)
    .bind(end_time)
    .bind(lunch_start_time)
    .bind(lunch_end_time)
    .bind(limit_work_hours_day)
    .bind(allowed_overtime)
    .bind(schedule.id)
    .execute(&mut *tx)
    .await?;

    sqlx::query("UPDATE department_schedules SET name = ?, role = ? WHERE id = ?")
        .bind(&name)
        .bind(&role)
        .bind(join.id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Schedule updated successfully"
    })))
}

/// DELETE /department-schedule/{id}
pub async fn delete_department_schedule(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;

    let department_schedule_id = path.into_inner();

    let join = sqlx::query_as::<_, DepartmentSchedule>(
        "SELECT id, name, role, department_id, schedule_id \
         FROM department_schedules WHERE id = ?",
    )
    .bind(department_schedule_id)
    .fetch_optional(pool.get_ref())
    .await?
    .ok_or_else(|| ApiError::not_found("Department schedule not found"))?;

    let mut tx = pool.get_ref().begin().await?;

    sqlx::query("DELETE FROM department_schedules WHERE id = ?")
        .bind(join.id)
        .execute(&mut *tx)
        .await?;

    sqlx::query("DELETE FROM schedules WHERE id = ?")
        .bind(join.schedule_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Department schedule removed successfully"
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nt(hour: u32, minute: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(hour, minute, 0).unwrap()
    }

    #[test]
    fn rejects_inverted_work_window() {
        assert!(validate_windows(nt(17, 0), nt(9, 0), nt(12, 0), nt(13, 0)).is_err());
        assert!(validate_windows(nt(9, 0), nt(9, 0), nt(12, 0), nt(13, 0)).is_err());
    }

    #[test]
    fn rejects_inverted_lunch_window() {
        assert!(validate_windows(nt(9, 0), nt(17, 0), nt(13, 0), nt(12, 0)).is_err());
    }

    #[test]
    fn accepts_ordinary_windows() {
        assert!(validate_windows(nt(9, 0), nt(17, 0), nt(12, 0), nt(13, 0)).is_ok());
    }
}
