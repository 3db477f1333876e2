use actix_web::{HttpResponse, web};
use chrono::Local;
use serde::Deserialize;
use serde_json::json;
use sqlx::MySqlPool;
use tracing::info;

use crate::auth::auth::AuthUser;
use crate::error::ApiError;
use crate::model::attendance::Attendance;
use crate::model::department::Department;
use crate::model::department_schedule::{DETAIL_COLUMNS, DepartmentScheduleDetail};
use crate::model::employee::{
    AccessLevel, EMPLOYEE_SUMMARY_COLUMNS, EmployeeSummary, normalize_role,
};

const DEPARTMENT_COLUMNS: &str = "id, name, description, leader_id";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDepartment {
    pub name: String,
    pub description: Option<String>,
    pub leader_id: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDepartment {
    pub name: Option<String>,
    pub description: Option<String>,
    pub leader_id: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignEmployee {
    pub username: String,
    pub role: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveEmployee {
    pub employee_id: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignLeader {
    pub leader_id: u64,
}

async fn load_department(pool: &MySqlPool, department_id: u64) -> Result<Department, ApiError> {
    let sql = format!("SELECT {DEPARTMENT_COLUMNS} FROM departments WHERE id = ?");

    sqlx::query_as::<_, Department>(&sql)
        .bind(department_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| ApiError::not_found("Department not found"))
}

/// GET /department
pub async fn list_departments(pool: web::Data<MySqlPool>) -> Result<HttpResponse, ApiError> {
    let sql = format!("SELECT {DEPARTMENT_COLUMNS} FROM departments ORDER BY id ASC");
    let departments = sqlx::query_as::<_, Department>(&sql)
        .fetch_all(pool.get_ref())
        .await?;

    if departments.is_empty() {
        return Err(ApiError::not_found("No departments found"));
    }

    Ok(HttpResponse::Ok().json(departments))
}

/// GET /department/{id}
pub async fn get_department(
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<HttpResponse, ApiError> {
    let department = load_department(pool.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(department))
}

/// GET /department/{id}/employees
pub async fn get_department_employees(
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<HttpResponse, ApiError> {
    let department = load_department(pool.get_ref(), path.into_inner()).await?;

    let sql = format!(
        "SELECT {EMPLOYEE_SUMMARY_COLUMNS} FROM employees WHERE department_id = ? ORDER BY id ASC"
    );
    let employees = sqlx::query_as::<_, EmployeeSummary>(&sql)
        .bind(department.id)
        .fetch_all(pool.get_ref())
        .await?;

    Ok(HttpResponse::Ok().json(employees))
}

/// GET /department/{id}/leader
pub async fn get_department_leader(
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<HttpResponse, ApiError> {
    let department = load_department(pool.get_ref(), path.into_inner()).await?;

    let leader_id = department
        .leader_id
        .ok_or_else(|| ApiError::not_found("Department has no leader"))?;

    let sql = format!("SELECT {EMPLOYEE_SUMMARY_COLUMNS} FROM employees WHERE id = ?");
    let leader = sqlx::query_as::<_, EmployeeSummary>(&sql)
        .bind(leader_id)
        .fetch_optional(pool.get_ref())
        .await?
        .ok_or_else(|| ApiError::not_found("Leader not found"))?;

    Ok(HttpResponse::Ok().json(leader))
}

/// POST /department
pub async fn create_department(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateDepartment>,
) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;

    if payload.name.trim().is_empty() {
        return Err(ApiError::validation("Department name is required"));
    }

    if let Some(leader_id) = payload.leader_id {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM employees WHERE id = ?)",
        )
        .bind(leader_id)
        .fetch_one(pool.get_ref())
        .await?;

        if !exists {
            return Err(ApiError::not_found("Leader not found"));
        }
    }

    sqlx::query("INSERT INTO departments (name, description, leader_id) VALUES (?, ?, ?)")
        .bind(payload.name.trim())
        .bind(&payload.description)
        .bind(payload.leader_id)
        .execute(pool.get_ref())
        .await?;

    info!(name = %payload.name, "department created");

    Ok(HttpResponse::Created().json(json!({
        "message": "Department created successfully"
    })))
}

/// PUT /department/{id}
pub async fn update_department(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<UpdateDepartment>,
) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;

    let existing = load_department(pool.get_ref(), path.into_inner()).await?;

    if let Some(leader_id) = payload.leader_id {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM employees WHERE id = ?)",
        )
        .bind(leader_id)
        .fetch_one(pool.get_ref())
        .await?;

        if !exists {
            return Err(ApiError::not_found("Leader not found"));
        }
    }

    let name = payload.name.clone().unwrap_or(existing.name);
    let description = payload.description.clone().or(existing.description);
    let leader_id = payload.leader_id.or(existing.leader_id);

    sqlx::query("UPDATE departments SET name = ?, description = ?, leader_id = ? WHERE id = ?")
        .bind(&name)
        .bind(&description)
        .bind(leader_id)
        .bind(existing.id)
        .execute(pool.get_ref())
        .await?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Department updated successfully"
    })))
}

/// DELETE /department/{id}
///
/// Removes the department's schedules, their join rows, and the department
/// itself in a single transaction; the only multi-statement transaction in
/// the system.
pub async fn delete_department(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;

    let department = load_department(pool.get_ref(), path.into_inner()).await?;

    let mut tx = pool.get_ref().begin().await?;

    sqlx::query(
        "DELETE FROM schedules WHERE id IN \
         (SELECT schedule_id FROM department_schedules WHERE department_id = ?)",
    )
    .bind(department.id)
    .execute(&mut *tx)
    .await?;

    sqlx::query("DELETE FROM department_schedules WHERE department_id = ?")
        .bind(department.id)
        .execute(&mut *tx)
        .await?;

    sqlx::query("DELETE FROM departments WHERE id = ?")
        .bind(department.id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    info!(department_id = department.id, "department deleted");

    Ok(HttpResponse::Ok().json(json!({
        "message": "Department deleted successfully"
    })))
}

/// GET /department/{id}/schedules
pub async fn get_department_schedules(
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<HttpResponse, ApiError> {
    let department = load_department(pool.get_ref(), path.into_inner()).await?;

    let sql = format!(
        "SELECT {DETAIL_COLUMNS} FROM department_schedules ds \
         JOIN schedules s ON s.id = ds.schedule_id \
         WHERE ds.department_id = ? ORDER BY s.start_time ASC"
    );
    let schedules = sqlx::query_as::<_, DepartmentScheduleDetail>(&sql)
        .bind(department.id)
        .fetch_all(pool.get_ref())
        .await?;

    Ok(HttpResponse::Ok().json(schedules))
}

async fn department_attendance(
    pool: &MySqlPool,
    department_id: u64,
    today_only: bool,
) -> Result<Vec<Attendance>, ApiError> {
    let members = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM employees WHERE department_id = ?",
    )
    .bind(department_id)
    .fetch_one(pool)
    .await?;

    if members == 0 {
        return Err(ApiError::not_found("No employees found in this department"));
    }

    let mut sql = String::from(
        "SELECT a.id, a.employee_id, a.date, a.status, a.schedule_type, a.time_in, a.time_out, \
         a.lunch_time_in, a.lunch_time_out, a.time_total, a.time_hours_worked, \
         a.over_time_total, a.lunch_time_total \
         FROM attendance a JOIN employees e ON e.id = a.employee_id \
         WHERE e.department_id = ?",
    );
    if today_only {
        sql.push_str(" AND a.date = ?");
    }
    sql.push_str(" ORDER BY a.date DESC, a.id DESC");

    let mut q = sqlx::query_as::<_, Attendance>(&sql).bind(department_id);
    if today_only {
        q = q.bind(Local::now().date_naive());
    }

    Ok(q.fetch_all(pool).await?)
}

/// GET /department/{id}/attendance
pub async fn get_department_attendance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<HttpResponse, ApiError> {
    auth.require_leader_or_admin()?;

    let rows = department_attendance(pool.get_ref(), path.into_inner(), false).await?;
    Ok(HttpResponse::Ok().json(rows))
}

/// GET /department/{id}/attendance/today
pub async fn get_department_attendance_today(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<HttpResponse, ApiError> {
    auth.require_leader_or_admin()?;

    let rows = department_attendance(pool.get_ref(), path.into_inner(), true).await?;
    Ok(HttpResponse::Ok().json(rows))
}

/// PUT /department/{id}/employee
///
/// Assign an employee into the department under a (normalized) role.
pub async fn assign_employee(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<AssignEmployee>,
) -> Result<HttpResponse, ApiError> {
    auth.require_leader_or_admin()?;

    let department = load_department(pool.get_ref(), path.into_inner()).await?;

    let role = normalize_role(&payload.role);
    if role.is_empty() {
        return Err(ApiError::validation("Role is required"));
    }

    let employee_id = sqlx::query_scalar::<_, u64>("SELECT id FROM employees WHERE username = ?")
        .bind(&payload.username)
        .fetch_optional(pool.get_ref())
        .await?
        .ok_or_else(|| ApiError::not_found("Employee not found"))?;

    sqlx::query("UPDATE employees SET role = ?, department_id = ? WHERE id = ?")
        .bind(&role)
        .bind(department.id)
        .bind(employee_id)
        .execute(pool.get_ref())
        .await?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Employee assigned to department successfully"
    })))
}

/// PUT /department/{id}/employee/remove
///
/// Clears both role and department — an explicit clear, not a merge.
pub async fn remove_employee(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<RemoveEmployee>,
) -> Result<HttpResponse, ApiError> {
    auth.require_leader_or_admin()?;

    if auth.employee_id == payload.employee_id {
        return Err(ApiError::validation(
            "You can't remove yourself from department",
        ));
    }

    let department = load_department(pool.get_ref(), path.into_inner()).await?;

    let exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM employees WHERE id = ? AND department_id = ?)",
    )
    .bind(payload.employee_id)
    .bind(department.id)
    .fetch_one(pool.get_ref())
    .await?;

    if !exists {
        return Err(ApiError::not_found("Employee not found"));
    }

    sqlx::query("UPDATE employees SET role = NULL, department_id = NULL WHERE id = ?")
        .bind(payload.employee_id)
        .execute(pool.get_ref())
        .await?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Employee removed from department successfully"
    })))
}

/// PUT /department/{id}/leader
pub async fn assign_leader(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<AssignLeader>,
) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;

    let department = load_department(pool.get_ref(), path.into_inner()).await?;

    let sql = format!("SELECT {EMPLOYEE_SUMMARY_COLUMNS} FROM employees WHERE id = ?");
    let leader = sqlx::query_as::<_, EmployeeSummary>(&sql)
        .bind(payload.leader_id)
        .fetch_optional(pool.get_ref())
        .await?
        .ok_or_else(|| ApiError::validation("Employee is not an admin or team leader"))?;

    if leader.access_level == AccessLevel::Employee {
        return Err(ApiError::validation(
            "Employee is not an admin or team leader",
        ));
    }

    sqlx::query("UPDATE departments SET leader_id = ? WHERE id = ?")
        .bind(leader.id)
        .bind(department.id)
        .execute(pool.get_ref())
        .await?;

    // A leader is also a member of the department they lead.
    sqlx::query("UPDATE employees SET role = 'TEAM LEADER', department_id = ? WHERE id = ?")
        .bind(department.id)
        .bind(leader.id)
        .execute(pool.get_ref())
        .await?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Leader assigned to department successfully"
    })))
}

/// PUT /department/{id}/leader/remove
pub async fn remove_leader(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;

    let department = load_department(pool.get_ref(), path.into_inner()).await?;

    let leader_id = department
        .leader_id
        .ok_or_else(|| ApiError::not_found("Leader not found"))?;

    sqlx::query("UPDATE employees SET role = NULL, department_id = NULL WHERE id = ?")
        .bind(leader_id)
        .execute(pool.get_ref())
        .await?;

    sqlx::query("UPDATE departments SET leader_id = NULL WHERE id = ?")
        .bind(department.id)
        .execute(pool.get_ref())
        .await?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Leader removed from department successfully"
    })))
}
