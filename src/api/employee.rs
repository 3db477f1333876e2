use actix_web::{HttpResponse, web};
use serde::Deserialize;
use serde_json::json;
use sqlx::MySqlPool;
use tracing::{error, info};

use crate::auth::auth::AuthUser;
use crate::auth::password::hash_password;
use crate::error::ApiError;
use crate::model::employee::{
    AccessLevel, EMPLOYEE_SUMMARY_COLUMNS, EmployeeSummary, normalize_role,
};
use crate::utils::{username_cache, username_filter};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEmployee {
    pub username: String,
    pub password_credentials: String,
    pub first_name: String,
    pub last_name: String,
    pub middle_name: Option<String>,
    pub access_level: AccessLevel,
    pub is_active: Option<bool>,
    pub role: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEmployee {
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub middle_name: Option<String>,
    pub access_level: Option<AccessLevel>,
    pub is_active: Option<bool>,
    pub department_id: Option<u64>,
    pub role: Option<String>,
}

/// true  => username AVAILABLE
/// false => username TAKEN
///
/// Cuckoo filter first (fast negative), then the moka cache (fast
/// positive), then the database.
pub async fn is_username_available(username: &str, pool: &MySqlPool) -> bool {
    let username = username.to_lowercase();

    if !username_filter::might_exist(&username) {
        return true;
    }

    if username_cache::is_taken(&username).await {
        return false;
    }

    sqlx::query_scalar::<_, bool>(
        "SELECT NOT EXISTS(SELECT 1 FROM employees WHERE username = ? LIMIT 1)",
    )
    .bind(&username)
    .fetch_one(pool)
    .await
    .unwrap_or(false) // fail-safe: treat lookup failure as taken
}

/// POST /employee
pub async fn create_employee(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateEmployee>,
) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;

    let username = payload.username.trim();
    if username.is_empty() || payload.password_credentials.is_empty() {
        return Err(ApiError::validation(
            "Username and password must not be empty",
        ));
    }

    if !is_username_available(username, pool.get_ref()).await {
        return Err(ApiError::validation("Username already exists"));
    }

    let hashed = hash_password(&payload.password_credentials);
    let role = payload.role.as_deref().map(normalize_role);

    let result = sqlx::query(
        r#"
        INSERT INTO employees
            (username, password, first_name, last_name, middle_name,
             access_level, is_active, role)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(username)
    .bind(&hashed)
    .bind(&payload.first_name)
    .bind(&payload.last_name)
    .bind(&payload.middle_name)
    .bind(payload.access_level)
    .bind(payload.is_active.unwrap_or(false))
    .bind(&role)
    .execute(pool.get_ref())
    .await;

    match result {
        Ok(_) => {
            username_filter::insert(username);
            username_cache::mark_taken(username).await;

            info!(username, "employee created");
            Ok(HttpResponse::Created().json(json!({
                "message": "Employee created successfully"
            })))
        }
        Err(e) => {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.code().as_deref() == Some("23000") {
                    return Err(ApiError::validation("Username already exists"));
                }
            }

            error!(error = %e, "Failed to create employee");
            Err(e.into())
        }
    }
}

async fn list_by_level(
    pool: &MySqlPool,
    access_level: Option<AccessLevel>,
) -> Result<Vec<EmployeeSummary>, ApiError> {
    let mut sql = format!("SELECT {EMPLOYEE_SUMMARY_COLUMNS} FROM employees");
    if access_level.is_some() {
        sql.push_str(" WHERE access_level = ?");
    }
    sql.push_str(" ORDER BY id DESC");

    let mut q = sqlx::query_as::<_, EmployeeSummary>(&sql);
    if let Some(level) = access_level {
        q = q.bind(level);
    }

    Ok(q.fetch_all(pool).await?)
}

/// GET /employee
pub async fn list_employees(pool: web::Data<MySqlPool>) -> Result<HttpResponse, ApiError> {
    let employees = list_by_level(pool.get_ref(), None).await?;
    Ok(HttpResponse::Ok().json(employees))
}

/// GET /employee/team-leaders
pub async fn list_team_leaders(pool: web::Data<MySqlPool>) -> Result<HttpResponse, ApiError> {
    let leaders = list_by_level(pool.get_ref(), Some(AccessLevel::TeamLeader)).await?;
    Ok(HttpResponse::Ok().json(leaders))
}

/// GET /employee/members
pub async fn list_plain_employees(pool: web::Data<MySqlPool>) -> Result<HttpResponse, ApiError> {
    let members = list_by_level(pool.get_ref(), Some(AccessLevel::Employee)).await?;
    Ok(HttpResponse::Ok().json(members))
}

/// GET /employee/admins
pub async fn list_admins(pool: web::Data<MySqlPool>) -> Result<HttpResponse, ApiError> {
    let admins = list_by_level(pool.get_ref(), Some(AccessLevel::Admin)).await?;
    Ok(HttpResponse::Ok().json(admins))
}

/// GET /employee/{id}
pub async fn get_employee(
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<HttpResponse, ApiError> {
    let employee_id = path.into_inner();

    let sql = format!("SELECT {EMPLOYEE_SUMMARY_COLUMNS} FROM employees WHERE id = ?");
    let employee = sqlx::query_as::<_, EmployeeSummary>(&sql)
        .bind(employee_id)
        .fetch_optional(pool.get_ref())
        .await?
        .ok_or_else(|| ApiError::not_found("Employee not found"))?;

    Ok(HttpResponse::Ok().json(employee))
}

/// PUT /employee/{id}
///
/// Typed payload merged field by field; absent fields keep the stored
/// value, present fields replace it.
pub async fn update_employee(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<UpdateEmployee>,
) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;

    let employee_id = path.into_inner();

    let sql = format!("SELECT {EMPLOYEE_SUMMARY_COLUMNS} FROM employees WHERE id = ?");
    let existing = sqlx::query_as::<_, EmployeeSummary>(&sql)
        .bind(employee_id)
        .fetch_optional(pool.get_ref())
        .await?
        .ok_or_else(|| ApiError::not_found("Employee not found"))?;

    let username = payload.username.clone().unwrap_or(existing.username);
    let first_name = payload.first_name.clone().unwrap_or(existing.first_name);
    let last_name = payload.last_name.clone().unwrap_or(existing.last_name);
    let middle_name = payload.middle_name.clone().or(existing.middle_name);
    let access_level = payload.access_level.unwrap_or(existing.access_level);
    let is_active = payload.is_active.unwrap_or(existing.is_active);
    let department_id = payload.department_id.or(existing.department_id);
    let role = payload
        .role
        .as_deref()
        .map(normalize_role)
        .or(existing.role);

    sqlx::query(
        r#"
        UPDATE employees
        SET username = ?, first_name = ?, last_name = ?, middle_name = ?,
            access_level = ?, is_active = ?, department_id = ?, role = ?
        WHERE id = ?
        "#,
    )
    .bind(&username)
    .bind(&first_name)
    .bind(&last_name)
    .bind(&middle_name)
    .bind(access_level)
    .bind(is_active)
    .bind(department_id)
    .bind(&role)
    .bind(employee_id)
    .execute(pool.get_ref())
    .await?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Employee updated successfully"
    })))
}

/// DELETE /employee/{id}
pub async fn delete_employee(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;

    let employee_id = path.into_inner();

    if auth.employee_id == employee_id {
        return Err(ApiError::validation("You can't delete yourself"));
    }

    let result = sqlx::query("DELETE FROM employees WHERE id = ?")
        .bind(employee_id)
        .execute(pool.get_ref())
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Employee not found"));
    }

    Ok(HttpResponse::Ok().json(json!({
        "message": "Employee deleted successfully"
    })))
}
