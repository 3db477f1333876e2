use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, Display, EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum AccessLevel {
    Admin,
    TeamLeader,
    Employee,
}

/// Full employee row, used internally by auth and the clock handlers.
/// The password hash never leaves the process.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Employee {
    pub id: u64,
    pub username: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub middle_name: Option<String>,
    pub access_level: AccessLevel,
    pub is_active: bool,
    pub role: Option<String>,
    pub department_id: Option<u64>,
}

/// Projection returned by listing endpoints.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct EmployeeSummary {
    pub id: u64,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub middle_name: Option<String>,
    pub access_level: AccessLevel,
    pub is_active: bool,
    pub role: Option<String>,
    pub department_id: Option<u64>,
}

pub const EMPLOYEE_COLUMNS: &str = "id, username, password, first_name, last_name, middle_name, \
     access_level, is_active, role, department_id";

pub const EMPLOYEE_SUMMARY_COLUMNS: &str = "id, username, first_name, last_name, middle_name, \
     access_level, is_active, role, department_id";

/// Roles are free-text labels keyed against department schedules; casing
/// drift breaks the resolver lookup, so every write site normalizes.
pub fn normalize_role(role: &str) -> String {
    role.trim().to_uppercase()
}
