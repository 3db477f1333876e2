use actix_web::{HttpRequest, HttpResponse, Responder, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::MySqlPool;
use tracing::{debug, error, info, instrument};

use crate::auth::jwt::{generate_access_token, generate_refresh_token, verify_token};
use crate::auth::password::verify_password;
use crate::config::Config;
use crate::model::employee::{EMPLOYEE_COLUMNS, Employee};
use crate::models::{LoginReqDto, TokenType};

#[derive(Serialize, Deserialize)]
struct LoginResponse {
    access_token: String,
    refresh_token: String,
}

#[instrument(
    name = "auth_login",
    skip(pool, config, user),
    fields(username = %user.username)
)]
pub async fn login(
    user: web::Json<LoginReqDto>,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> impl Responder {
    info!("Login request received");

    if user.username.trim().is_empty() || user.password.is_empty() {
        info!("Validation failed: empty username or password");
        return HttpResponse::BadRequest().json(json!({
            "message": "Username or password required"
        }));
    }

    debug!("Fetching employee from database");

    let sql = format!("SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE username = ?");
    let employee = match sqlx::query_as::<_, Employee>(&sql)
        .bind(&user.username)
        .fetch_optional(pool.get_ref())
        .await
    {
        Ok(Some(employee)) => {
            debug!(employee_id = employee.id, "Employee found");
            employee
        }
        Ok(None) => {
            info!("Invalid credentials: employee not found");
            return HttpResponse::Unauthorized().json(json!({
                "message": "Invalid username or password"
            }));
        }
        Err(e) => {
            error!(error = %e, "Database error while fetching employee");
            return HttpResponse::InternalServerError().finish();
        }
    };

    if let Err(e) = verify_password(&user.password, &employee.password) {
        info!(error = %e, "Invalid credentials: password mismatch");
        return HttpResponse::Unauthorized().json(json!({
            "message": "Invalid username or password"
        }));
    }

    debug!("Password verified, issuing tokens");

    let access_token =
        generate_access_token(&employee, &config.jwt_secret, config.access_token_ttl);
    let refresh_token =
        generate_refresh_token(&employee, &config.jwt_secret, config.refresh_token_ttl);

    info!("Login successful");

    HttpResponse::Ok().json(LoginResponse {
        access_token,
        refresh_token,
    })
}

pub async fn refresh_token(
    req: HttpRequest,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> impl Responder {
    let header = match req.headers().get("Authorization") {
        Some(h) => h.to_str().unwrap_or(""),
        None => return HttpResponse::Unauthorized().json(json!({"message": "No token"})),
    };

    let token = match header.strip_prefix("Bearer ") {
        Some(t) => t,
        None => return HttpResponse::Unauthorized().json(json!({"message": "Invalid token"})),
    };

    let claims = match verify_token(token, &config.jwt_secret) {
        Ok(c) => c,
        Err(_) => return HttpResponse::Unauthorized().finish(),
    };

    if claims.token_type != TokenType::Refresh {
        return HttpResponse::Unauthorized().finish();
    }

    // Re-read the employee so a revoked account or changed assignment is
    // reflected in the new access token.
    let sql = format!("SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE id = ?");
    let employee = match sqlx::query_as::<_, Employee>(&sql)
        .bind(claims.employee_id)
        .fetch_optional(pool.get_ref())
        .await
    {
        Ok(Some(employee)) => employee,
        Ok(None) => return HttpResponse::Unauthorized().finish(),
        Err(e) => {
            error!(error = %e, "Database error while refreshing token");
            return HttpResponse::InternalServerError().finish();
        }
    };

    let access_token =
        generate_access_token(&employee, &config.jwt_secret, config.access_token_ttl);

    HttpResponse::Ok().json(json!({
        "access_token": access_token
    }))
}

/// Tokens are stateless, so logout is an acknowledgement; the client drops
/// its tokens.
pub async fn logout() -> impl Responder {
    HttpResponse::NoContent().finish()
}
