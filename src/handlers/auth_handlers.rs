use actix_session::Session;
use actix_web::{HttpResponse, web};
use serde::{Deserialize, Serialize};

use crate::auth::session::{self, CurrentUser};
use crate::auth::{password, validate};
use crate::db::DbPool;
use crate::errors::{ApiErrorResponse, AppError};
use crate::handlers::api_v1::ok;
use crate::models::user;
use crate::models::user::Role;

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct PrincipalResponse {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: Role,
}

/// POST /api/v1/auth/login: verify credentials and establish a session.
pub async fn login(
    pool: web::Data<DbPool>,
    session: Session,
    body: web::Json<LoginRequest>,
) -> Result<HttpResponse, AppError> {
    if let Some(msg) = validate::validate_email(&body.email) {
        return Err(AppError::Validation(vec![msg]));
    }

    let found = user::find_by_email(&pool, body.email.trim()).await?;

    let Some(u) = found else {
        return Ok(invalid_credentials());
    };
    if !password::verify_password(&body.password, &u.password)? {
        return Ok(invalid_credentials());
    }

    session::establish(&session, u.id, u.role)?;

    let _ = crate::audit::log(
        &pool,
        u.id,
        "auth.login",
        "user",
        u.id,
        serde_json::json!({ "email": u.email }),
    )
    .await;

    Ok(ok(PrincipalResponse {
        id: u.id,
        name: u.name,
        email: u.email,
        role: u.role,
    }))
}

fn invalid_credentials() -> HttpResponse {
    HttpResponse::Unauthorized().json(ApiErrorResponse {
        error: "Invalid email or password".to_string(),
        details: None,
    })
}

/// POST /api/v1/auth/logout: purge the session. Safe to call logged out.
pub async fn logout(session: Session) -> Result<HttpResponse, AppError> {
    session.purge();
    Ok(ok(serde_json::Value::Null))
}

/// GET /api/v1/auth/me: return the current principal.
pub async fn me(pool: web::Data<DbPool>, user: CurrentUser) -> Result<HttpResponse, AppError> {
    let display = user::find_display_by_id(&pool, user.id)
        .await?
        .ok_or(AppError::Unauthorized)?;

    Ok(ok(PrincipalResponse {
        id: display.id,
        name: display.name,
        email: display.email,
        role: display.role,
    }))
}
