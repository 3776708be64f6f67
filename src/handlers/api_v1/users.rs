use actix_web::{HttpResponse, web};
use serde::Deserialize;

use crate::auth::session::CurrentUser;
use crate::auth::{password, validate};
use crate::db::DbPool;
use crate::errors::AppError;
use crate::models::user;
use crate::models::user::{NewUser, Role};

use super::{PageQuery, PaginatedData, created, ok};

#[derive(Deserialize, Debug)]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: String,
}

/// GET /api/v1/users: paginated directory listing for assignee and
/// reviewer pickers. Any authenticated caller.
pub async fn list(
    pool: web::Data<DbPool>,
    _user: CurrentUser,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse, AppError> {
    let (page, per_page) = query.clamp();
    let user_page = user::find_paginated(&pool, page, per_page).await?;

    Ok(ok(PaginatedData {
        items: user_page.users,
        page: user_page.page,
        per_page: user_page.per_page,
        total: user_page.total_count,
    }))
}

/// GET /api/v1/users/{id}
pub async fn read(
    pool: web::Data<DbPool>,
    _user: CurrentUser,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let found = user::find_display_by_id(&pool, path.into_inner())
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(ok(found))
}

/// POST /api/v1/users: admin only.
pub async fn create(
    pool: web::Data<DbPool>,
    user: CurrentUser,
    body: web::Json<CreateUserRequest>,
) -> Result<HttpResponse, AppError> {
    if !user.is_admin() {
        return Err(AppError::Forbidden(
            "Only admins may create users".to_string(),
        ));
    }

    let mut errors = Vec::new();
    errors.extend(validate::validate_name(&body.name));
    errors.extend(validate::validate_email(&body.email));
    errors.extend(validate::validate_password(&body.password));
    let role = match Role::parse(&body.role) {
        Some(role) => role,
        None => {
            errors.push(format!(
                "Role must be one of admin, supervisor, reviewer, user (got '{}')",
                body.role
            ));
            Role::User
        }
    };
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    let hashed = password::hash_password(&body.password)?;
    let new_user = NewUser {
        name: body.name.trim().to_string(),
        email: body.email.trim().to_string(),
        password: hashed,
        role,
    };
    let created_id = user::create(&pool, &new_user).await?;

    let details = serde_json::json!({
        "name": new_user.name,
        "email": new_user.email,
        "role": role.as_str(),
    });
    let _ = crate::audit::log(&pool, user.id, "user.created", "user", created_id, details).await;

    let created_user = user::find_display_by_id(&pool, created_id)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(created(created_user))
}

/// DELETE /api/v1/users/{id}: admin only; meeting creators are protected
/// by the RESTRICT foreign key.
pub async fn delete(
    pool: web::Data<DbPool>,
    user: CurrentUser,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    if !user.is_admin() {
        return Err(AppError::Forbidden(
            "Only admins may delete users".to_string(),
        ));
    }

    let target_id = path.into_inner();
    user::find_display_by_id(&pool, target_id)
        .await?
        .ok_or(AppError::NotFound)?;

    user::delete(&pool, target_id).await?;

    let details = serde_json::json!({ "summary": "User deleted via API" });
    let _ = crate::audit::log(&pool, user.id, "user.deleted", "user", target_id, details).await;

    Ok(ok(serde_json::Value::Null))
}
