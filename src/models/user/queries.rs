use crate::db::DbPool;
use crate::errors::{AppError, is_unique_violation};

use super::types::*;

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    name: String,
    email: String,
    password: String,
    role: String,
    created_at: String,
}

fn parse_role(raw: &str) -> Result<Role, AppError> {
    Role::parse(raw).ok_or_else(|| AppError::Db(sqlx::Error::Decode(
        format!("unknown role '{raw}' in users table").into(),
    )))
}

impl UserRow {
    fn into_user(self) -> Result<User, AppError> {
        let role = parse_role(&self.role)?;
        Ok(User {
            id: self.id,
            name: self.name,
            email: self.email,
            password: self.password,
            role,
        })
    }

    fn into_display(self) -> Result<UserDisplay, AppError> {
        let role = parse_role(&self.role)?;
        Ok(UserDisplay {
            id: self.id,
            name: self.name,
            email: self.email,
            role,
            created_at: self.created_at,
        })
    }
}

const USER_SELECT: &str =
    "SELECT id, name, email, password, role, created_at FROM users";

/// Insert a new user. A duplicate email surfaces as a validation failure.
pub async fn create(pool: &DbPool, new_user: &NewUser) -> Result<i64, AppError> {
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO users (name, email, password, role) VALUES (?, ?, ?, ?) RETURNING id",
    )
    .bind(&new_user.name)
    .bind(&new_user.email)
    .bind(&new_user.password)
    .bind(new_user.role.as_str())
    .fetch_one(pool)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            AppError::Validation(vec![format!(
                "Email '{}' is already registered",
                new_user.email
            )])
        } else {
            AppError::from(e)
        }
    })?;
    Ok(id)
}

/// Look up a user by email for login. Includes the password hash.
pub async fn find_by_email(pool: &DbPool, email: &str) -> Result<Option<User>, AppError> {
    let sql = format!("{USER_SELECT} WHERE email = ?");
    let row = sqlx::query_as::<_, UserRow>(&sql)
        .bind(email)
        .fetch_optional(pool)
        .await?;
    row.map(UserRow::into_user).transpose()
}

pub async fn find_display_by_id(pool: &DbPool, id: i64) -> Result<Option<UserDisplay>, AppError> {
    let sql = format!("{USER_SELECT} WHERE id = ?");
    let row = sqlx::query_as::<_, UserRow>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    row.map(UserRow::into_display).transpose()
}

pub async fn exists(pool: &DbPool, id: i64) -> Result<bool, AppError> {
    let found: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE id = ?)")
        .bind(id)
        .fetch_one(pool)
        .await?;
    Ok(found)
}

/// List the directory a page at a time, ordered by name.
pub async fn find_paginated(pool: &DbPool, page: i64, per_page: i64) -> Result<UserPage, AppError> {
    let total_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(pool)
        .await?;

    let offset = (page - 1) * per_page;
    let sql = format!("{USER_SELECT} ORDER BY name ASC, id ASC LIMIT ? OFFSET ?");
    let rows = sqlx::query_as::<_, UserRow>(&sql)
        .bind(per_page)
        .bind(offset)
        .fetch_all(pool)
        .await?;

    let users = rows
        .into_iter()
        .map(UserRow::into_display)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(UserPage {
        users,
        page,
        per_page,
        total_count,
    })
}

/// Pick the default reviewer for TTFU auto-assignment.
///
/// Deterministic policy: the reviewer-or-admin user carrying the fewest
/// open or in-progress TTFUs as reviewer, ties broken by lowest id.
/// Returns None when the directory holds no reviewer or admin at all.
pub async fn find_default_reviewer(pool: &DbPool) -> Result<Option<i64>, AppError> {
    let id: Option<i64> = sqlx::query_scalar(
        "SELECT u.id FROM users u \
         LEFT JOIN ttfus t ON t.reviewer_id = u.id \
             AND t.status IN ('open', 'in-progress') \
         WHERE u.role IN ('reviewer', 'admin') \
         GROUP BY u.id \
         ORDER BY COUNT(t.id) ASC, u.id ASC \
         LIMIT 1",
    )
    .fetch_optional(pool)
    .await?;
    Ok(id)
}

/// Delete a user. Creator links on meetings are RESTRICT, so deleting a
/// meeting creator fails; assignee/reviewer/submitter links cascade.
pub async fn delete(pool: &DbPool, id: i64) -> Result<(), AppError> {
    sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_foreign_key_violation() => AppError::Conflict(
                "User has created meetings and cannot be deleted".to_string(),
            ),
            _ => AppError::from(e),
        })?;
    Ok(())
}
