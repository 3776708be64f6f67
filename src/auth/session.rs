use std::future::{Ready, ready};

use actix_session::{Session, SessionExt};
use actix_web::dev::Payload;
use actix_web::{FromRequest, HttpRequest};

use crate::errors::AppError;
use crate::models::user::Role;

/// Authenticated principal for one request: user id plus global role.
///
/// Produced once at the boundary by the `FromRequest` impl and passed into
/// operations explicitly; handlers never read the session themselves.
#[derive(Debug, Clone, Copy)]
pub struct CurrentUser {
    pub id: i64,
    pub role: Role,
}

impl CurrentUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Global-role gate for the review workflow.
    pub fn can_review(&self) -> bool {
        matches!(self.role, Role::Reviewer | Role::Admin)
    }
}

/// Write the principal into the cookie session after a successful login.
pub fn establish(session: &Session, user_id: i64, role: Role) -> Result<(), AppError> {
    session
        .insert("user_id", user_id)
        .and_then(|_| session.insert("role", role.as_str()))
        .map_err(|e| AppError::Internal(format!("Session write failed: {e}")))
}

pub fn get_user_id(session: &Session) -> Option<i64> {
    session.get::<i64>("user_id").unwrap_or(None)
}

fn principal_from_session(session: &Session) -> Result<CurrentUser, AppError> {
    let id = get_user_id(session).ok_or(AppError::Unauthorized)?;
    let role = session
        .get::<String>("role")
        .unwrap_or(None)
        .as_deref()
        .and_then(Role::parse)
        .ok_or(AppError::Unauthorized)?;
    Ok(CurrentUser { id, role })
}

impl FromRequest for CurrentUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(principal_from_session(&req.get_session()))
    }
}
