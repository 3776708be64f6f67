use actix_web::{HttpResponse, web};
use serde::Deserialize;

use crate::auth::session::CurrentUser;
use crate::auth::validate;
use crate::db::DbPool;
use crate::errors::AppError;
use crate::models::meeting;
use crate::models::meeting::{MeetingRole, NewMeeting};
use crate::models::user;

use super::{PageQuery, PaginatedData, created, ok};

#[derive(Deserialize, Debug)]
pub struct ParticipantEntry {
    pub user_id: i64,
    #[serde(default)]
    pub role: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct CreateMeetingRequest {
    pub title: String,
    pub date: String,
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub end_time: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub participants: Vec<ParticipantEntry>,
}

#[derive(Deserialize, Debug)]
pub struct AddParticipantRequest {
    /// Omitted for self-service "join".
    #[serde(default)]
    pub user_id: Option<i64>,
    #[serde(default)]
    pub role: Option<String>,
}

fn parse_meeting_role(raw: Option<&str>, errors: &mut Vec<String>) -> MeetingRole {
    match raw {
        None => MeetingRole::Participant,
        Some(s) => match MeetingRole::parse(s) {
            Some(role) => role,
            None => {
                errors.push(format!(
                    "Participant role must be one of owner, reviewer, participant (got '{s}')"
                ));
                MeetingRole::Participant
            }
        },
    }
}

/// GET /api/v1/meetings: paginated, newest date first.
pub async fn list(
    pool: web::Data<DbPool>,
    _user: CurrentUser,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse, AppError> {
    let (page, per_page) = query.clamp();
    let meeting_page = meeting::find_paginated(&pool, page, per_page).await?;

    Ok(ok(PaginatedData {
        items: meeting_page.meetings,
        page: meeting_page.page,
        per_page: meeting_page.per_page,
        total: meeting_page.total_count,
    }))
}

/// GET /api/v1/meetings/{id}: detail with the participant roster.
pub async fn read(
    pool: web::Data<DbPool>,
    _user: CurrentUser,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let detail = meeting::find_by_id(&pool, path.into_inner())
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(ok(detail))
}

/// POST /api/v1/meetings: create a meeting, optionally with its roster.
pub async fn create(
    pool: web::Data<DbPool>,
    user: CurrentUser,
    body: web::Json<CreateMeetingRequest>,
) -> Result<HttpResponse, AppError> {
    let mut errors = Vec::new();
    errors.extend(validate::validate_required(&body.title, "Title", 200));
    errors.extend(validate::validate_date(&body.date, "Date"));
    if let Some(notes) = &body.notes {
        errors.extend(validate::validate_optional(notes, "Notes", 10_000));
    }

    let mut roster = Vec::with_capacity(body.participants.len());
    for entry in &body.participants {
        let role = parse_meeting_role(entry.role.as_deref(), &mut errors);
        if !user::exists(&pool, entry.user_id).await? {
            errors.push(format!("Participant user {} does not exist", entry.user_id));
        }
        roster.push((entry.user_id, role));
    }
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    let new_meeting = NewMeeting {
        title: body.title.trim().to_string(),
        meeting_date: body.date.trim().to_string(),
        start_time: body.start_time.clone(),
        end_time: body.end_time.clone(),
        notes: body.notes.clone().unwrap_or_default(),
    };
    let meeting_id = meeting::create(&pool, &new_meeting, user.id).await?;

    for (user_id, role) in roster {
        meeting::add_participant(&pool, meeting_id, user_id, role).await?;
    }

    let detail = meeting::find_by_id(&pool, meeting_id)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(created(detail))
}

/// POST /api/v1/meetings/{id}/participants: add a participant, or join
/// the meeting yourself when `user_id` is omitted.
pub async fn add_participant(
    pool: web::Data<DbPool>,
    user: CurrentUser,
    path: web::Path<i64>,
    body: web::Json<AddParticipantRequest>,
) -> Result<HttpResponse, AppError> {
    let meeting_id = path.into_inner();
    if !meeting::exists(&pool, meeting_id).await? {
        return Err(AppError::NotFound);
    }

    let mut errors = Vec::new();
    let role = parse_meeting_role(body.role.as_deref(), &mut errors);
    let user_id = body.user_id.unwrap_or(user.id);
    if !user::exists(&pool, user_id).await? {
        errors.push(format!("User {user_id} does not exist"));
    }
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    meeting::add_participant(&pool, meeting_id, user_id, role).await?;

    let participants = meeting::find_participants(&pool, meeting_id).await?;
    Ok(created(participants))
}

/// DELETE /api/v1/meetings/{id}: creator or admin; cascades to TTFUs,
/// evidence and reviews.
pub async fn delete(
    pool: web::Data<DbPool>,
    user: CurrentUser,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let meeting_id = path.into_inner();
    let creator = meeting::find_creator(&pool, meeting_id)
        .await?
        .ok_or(AppError::NotFound)?;

    if creator != user.id && !user.is_admin() {
        return Err(AppError::Forbidden(
            "Only the meeting creator or an admin may delete a meeting".to_string(),
        ));
    }

    meeting::delete(&pool, meeting_id).await?;
    Ok(ok(serde_json::Value::Null))
}
