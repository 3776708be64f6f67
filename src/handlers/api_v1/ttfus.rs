use actix_web::{HttpResponse, web};
use serde::{Deserialize, Serialize};

use crate::auth::session::CurrentUser;
use crate::auth::validate;
use crate::db::DbPool;
use crate::errors::AppError;
use crate::models::evidence;
use crate::models::evidence::Evidence;
use crate::models::meeting;
use crate::models::ttfu;
use crate::models::ttfu::{NewTtfu, TtfuDetail, TtfuFilter, TtfuStatus};
use crate::models::user;

use super::{PaginatedData, created, ok};

#[derive(Deserialize, Debug)]
pub struct CreateTtfuRequest {
    pub meeting_id: i64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub assignee_id: Option<i64>,
    #[serde(default)]
    pub reviewer_id: Option<i64>,
    #[serde(default)]
    pub due_date: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct UpdateStatusRequest {
    pub status: String,
    /// Accepted for parity with the status form; not persisted anywhere.
    #[serde(default)]
    pub notes: Option<String>,
}

/// Query params for the TTFU list: optional filters plus page/limit.
#[derive(Deserialize, Debug, Default)]
pub struct TtfuListQuery {
    pub meeting_id: Option<i64>,
    pub status: Option<String>,
    pub assignee_id: Option<i64>,
    pub reviewer_id: Option<i64>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// TTFU detail plus its evidence trail, newest first.
#[derive(Serialize, Debug)]
pub struct TtfuDetailResponse {
    #[serde(flatten)]
    pub ttfu: TtfuDetail,
    pub evidence: Vec<Evidence>,
}

/// GET /api/v1/ttfus: filtered, paginated list.
pub async fn list(
    pool: web::Data<DbPool>,
    _user: CurrentUser,
    query: web::Query<TtfuListQuery>,
) -> Result<HttpResponse, AppError> {
    let status = match query.status.as_deref() {
        None => None,
        Some(raw) => Some(TtfuStatus::parse(raw).ok_or_else(|| {
            AppError::Validation(vec![format!(
                "Status filter must be one of open, in-progress, done, rejected (got '{raw}')"
            )])
        })?),
    };

    let filter = TtfuFilter {
        meeting_id: query.meeting_id,
        status,
        assignee_id: query.assignee_id,
        reviewer_id: query.reviewer_id,
    };
    let page = query.page.unwrap_or(1).clamp(1, super::MAX_PAGE);
    let per_page = query.limit.unwrap_or(25).clamp(1, 100);

    let ttfu_page = ttfu::find_filtered(&pool, &filter, page, per_page).await?;

    Ok(ok(PaginatedData {
        items: ttfu_page.ttfus,
        page: ttfu_page.page,
        per_page: ttfu_page.per_page,
        total: ttfu_page.total_count,
    }))
}

/// GET /api/v1/ttfus/{id}: detail with evidence and reviews.
pub async fn read(
    pool: web::Data<DbPool>,
    _user: CurrentUser,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let ttfu = ttfu::find_by_id(&pool, path.into_inner())
        .await?
        .ok_or(AppError::NotFound)?;
    let evidence = evidence::find_by_ttfu(&pool, ttfu.id).await?;
    Ok(ok(TtfuDetailResponse { ttfu, evidence }))
}

/// POST /api/v1/ttfus: create under an existing meeting. Assignee and
/// reviewer are taken from the payload when given, otherwise derived from
/// the creator's global role.
pub async fn create(
    pool: web::Data<DbPool>,
    user: CurrentUser,
    body: web::Json<CreateTtfuRequest>,
) -> Result<HttpResponse, AppError> {
    if !meeting::exists(&pool, body.meeting_id).await? {
        return Err(AppError::NotFound);
    }

    let mut errors = Vec::new();
    errors.extend(validate::validate_required(&body.title, "Title", 200));
    if let Some(description) = &body.description {
        errors.extend(validate::validate_optional(description, "Description", 10_000));
    }
    if let Some(due_date) = &body.due_date {
        errors.extend(validate::validate_date(due_date, "Due date"));
    }
    for (label, id) in [("Assignee", body.assignee_id), ("Reviewer", body.reviewer_id)] {
        if let Some(id) = id {
            if !user::exists(&pool, id).await? {
                errors.push(format!("{label} user {id} does not exist"));
            }
        }
    }
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    // Each omitted side is filled independently: the creator is the default
    // assignee, and the assignment policy is consulted only when the
    // reviewer is left out. An explicit reviewer must not fail because the
    // directory has nobody for the policy to pick.
    let assignee_id = body.assignee_id.unwrap_or(user.id);
    let reviewer_id = match body.reviewer_id {
        Some(id) => id,
        None => {
            let (_, reviewer_id) = ttfu::resolve_assignment(&pool, user.id, user.role).await?;
            reviewer_id
        }
    };

    let new_ttfu = NewTtfu {
        meeting_id: body.meeting_id,
        title: body.title.trim().to_string(),
        description: body.description.clone().unwrap_or_default(),
        assignee_id,
        reviewer_id,
        due_date: body.due_date.clone(),
    };
    let ttfu_id = ttfu::create(&pool, &new_ttfu).await?;

    let detail = ttfu::find_by_id(&pool, ttfu_id)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(created(detail))
}

/// PUT /api/v1/ttfus/{id}/status: overwrite the status in place. Any
/// authenticated caller, any of the four values, any order; review
/// decisions never feed into this.
pub async fn update_status(
    pool: web::Data<DbPool>,
    _user: CurrentUser,
    path: web::Path<i64>,
    body: web::Json<UpdateStatusRequest>,
) -> Result<HttpResponse, AppError> {
    let status = TtfuStatus::parse(&body.status).ok_or_else(|| {
        AppError::Validation(vec![format!(
            "Status must be one of open, in-progress, done, rejected (got '{}')",
            body.status
        )])
    })?;

    let ttfu_id = path.into_inner();
    if !ttfu::update_status(&pool, ttfu_id, status).await? {
        return Err(AppError::NotFound);
    }

    let detail = ttfu::find_by_id(&pool, ttfu_id)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(ok(detail))
}

/// DELETE /api/v1/ttfus/{id}: assignee, designated reviewer, or admin.
pub async fn delete(
    pool: web::Data<DbPool>,
    user: CurrentUser,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let ttfu_id = path.into_inner();
    let detail = ttfu::find_by_id(&pool, ttfu_id)
        .await?
        .ok_or(AppError::NotFound)?;

    let allowed = user.is_admin() || user.id == detail.assignee_id || user.id == detail.reviewer_id;
    if !allowed {
        return Err(AppError::Forbidden(
            "Only the assignee, the designated reviewer, or an admin may delete a follow-up"
                .to_string(),
        ));
    }

    ttfu::delete(&pool, ttfu_id).await?;
    Ok(ok(serde_json::Value::Null))
}
