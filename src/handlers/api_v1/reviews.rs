use actix_web::{HttpResponse, web};
use serde::Deserialize;

use crate::auth::session::CurrentUser;
use crate::auth::validate;
use crate::db::DbPool;
use crate::errors::AppError;
use crate::models::evidence;
use crate::models::review;
use crate::models::review::{NewReview, ReviewDecision};
use crate::models::ttfu;

use super::{created, ok};

#[derive(Deserialize, Debug)]
pub struct CreateReviewRequest {
    pub decision: String,
    #[serde(default)]
    pub comment: Option<String>,
}

/// GET /api/v1/evidence/{id}/reviews
pub async fn list(
    pool: web::Data<DbPool>,
    _user: CurrentUser,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let evidence_id = path.into_inner();
    evidence::find_by_id(&pool, evidence_id)
        .await?
        .ok_or(AppError::NotFound)?;

    let items = review::find_by_evidence(&pool, evidence_id).await?;
    Ok(ok(items))
}

/// POST /api/v1/evidence/{id}/reviews: record a reviewer decision.
///
/// Caller must hold the reviewer or admin global role AND be the parent
/// TTFU's designated reviewer (admins may review anything). One review
/// per reviewer per evidence; a duplicate is a conflict. The decision
/// never touches the parent TTFU's status.
pub async fn create(
    pool: web::Data<DbPool>,
    user: CurrentUser,
    path: web::Path<i64>,
    body: web::Json<CreateReviewRequest>,
) -> Result<HttpResponse, AppError> {
    let evidence_id = path.into_inner();
    let evidence = evidence::find_by_id(&pool, evidence_id)
        .await?
        .ok_or(AppError::NotFound)?;

    if !user.can_review() {
        return Err(AppError::Forbidden(
            "Only reviewers and admins may submit reviews".to_string(),
        ));
    }
    let parent = ttfu::find_by_id(&pool, evidence.ttfu_id)
        .await?
        .ok_or(AppError::NotFound)?;
    if parent.reviewer_id != user.id && !user.is_admin() {
        return Err(AppError::Forbidden(
            "Only the designated reviewer or an admin may review this evidence".to_string(),
        ));
    }

    let mut errors = Vec::new();
    let decision = match ReviewDecision::parse(&body.decision) {
        Some(decision) => decision,
        None => {
            errors.push(format!(
                "Decision must be one of approved, rejected, needs-revision (got '{}')",
                body.decision
            ));
            return Err(AppError::Validation(errors));
        }
    };
    if let Some(comment) = &body.comment {
        errors.extend(validate::validate_optional(comment, "Comment", 2000));
    }
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    if review::exists_for(&pool, evidence_id, user.id).await? {
        return Err(AppError::Conflict(
            "You have already reviewed this evidence".to_string(),
        ));
    }

    let new_review = NewReview {
        evidence_id,
        decision,
        comment: body.comment.clone(),
    };
    let review_id = review::create(&pool, &new_review, user.id).await?;

    let record = review::find_by_id(&pool, review_id)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(created(record))
}
