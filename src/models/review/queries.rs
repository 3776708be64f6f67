use crate::db::DbPool;
use crate::errors::{AppError, is_unique_violation};

use super::types::*;

/// True if this reviewer already reviewed this evidence. The pre-check
/// gives the friendly conflict message; the UNIQUE constraint in the
/// schema closes the check-then-act race.
pub async fn exists_for(
    pool: &DbPool,
    evidence_id: i64,
    reviewer_id: i64,
) -> Result<bool, AppError> {
    let found: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM reviews WHERE evidence_id = ? AND reviewer_id = ?)",
    )
    .bind(evidence_id)
    .bind(reviewer_id)
    .fetch_one(pool)
    .await?;
    Ok(found)
}

/// Append a review. A duplicate (evidence, reviewer) pair, including one
/// that slipped past the pre-check concurrently, surfaces as a conflict.
pub async fn create(pool: &DbPool, new: &NewReview, reviewer_id: i64) -> Result<i64, AppError> {
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO reviews (evidence_id, reviewer_id, decision, comment) \
         VALUES (?, ?, ?, ?) RETURNING id",
    )
    .bind(new.evidence_id)
    .bind(reviewer_id)
    .bind(new.decision.as_str())
    .bind(&new.comment)
    .fetch_one(pool)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            AppError::Conflict("You have already reviewed this evidence".to_string())
        } else {
            AppError::from(e)
        }
    })?;
    Ok(id)
}

#[derive(sqlx::FromRow)]
struct Row {
    id: i64,
    evidence_id: i64,
    reviewer_id: i64,
    reviewer_name: String,
    decision: String,
    comment: Option<String>,
    created_at: String,
}

impl Row {
    fn into_review(self) -> Result<Review, AppError> {
        let decision = ReviewDecision::parse(&self.decision).ok_or_else(|| {
            AppError::Db(sqlx::Error::Decode(
                format!("unknown review decision '{}'", self.decision).into(),
            ))
        })?;
        Ok(Review {
            id: self.id,
            evidence_id: self.evidence_id,
            reviewer_id: self.reviewer_id,
            reviewer_name: self.reviewer_name,
            decision,
            comment: self.comment,
            created_at: self.created_at,
        })
    }
}

const REVIEW_SELECT: &str = "\
SELECT r.id, r.evidence_id, r.reviewer_id, u.name AS reviewer_name, \
       r.decision, r.comment, r.created_at \
FROM reviews r \
JOIN users u ON u.id = r.reviewer_id";

pub async fn find_by_id(pool: &DbPool, id: i64) -> Result<Option<Review>, AppError> {
    let sql = format!("{REVIEW_SELECT} WHERE r.id = ?");
    let row = sqlx::query_as::<_, Row>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    row.map(Row::into_review).transpose()
}

/// Reviews for one evidence record, oldest first.
pub async fn find_by_evidence(pool: &DbPool, evidence_id: i64) -> Result<Vec<Review>, AppError> {
    let sql = format!("{REVIEW_SELECT} WHERE r.evidence_id = ? ORDER BY r.id ASC");
    let rows = sqlx::query_as::<_, Row>(&sql)
        .bind(evidence_id)
        .fetch_all(pool)
        .await?;
    rows.into_iter().map(Row::into_review).collect()
}
