use crate::db::DbPool;
use crate::errors::AppError;
use crate::models::review;

use super::types::*;

/// Append an evidence record. No uniqueness rule: a TTFU may accumulate
/// unbounded evidence from the same or different submitters.
pub async fn create(pool: &DbPool, new: &NewEvidence, submitted_by: i64) -> Result<i64, AppError> {
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO evidence (ttfu_id, kind, url, file_ref, description, submitted_by) \
         VALUES (?, ?, ?, ?, ?, ?) RETURNING id",
    )
    .bind(new.ttfu_id)
    .bind(new.kind.as_str())
    .bind(&new.url)
    .bind(&new.file_ref)
    .bind(&new.description)
    .bind(submitted_by)
    .fetch_one(pool)
    .await?;
    Ok(id)
}

#[derive(sqlx::FromRow)]
struct Row {
    id: i64,
    ttfu_id: i64,
    kind: String,
    url: Option<String>,
    file_ref: Option<String>,
    description: String,
    submitted_by: i64,
    submitter_name: String,
    created_at: String,
}

impl Row {
    fn into_evidence(self, reviews: Vec<review::Review>) -> Result<Evidence, AppError> {
        let kind = EvidenceKind::parse(&self.kind).ok_or_else(|| {
            AppError::Db(sqlx::Error::Decode(
                format!("unknown evidence kind '{}'", self.kind).into(),
            ))
        })?;
        Ok(Evidence {
            id: self.id,
            ttfu_id: self.ttfu_id,
            kind,
            url: self.url,
            file_ref: self.file_ref,
            description: self.description,
            submitted_by: self.submitted_by,
            submitter_name: self.submitter_name,
            created_at: self.created_at,
            reviews,
        })
    }
}

const EVIDENCE_SELECT: &str = "\
SELECT e.id, e.ttfu_id, e.kind, e.url, e.file_ref, e.description, \
       e.submitted_by, u.name AS submitter_name, e.created_at \
FROM evidence e \
JOIN users u ON u.id = e.submitted_by";

pub async fn find_by_id(pool: &DbPool, id: i64) -> Result<Option<Evidence>, AppError> {
    let sql = format!("{EVIDENCE_SELECT} WHERE e.id = ?");
    let row = sqlx::query_as::<_, Row>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;

    let Some(row) = row else {
        return Ok(None);
    };
    let reviews = review::find_by_evidence(pool, row.id).await?;
    Ok(Some(row.into_evidence(reviews)?))
}

/// All evidence for a TTFU, newest first, each with its reviews.
pub async fn find_by_ttfu(pool: &DbPool, ttfu_id: i64) -> Result<Vec<Evidence>, AppError> {
    let sql =
        format!("{EVIDENCE_SELECT} WHERE e.ttfu_id = ? ORDER BY e.created_at DESC, e.id DESC");
    let rows = sqlx::query_as::<_, Row>(&sql)
        .bind(ttfu_id)
        .fetch_all(pool)
        .await?;

    let mut items = Vec::with_capacity(rows.len());
    for row in rows {
        let reviews = review::find_by_evidence(pool, row.id).await?;
        items.push(row.into_evidence(reviews)?);
    }
    Ok(items)
}
