use actix_web::{HttpResponse, web};
use serde::Deserialize;

use crate::auth::session::CurrentUser;
use crate::auth::validate;
use crate::db::DbPool;
use crate::errors::AppError;
use crate::models::evidence;
use crate::models::evidence::{EvidenceKind, NewEvidence};
use crate::models::ttfu;

use super::{created, ok};

#[derive(Deserialize, Debug)]
pub struct CreateEvidenceRequest {
    pub kind: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub file_ref: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// GET /api/v1/ttfus/{id}/evidence: newest first, reviews attached.
pub async fn list(
    pool: web::Data<DbPool>,
    _user: CurrentUser,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let ttfu_id = path.into_inner();
    ttfu::find_by_id(&pool, ttfu_id)
        .await?
        .ok_or(AppError::NotFound)?;

    let items = evidence::find_by_ttfu(&pool, ttfu_id).await?;
    Ok(ok(items))
}

/// POST /api/v1/ttfus/{id}/evidence: append a proof submission.
///
/// `kind=link` requires a valid http(s) URL; `kind=file` requires the
/// opaque reference handed back by the upload collaborator. The row is
/// attributed to the caller and immutable afterwards.
pub async fn create(
    pool: web::Data<DbPool>,
    user: CurrentUser,
    path: web::Path<i64>,
    body: web::Json<CreateEvidenceRequest>,
) -> Result<HttpResponse, AppError> {
    let ttfu_id = path.into_inner();
    ttfu::find_by_id(&pool, ttfu_id)
        .await?
        .ok_or(AppError::NotFound)?;

    let mut errors = Vec::new();
    let kind = match EvidenceKind::parse(&body.kind) {
        Some(kind) => kind,
        None => {
            errors.push(format!(
                "Kind must be one of link, file (got '{}')",
                body.kind
            ));
            return Err(AppError::Validation(errors));
        }
    };

    let (url, file_ref) = match kind {
        EvidenceKind::Link => {
            let url = body.url.as_deref().unwrap_or("");
            errors.extend(validate::validate_url(url));
            (Some(url.trim().to_string()), None)
        }
        EvidenceKind::File => {
            let file_ref = body.file_ref.as_deref().unwrap_or("").trim();
            if file_ref.is_empty() {
                errors.push("File reference is required for file evidence".to_string());
            }
            (None, Some(file_ref.to_string()))
        }
    };
    if let Some(description) = &body.description {
        errors.extend(validate::validate_optional(description, "Description", 2000));
    }
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    let new_evidence = NewEvidence {
        ttfu_id,
        kind,
        url,
        file_ref,
        description: body.description.clone().unwrap_or_default(),
    };
    let evidence_id = evidence::create(&pool, &new_evidence, user.id).await?;

    let record = evidence::find_by_id(&pool, evidence_id)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(created(record))
}
