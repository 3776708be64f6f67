use serde_json::Value;

use crate::db::DbPool;
use crate::errors::AppError;

/// Days to keep audit entries before startup cleanup removes them.
const RETENTION_DAYS: i64 = 90;

/// Append an audit entry for a directory mutation.
///
/// Workflow paths (TTFU status, evidence, reviews) do not audit; only the
/// user directory and login flow write entries.
pub async fn log(
    pool: &DbPool,
    user_id: i64,
    action: &str,
    target_type: &str,
    target_id: i64,
    details: Value,
) -> Result<(), AppError> {
    sqlx::query(
        "INSERT INTO audit_log (user_id, action, target_type, target_id, details) \
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(user_id)
    .bind(action)
    .bind(target_type)
    .bind(target_id)
    .bind(details.to_string())
    .execute(pool)
    .await?;
    Ok(())
}

/// Delete audit entries older than the retention window.
pub async fn cleanup_old_entries(pool: &DbPool) {
    let cutoff = format!("-{RETENTION_DAYS} days");
    match sqlx::query("DELETE FROM audit_log WHERE created_at < datetime('now', ?)")
        .bind(&cutoff)
        .execute(pool)
        .await
    {
        Ok(result) => {
            let removed = result.rows_affected();
            if removed > 0 {
                log::info!("Audit cleanup removed {removed} entries older than {RETENTION_DAYS} days");
            }
        }
        Err(e) => log::warn!("Audit cleanup failed: {e}"),
    }
}
