use crate::db::DbPool;
use crate::errors::AppError;
use crate::models::user;
use crate::models::user::Role;

use super::types::*;

/// Resolve assignee and reviewer for a TTFU created without explicit
/// assignment.
///
/// Supervisors and plain users become the assignee and get the default
/// reviewer from the directory; reviewers and admins take both roles
/// themselves. Fails validation when no reviewer-or-admin user exists.
pub async fn resolve_assignment(
    pool: &DbPool,
    creator_id: i64,
    creator_role: Role,
) -> Result<(i64, i64), AppError> {
    match creator_role {
        Role::Reviewer | Role::Admin => Ok((creator_id, creator_id)),
        Role::Supervisor | Role::User => {
            let reviewer_id = user::find_default_reviewer(pool).await?.ok_or_else(|| {
                AppError::Validation(vec![
                    "No valid reviewer found — the directory has no reviewer or admin user"
                        .to_string(),
                ])
            })?;
            Ok((creator_id, reviewer_id))
        }
    }
}

pub async fn create(pool: &DbPool, new: &NewTtfu) -> Result<i64, AppError> {
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO ttfus (meeting_id, title, description, assignee_id, reviewer_id, due_date) \
         VALUES (?, ?, ?, ?, ?, ?) RETURNING id",
    )
    .bind(new.meeting_id)
    .bind(&new.title)
    .bind(&new.description)
    .bind(new.assignee_id)
    .bind(new.reviewer_id)
    .bind(&new.due_date)
    .fetch_one(pool)
    .await?;
    Ok(id)
}

#[derive(sqlx::FromRow)]
struct DetailRow {
    id: i64,
    meeting_id: i64,
    title: String,
    description: String,
    status: String,
    assignee_id: i64,
    assignee_name: String,
    reviewer_id: i64,
    reviewer_name: String,
    due_date: Option<String>,
    created_at: String,
    updated_at: String,
}

fn parse_status(raw: &str) -> Result<TtfuStatus, AppError> {
    TtfuStatus::parse(raw).ok_or_else(|| {
        AppError::Db(sqlx::Error::Decode(
            format!("unknown status '{raw}' in ttfus table").into(),
        ))
    })
}

pub async fn find_by_id(pool: &DbPool, id: i64) -> Result<Option<TtfuDetail>, AppError> {
    let row = sqlx::query_as::<_, DetailRow>(
        "SELECT t.id, t.meeting_id, t.title, t.description, t.status, \
                t.assignee_id, a.name AS assignee_name, \
                t.reviewer_id, r.name AS reviewer_name, \
                t.due_date, t.created_at, t.updated_at \
         FROM ttfus t \
         JOIN users a ON a.id = t.assignee_id \
         JOIN users r ON r.id = t.reviewer_id \
         WHERE t.id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    row.map(|r| {
        let status = parse_status(&r.status)?;
        Ok(TtfuDetail {
            id: r.id,
            meeting_id: r.meeting_id,
            title: r.title,
            description: r.description,
            status,
            assignee_id: r.assignee_id,
            assignee_name: r.assignee_name,
            reviewer_id: r.reviewer_id,
            reviewer_name: r.reviewer_name,
            due_date: r.due_date,
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    })
    .transpose()
}

const LIST_SELECT: &str = "\
SELECT t.id, t.meeting_id, t.title, t.status, \
       t.assignee_id, a.name AS assignee_name, \
       t.reviewer_id, r.name AS reviewer_name, \
       t.due_date \
FROM ttfus t \
JOIN users a ON a.id = t.assignee_id \
JOIN users r ON r.id = t.reviewer_id \
WHERE 1 = 1";

const LIST_COUNT: &str = "SELECT COUNT(*) FROM ttfus t WHERE 1 = 1";

fn filter_clauses(filter: &TtfuFilter) -> String {
    let mut sql = String::new();
    if filter.meeting_id.is_some() {
        sql.push_str(" AND t.meeting_id = ?");
    }
    if filter.status.is_some() {
        sql.push_str(" AND t.status = ?");
    }
    if filter.assignee_id.is_some() {
        sql.push_str(" AND t.assignee_id = ?");
    }
    if filter.reviewer_id.is_some() {
        sql.push_str(" AND t.reviewer_id = ?");
    }
    sql
}

fn bind_filter<'q, O>(
    query: sqlx::query::QueryAs<'q, sqlx::Sqlite, O, sqlx::sqlite::SqliteArguments<'q>>,
    filter: &'q TtfuFilter,
) -> sqlx::query::QueryAs<'q, sqlx::Sqlite, O, sqlx::sqlite::SqliteArguments<'q>> {
    let mut query = query;
    if let Some(meeting_id) = filter.meeting_id {
        query = query.bind(meeting_id);
    }
    if let Some(status) = filter.status {
        query = query.bind(status.as_str());
    }
    if let Some(assignee_id) = filter.assignee_id {
        query = query.bind(assignee_id);
    }
    if let Some(reviewer_id) = filter.reviewer_id {
        query = query.bind(reviewer_id);
    }
    query
}

/// Filtered, paginated TTFU list, newest first.
pub async fn find_filtered(
    pool: &DbPool,
    filter: &TtfuFilter,
    page: i64,
    per_page: i64,
) -> Result<TtfuPage, AppError> {
    #[derive(sqlx::FromRow)]
    struct Row {
        id: i64,
        meeting_id: i64,
        title: String,
        status: String,
        assignee_id: i64,
        assignee_name: String,
        reviewer_id: i64,
        reviewer_name: String,
        due_date: Option<String>,
    }

    let clauses = filter_clauses(filter);

    let count_sql = format!("{LIST_COUNT}{clauses}");
    let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
    if let Some(meeting_id) = filter.meeting_id {
        count_query = count_query.bind(meeting_id);
    }
    if let Some(status) = filter.status {
        count_query = count_query.bind(status.as_str());
    }
    if let Some(assignee_id) = filter.assignee_id {
        count_query = count_query.bind(assignee_id);
    }
    if let Some(reviewer_id) = filter.reviewer_id {
        count_query = count_query.bind(reviewer_id);
    }
    let total_count: i64 = count_query.fetch_one(pool).await?;

    let offset = (page - 1) * per_page;
    let list_sql = format!("{LIST_SELECT}{clauses} ORDER BY t.id DESC LIMIT ? OFFSET ?");
    let query = bind_filter(sqlx::query_as::<_, Row>(&list_sql), filter)
        .bind(per_page)
        .bind(offset);
    let rows = query.fetch_all(pool).await?;

    let ttfus = rows
        .into_iter()
        .map(|r| {
            let status = parse_status(&r.status)?;
            Ok(TtfuListItem {
                id: r.id,
                meeting_id: r.meeting_id,
                title: r.title,
                status,
                assignee_id: r.assignee_id,
                assignee_name: r.assignee_name,
                reviewer_id: r.reviewer_id,
                reviewer_name: r.reviewer_name,
                due_date: r.due_date,
            })
        })
        .collect::<Result<Vec<_>, AppError>>()?;

    Ok(TtfuPage {
        ttfus,
        page,
        per_page,
        total_count,
    })
}

/// Overwrite a TTFU's status in place. No history is kept.
/// Returns false when the TTFU does not exist.
pub async fn update_status(
    pool: &DbPool,
    id: i64,
    status: TtfuStatus,
) -> Result<bool, AppError> {
    let result = sqlx::query(
        "UPDATE ttfus SET status = ?, updated_at = datetime('now') WHERE id = ?",
    )
    .bind(status.as_str())
    .bind(id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn delete(pool: &DbPool, id: i64) -> Result<(), AppError> {
    sqlx::query("DELETE FROM ttfus WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}
