use crate::db::DbPool;
use crate::errors::{AppError, is_unique_violation};

use super::types::*;

/// Create a meeting owned by `created_by`. Participants are added
/// separately so the roster path is the same for create-time and later
/// joins.
pub async fn create(pool: &DbPool, new: &NewMeeting, created_by: i64) -> Result<i64, AppError> {
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO meetings (title, meeting_date, start_time, end_time, notes, created_by) \
         VALUES (?, ?, ?, ?, ?, ?) RETURNING id",
    )
    .bind(&new.title)
    .bind(&new.meeting_date)
    .bind(&new.start_time)
    .bind(&new.end_time)
    .bind(&new.notes)
    .bind(created_by)
    .fetch_one(pool)
    .await?;
    Ok(id)
}

/// Add a user to a meeting's roster. A user joins a meeting at most once;
/// the UNIQUE(meeting_id, user_id) constraint backs the rule and a
/// duplicate surfaces as a conflict.
pub async fn add_participant(
    pool: &DbPool,
    meeting_id: i64,
    user_id: i64,
    role: MeetingRole,
) -> Result<i64, AppError> {
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO meeting_participants (meeting_id, user_id, meeting_role) \
         VALUES (?, ?, ?) RETURNING id",
    )
    .bind(meeting_id)
    .bind(user_id)
    .bind(role.as_str())
    .fetch_one(pool)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            AppError::Conflict("User is already a participant of this meeting".to_string())
        } else {
            AppError::from(e)
        }
    })?;
    Ok(id)
}

pub async fn find_participants(
    pool: &DbPool,
    meeting_id: i64,
) -> Result<Vec<Participant>, AppError> {
    #[derive(sqlx::FromRow)]
    struct Row {
        id: i64,
        user_id: i64,
        name: String,
        email: String,
        meeting_role: String,
    }

    let rows = sqlx::query_as::<_, Row>(
        "SELECT mp.id, mp.user_id, u.name, u.email, mp.meeting_role \
         FROM meeting_participants mp \
         JOIN users u ON u.id = mp.user_id \
         WHERE mp.meeting_id = ? \
         ORDER BY mp.id ASC",
    )
    .bind(meeting_id)
    .fetch_all(pool)
    .await?;

    rows.into_iter()
        .map(|r| {
            let meeting_role = MeetingRole::parse(&r.meeting_role).ok_or_else(|| {
                AppError::Db(sqlx::Error::Decode(
                    format!("unknown meeting_role '{}'", r.meeting_role).into(),
                ))
            })?;
            Ok(Participant {
                id: r.id,
                user_id: r.user_id,
                name: r.name,
                email: r.email,
                meeting_role,
            })
        })
        .collect()
}

/// Fetch a meeting with its participant roster.
pub async fn find_by_id(pool: &DbPool, id: i64) -> Result<Option<MeetingDetail>, AppError> {
    #[derive(sqlx::FromRow)]
    struct Row {
        id: i64,
        title: String,
        meeting_date: String,
        start_time: Option<String>,
        end_time: Option<String>,
        notes: String,
        created_by: i64,
        creator_name: String,
        created_at: String,
    }

    let row = sqlx::query_as::<_, Row>(
        "SELECT m.id, m.title, m.meeting_date, m.start_time, m.end_time, m.notes, \
                m.created_by, u.name AS creator_name, m.created_at \
         FROM meetings m \
         JOIN users u ON u.id = m.created_by \
         WHERE m.id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    let Some(r) = row else {
        return Ok(None);
    };

    let participants = find_participants(pool, r.id).await?;

    Ok(Some(MeetingDetail {
        id: r.id,
        title: r.title,
        meeting_date: r.meeting_date,
        start_time: r.start_time,
        end_time: r.end_time,
        notes: r.notes,
        created_by: r.created_by,
        creator_name: r.creator_name,
        created_at: r.created_at,
        participants,
    }))
}

/// List meetings newest date first, with a TTFU count per meeting.
pub async fn find_paginated(
    pool: &DbPool,
    page: i64,
    per_page: i64,
) -> Result<MeetingPage, AppError> {
    #[derive(sqlx::FromRow)]
    struct Row {
        id: i64,
        title: String,
        meeting_date: String,
        created_by: i64,
        creator_name: String,
        ttfu_count: i64,
    }

    let total_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM meetings")
        .fetch_one(pool)
        .await?;

    let offset = (page - 1) * per_page;
    let rows = sqlx::query_as::<_, Row>(
        "SELECT m.id, m.title, m.meeting_date, m.created_by, u.name AS creator_name, \
                (SELECT COUNT(*) FROM ttfus t WHERE t.meeting_id = m.id) AS ttfu_count \
         FROM meetings m \
         JOIN users u ON u.id = m.created_by \
         ORDER BY m.meeting_date DESC, m.id DESC \
         LIMIT ? OFFSET ?",
    )
    .bind(per_page)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    let meetings = rows
        .into_iter()
        .map(|r| MeetingListItem {
            id: r.id,
            title: r.title,
            meeting_date: r.meeting_date,
            created_by: r.created_by,
            creator_name: r.creator_name,
            ttfu_count: r.ttfu_count,
        })
        .collect();

    Ok(MeetingPage {
        meetings,
        page,
        per_page,
        total_count,
    })
}

pub async fn find_creator(pool: &DbPool, id: i64) -> Result<Option<i64>, AppError> {
    let created_by: Option<i64> = sqlx::query_scalar("SELECT created_by FROM meetings WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(created_by)
}

pub async fn exists(pool: &DbPool, id: i64) -> Result<bool, AppError> {
    let found: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM meetings WHERE id = ?)")
        .bind(id)
        .fetch_one(pool)
        .await?;
    Ok(found)
}

/// Delete a meeting; TTFUs, evidence and reviews go with it via the
/// cascade chain.
pub async fn delete(pool: &DbPool, id: i64) -> Result<(), AppError> {
    sqlx::query("DELETE FROM meetings WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}
