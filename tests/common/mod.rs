//! Shared test infrastructure.
//!
//! `setup_test_db()` creates a temporary SQLite database with the full
//! schema applied; the returned `TestDb` keeps the temp dir alive for as
//! long as the pool is used. Helpers seed users, meetings and TTFUs
//! through the same model functions the handlers call.

use tempfile::TempDir;

use pdca_tracker::auth::password;
use pdca_tracker::db::{self, DbPool};
use pdca_tracker::models::meeting::{self, NewMeeting};
use pdca_tracker::models::ttfu::{self, NewTtfu};
use pdca_tracker::models::user::{self, NewUser, Role};

#[allow(dead_code)]
pub const TEST_PASSWORD: &str = "Password1!";

pub struct TestDb {
    _dir: TempDir,
    pool: DbPool,
}

impl TestDb {
    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

pub async fn setup_test_db() -> TestDb {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = dir.path().join("test.db");
    let pool = db::init_pool(db_path.to_str().expect("utf-8 path"))
        .await
        .expect("Failed to open test DB");
    db::run_migrations(&pool)
        .await
        .expect("Failed to run migrations");
    TestDb { _dir: dir, pool }
}

/// Create a user with the shared test password and the given role.
#[allow(dead_code)]
pub async fn create_user(pool: &DbPool, name: &str, email: &str, role: Role) -> i64 {
    let hash = password::hash_password(TEST_PASSWORD).expect("hash");
    let new_user = NewUser {
        name: name.to_string(),
        email: email.to_string(),
        password: hash,
        role,
    };
    user::create(pool, &new_user).await.expect("create user")
}

#[allow(dead_code)]
pub async fn create_meeting(pool: &DbPool, created_by: i64, title: &str, date: &str) -> i64 {
    let new_meeting = NewMeeting {
        title: title.to_string(),
        meeting_date: date.to_string(),
        start_time: None,
        end_time: None,
        notes: String::new(),
    };
    meeting::create(pool, &new_meeting, created_by)
        .await
        .expect("create meeting")
}

#[allow(dead_code)]
pub async fn create_ttfu(
    pool: &DbPool,
    meeting_id: i64,
    title: &str,
    assignee_id: i64,
    reviewer_id: i64,
) -> i64 {
    let new_ttfu = NewTtfu {
        meeting_id,
        title: title.to_string(),
        description: String::new(),
        assignee_id,
        reviewer_id,
        due_date: None,
    };
    ttfu::create(pool, &new_ttfu).await.expect("create ttfu")
}
