use std::str::FromStr;

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};

use crate::auth::password;

pub type DbPool = SqlitePool;

pub const MIGRATIONS: &str = include_str!("schema.sql");

/// Open (creating if missing) the SQLite database with WAL and enforced
/// foreign keys.
pub async fn init_pool(database_path: &str) -> Result<DbPool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_path)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .foreign_keys(true);

    SqlitePoolOptions::new()
        .max_connections(8)
        .connect_with(options)
        .await
}

pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::raw_sql(MIGRATIONS).execute(pool).await?;
    log::info!("Database migrations complete");
    Ok(())
}

/// Seed the initial admin account if the user directory is empty.
///
/// Idempotent: a non-empty users table skips seeding entirely, so restarts
/// never reset credentials.
pub async fn seed_admin(pool: &DbPool, admin_password: &str) -> Result<(), sqlx::Error> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(pool)
        .await?;
    if count > 0 {
        log::info!("User directory already seeded ({count} users), skipping admin seed");
        return Ok(());
    }

    let hash = password::hash_password(admin_password)
        .unwrap_or_else(|e| panic!("Failed to hash admin password: {e}"));

    sqlx::query("INSERT INTO users (name, email, password, role) VALUES (?, ?, ?, 'admin')")
        .bind("admin")
        .bind("admin@example.com")
        .bind(&hash)
        .execute(pool)
        .await?;

    log::info!("Seeded default admin user (admin@example.com)");
    Ok(())
}
