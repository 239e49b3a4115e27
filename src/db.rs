use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPool;
use sqlx::Row;
use tracing::{debug, info};

/// Status a track carries until an admin updates it
pub const DEFAULT_TRACK_STATUS: &str = "В пути";

/// Represents a shipment track in the database
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    pub id: i64,
    pub code: String,
    /// Telegram id of the user who claimed the track, if anyone has
    pub user_id: Option<i64>,
    pub status: String,
    pub updated_at: DateTime<Utc>,
}

/// Represents a chat user in the database
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub user_id: i64,
    pub username: Option<String>,
    pub lang: String,
    pub created_at: DateTime<Utc>,
}

/// Initialize the database schema
pub async fn init_database_schema(pool: &PgPool) -> Result<()> {
    info!("Initializing database schema");

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS tracks (
            id BIGSERIAL PRIMARY KEY,
            code TEXT UNIQUE NOT NULL,
            user_id BIGINT,
            status TEXT NOT NULL DEFAULT 'В пути',
            updated_at TIMESTAMPTZ NOT NULL DEFAULT CURRENT_TIMESTAMP
        )",
    )
    .execute(pool)
    .await
    .context("Failed to create tracks table")?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS users (
            user_id BIGINT PRIMARY KEY,
            username TEXT,
            lang VARCHAR(8) NOT NULL DEFAULT 'ru',
            created_at TIMESTAMPTZ NOT NULL DEFAULT CURRENT_TIMESTAMP
        )",
    )
    .execute(pool)
    .await
    .context("Failed to create users table")?;

    sqlx::query("CREATE INDEX IF NOT EXISTS tracks_user_id_idx ON tracks(user_id)")
        .execute(pool)
        .await
        .context("Failed to create tracks user_id index")?;

    info!("Database schema initialized successfully");
    Ok(())
}

/// Create a user row if absent; refresh handle/language when provided.
///
/// Safe to call repeatedly with identical arguments.
pub async fn upsert_user(
    pool: &PgPool,
    user_id: i64,
    username: Option<&str>,
    lang: Option<&str>,
) -> Result<()> {
    debug!(user_id = %user_id, "Upserting user");

    sqlx::query("INSERT INTO users (user_id, username) VALUES ($1, $2) ON CONFLICT (user_id) DO NOTHING")
        .bind(user_id)
        .bind(username)
        .execute(pool)
        .await
        .context("Failed to insert user")?;

    if let Some(lang) = lang {
        sqlx::query("UPDATE users SET lang = $1 WHERE user_id = $2")
            .bind(lang)
            .bind(user_id)
            .execute(pool)
            .await
            .context("Failed to update user language")?;
    }

    if let Some(username) = username {
        sqlx::query("UPDATE users SET username = $1 WHERE user_id = $2")
            .bind(username)
            .bind(user_id)
            .execute(pool)
            .await
            .context("Failed to update username")?;
    }

    Ok(())
}

/// Get a user's stored language, defaulting to Russian for unknown users
pub async fn get_language(pool: &PgPool, user_id: i64) -> Result<String> {
    let row = sqlx::query("SELECT lang FROM users WHERE user_id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await
        .context("Failed to get user language")?;

    Ok(row
        .map(|row| row.get::<String, _>(0))
        .unwrap_or_else(|| "ru".to_string()))
}

/// Look up a track by its normalized code
pub async fn find_track(pool: &PgPool, code: &str) -> Result<Option<Track>> {
    let row =
        sqlx::query("SELECT id, code, user_id, status, updated_at FROM tracks WHERE code = $1")
            .bind(code)
            .fetch_optional(pool)
            .await
            .context("Failed to find track")?;

    Ok(row.map(|row| Track {
        id: row.get(0),
        code: row.get(1),
        user_id: row.get(2),
        status: row.get(3),
        updated_at: row.get(4),
    }))
}

/// Attach an owner to a track only if it has none yet.
///
/// A single conditional statement so that two users racing for the same code
/// cannot both win; returns whether this caller became the owner.
pub async fn claim_track(pool: &PgPool, code: &str, user_id: i64) -> Result<bool> {
    let result = sqlx::query("UPDATE tracks SET user_id = $1 WHERE code = $2 AND user_id IS NULL")
        .bind(user_id)
        .bind(code)
        .execute(pool)
        .await
        .context("Failed to claim track")?;

    let claimed = result.rows_affected() > 0;
    if claimed {
        debug!(user_id = %user_id, code = %code, "Track claimed");
    }
    Ok(claimed)
}

/// List a user's claimed tracks, most recently updated first
pub async fn list_tracks_for_user(pool: &PgPool, user_id: i64) -> Result<Vec<Track>> {
    let rows = sqlx::query(
        "SELECT id, code, user_id, status, updated_at FROM tracks WHERE user_id = $1 ORDER BY updated_at DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
    .context("Failed to list tracks for user")?;

    Ok(rows
        .into_iter()
        .map(|row| Track {
            id: row.get(0),
            code: row.get(1),
            user_id: row.get(2),
            status: row.get(3),
            updated_at: row.get(4),
        })
        .collect())
}

/// Create or update a track's status, refreshing its timestamp.
///
/// An existing owner is preserved when `user_id` is `None`. Returns the
/// effective owner so the caller can push a status notification.
pub async fn upsert_track_status(
    pool: &PgPool,
    code: &str,
    status: &str,
    user_id: Option<i64>,
) -> Result<Option<i64>> {
    let row = sqlx::query(
        "INSERT INTO tracks (code, status, user_id) VALUES ($1, $2, $3)
         ON CONFLICT (code) DO UPDATE SET
             status = EXCLUDED.status,
             user_id = COALESCE(tracks.user_id, EXCLUDED.user_id),
             updated_at = CURRENT_TIMESTAMP
         RETURNING user_id",
    )
    .bind(code)
    .bind(status)
    .bind(user_id)
    .fetch_one(pool)
    .await
    .context("Failed to upsert track status")?;

    Ok(row.get(0))
}

/// Delete a track; returns whether a row existed
pub async fn delete_track(pool: &PgPool, code: &str) -> Result<bool> {
    let result = sqlx::query("DELETE FROM tracks WHERE code = $1")
        .bind(code)
        .execute(pool)
        .await
        .context("Failed to delete track")?;

    Ok(result.rows_affected() > 0)
}

/// Insert codes that are not present yet, with the default status.
///
/// Each code is one insert-if-absent statement; duplicates (in the batch or in
/// the table) are skipped without aborting the rest. Returns how many rows
/// were actually inserted.
pub async fn bulk_insert_tracks(pool: &PgPool, codes: &[String]) -> Result<u64> {
    let mut inserted = 0u64;

    for code in codes {
        let result =
            sqlx::query("INSERT INTO tracks (code) VALUES ($1) ON CONFLICT (code) DO NOTHING")
                .bind(code)
                .execute(pool)
                .await
                .with_context(|| format!("Failed to insert track {}", code))?;
        inserted += result.rows_affected();
    }

    info!(
        inserted = inserted,
        submitted = codes.len(),
        "Bulk track insert completed"
    );
    Ok(inserted)
}

/// Count all tracks
pub async fn count_tracks(pool: &PgPool) -> Result<i64> {
    let row = sqlx::query("SELECT COUNT(*) FROM tracks")
        .fetch_one(pool)
        .await
        .context("Failed to count tracks")?;
    Ok(row.get(0))
}

/// Count all users
pub async fn count_users(pool: &PgPool) -> Result<i64> {
    let row = sqlx::query("SELECT COUNT(*) FROM users")
        .fetch_one(pool)
        .await
        .context("Failed to count users")?;
    Ok(row.get(0))
}

/// List every known user id, for broadcast delivery
pub async fn list_user_ids(pool: &PgPool) -> Result<Vec<i64>> {
    let rows = sqlx::query("SELECT user_id FROM users")
        .fetch_all(pool)
        .await
        .context("Failed to list user ids")?;

    Ok(rows.into_iter().map(|row| row.get(0)).collect())
}
