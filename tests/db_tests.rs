use anyhow::{Context, Result};
use sqlx::PgPool;
use std::env;
use zfd_cargo_bot::db::*;

/// Helper macro to skip tests when database is not available
macro_rules! skip_if_no_db {
    ($test_fn:expr) => {
        match setup_test_db().await {
            Ok(pool) => $test_fn(&pool).await,
            Err(_) => {
                eprintln!("Skipping test: Database not available");
                Ok(())
            }
        }
    };
}

async fn setup_test_db() -> Result<PgPool> {
    // Skip tests if no DATABASE_URL is provided
    let database_url = match env::var("DATABASE_URL") {
        Ok(url) => url,
        Err(_) => {
            eprintln!("Skipping database tests: DATABASE_URL not set");
            return Err(anyhow::anyhow!("Test database not configured"));
        }
    };

    let pool = PgPool::connect(&database_url)
        .await
        .context("Failed to connect to test database")?;

    init_database_schema(&pool).await?;

    Ok(pool)
}

/// Remove rows left over from a previous run of the same test. Each test uses
/// its own code/user prefix so tests can run in parallel against one database.
async fn cleanup(pool: &PgPool, code_prefix: &str, user_ids: &[i64]) -> Result<()> {
    sqlx::query("DELETE FROM tracks WHERE code LIKE $1")
        .bind(format!("{}%", code_prefix))
        .execute(pool)
        .await?;
    for user_id in user_ids {
        sqlx::query("DELETE FROM users WHERE user_id = $1")
            .bind(user_id)
            .execute(pool)
            .await?;
    }
    Ok(())
}

#[tokio::test]
async fn test_upsert_user_idempotent() -> Result<()> {
    skip_if_no_db!(test_upsert_user_idempotent_impl)
}

async fn test_upsert_user_idempotent_impl(pool: &PgPool) -> Result<()> {
    cleanup(pool, "UPSERT-", &[910_001]).await?;

    upsert_user(pool, 910_001, Some("alice"), Some("tj")).await?;
    upsert_user(pool, 910_001, Some("alice"), Some("tj")).await?;

    let row = sqlx::query_as::<_, (i64, Option<String>, String)>(
        "SELECT user_id, username, lang FROM users WHERE user_id = $1",
    )
    .bind(910_001i64)
    .fetch_all(pool)
    .await?;

    assert_eq!(row.len(), 1, "repeat upsert must not duplicate the row");
    assert_eq!(row[0].1.as_deref(), Some("alice"));
    assert_eq!(row[0].2, "tj");
    Ok(())
}

#[tokio::test]
async fn test_upsert_user_refreshes_handle_and_language() -> Result<()> {
    skip_if_no_db!(test_upsert_user_refreshes_impl)
}

async fn test_upsert_user_refreshes_impl(pool: &PgPool) -> Result<()> {
    cleanup(pool, "REFRESH-", &[910_002]).await?;

    upsert_user(pool, 910_002, Some("old_handle"), None).await?;
    assert_eq!(get_language(pool, 910_002).await?, "ru");

    upsert_user(pool, 910_002, Some("new_handle"), Some("uz")).await?;
    assert_eq!(get_language(pool, 910_002).await?, "uz");

    let (username,) =
        sqlx::query_as::<_, (Option<String>,)>("SELECT username FROM users WHERE user_id = $1")
            .bind(910_002i64)
            .fetch_one(pool)
            .await?;
    assert_eq!(username.as_deref(), Some("new_handle"));
    Ok(())
}

#[tokio::test]
async fn test_get_language_defaults_for_unknown_user() -> Result<()> {
    skip_if_no_db!(test_get_language_default_impl)
}

async fn test_get_language_default_impl(pool: &PgPool) -> Result<()> {
    assert_eq!(get_language(pool, -1).await?, "ru");
    Ok(())
}

#[tokio::test]
async fn test_claim_track_first_wins() -> Result<()> {
    skip_if_no_db!(test_claim_track_first_wins_impl)
}

async fn test_claim_track_first_wins_impl(pool: &PgPool) -> Result<()> {
    cleanup(pool, "CLAIM-A", &[]).await?;

    bulk_insert_tracks(pool, &["CLAIM-A1".to_string()]).await?;

    assert!(claim_track(pool, "CLAIM-A1", 111).await?);
    assert!(
        !claim_track(pool, "CLAIM-A1", 222).await?,
        "second claim must lose"
    );

    let track = find_track(pool, "CLAIM-A1").await?.expect("track exists");
    assert_eq!(track.user_id, Some(111));
    assert_eq!(track.status, DEFAULT_TRACK_STATUS);
    Ok(())
}

#[tokio::test]
async fn test_claim_track_concurrent_single_owner() -> Result<()> {
    skip_if_no_db!(test_claim_track_concurrent_impl)
}

async fn test_claim_track_concurrent_impl(pool: &PgPool) -> Result<()> {
    cleanup(pool, "CLAIM-B", &[]).await?;

    bulk_insert_tracks(pool, &["CLAIM-B1".to_string()]).await?;

    let (first, second) = tokio::join!(
        claim_track(pool, "CLAIM-B1", 333),
        claim_track(pool, "CLAIM-B1", 444),
    );
    let wins = [first?, second?].iter().filter(|won| **won).count();
    assert_eq!(wins, 1, "exactly one concurrent claim may win");

    let owner = find_track(pool, "CLAIM-B1").await?.unwrap().user_id;
    assert!(owner == Some(333) || owner == Some(444));
    Ok(())
}

#[tokio::test]
async fn test_upsert_track_status_preserves_owner() -> Result<()> {
    skip_if_no_db!(test_upsert_track_status_impl)
}

async fn test_upsert_track_status_impl(pool: &PgPool) -> Result<()> {
    cleanup(pool, "STATUS-", &[]).await?;

    // New track with no owner supplied
    let owner = upsert_track_status(pool, "STATUS-1", "На складе", None).await?;
    assert_eq!(owner, None);

    assert!(claim_track(pool, "STATUS-1", 555).await?);

    // Update with no owner supplied keeps the claim and reports the owner
    let owner = upsert_track_status(pool, "STATUS-1", "Выдан", None).await?;
    assert_eq!(owner, Some(555));

    let track = find_track(pool, "STATUS-1").await?.unwrap();
    assert_eq!(track.user_id, Some(555));
    assert_eq!(track.status, "Выдан");
    Ok(())
}

#[tokio::test]
async fn test_bulk_insert_counts_only_new_codes() -> Result<()> {
    skip_if_no_db!(test_bulk_insert_impl)
}

async fn test_bulk_insert_impl(pool: &PgPool) -> Result<()> {
    cleanup(pool, "BULK-", &[]).await?;

    let codes = vec![
        "BULK-1".to_string(),
        "BULK-2".to_string(),
        "BULK-1".to_string(), // duplicate inside the batch
    ];
    assert_eq!(bulk_insert_tracks(pool, &codes).await?, 2);

    // Re-uploading the same file inserts nothing new
    assert_eq!(bulk_insert_tracks(pool, &codes).await?, 0);

    let track = find_track(pool, "BULK-2").await?.unwrap();
    assert_eq!(track.status, DEFAULT_TRACK_STATUS);
    assert_eq!(track.user_id, None);
    Ok(())
}

#[tokio::test]
async fn test_list_tracks_most_recently_updated_first() -> Result<()> {
    skip_if_no_db!(test_list_tracks_impl)
}

async fn test_list_tracks_impl(pool: &PgPool) -> Result<()> {
    cleanup(pool, "LIST-", &[]).await?;

    bulk_insert_tracks(pool, &["LIST-1".to_string(), "LIST-2".to_string()]).await?;
    assert!(claim_track(pool, "LIST-1", 666).await?);
    assert!(claim_track(pool, "LIST-2", 666).await?);

    // Touch LIST-1 so it becomes the most recently updated
    upsert_track_status(pool, "LIST-1", "Выдан", None).await?;

    let tracks = list_tracks_for_user(pool, 666).await?;
    let codes: Vec<&str> = tracks.iter().map(|t| t.code.as_str()).collect();
    assert_eq!(codes, vec!["LIST-1", "LIST-2"]);
    Ok(())
}

#[tokio::test]
async fn test_delete_track() -> Result<()> {
    skip_if_no_db!(test_delete_track_impl)
}

async fn test_delete_track_impl(pool: &PgPool) -> Result<()> {
    cleanup(pool, "DEL-", &[]).await?;

    bulk_insert_tracks(pool, &["DEL-11".to_string()]).await?;

    assert!(delete_track(pool, "DEL-11").await?);
    assert!(
        !delete_track(pool, "DEL-11").await?,
        "deleting a missing track is a quiet no-op"
    );
    assert!(find_track(pool, "DEL-11").await?.is_none());
    Ok(())
}

#[tokio::test]
async fn test_counts() -> Result<()> {
    skip_if_no_db!(test_counts_impl)
}

async fn test_counts_impl(pool: &PgPool) -> Result<()> {
    cleanup(pool, "COUNT-", &[910_003]).await?;

    let tracks_before = count_tracks(pool).await?;
    let users_before = count_users(pool).await?;

    bulk_insert_tracks(pool, &["COUNT-1".to_string()]).await?;
    upsert_user(pool, 910_003, None, None).await?;

    // Other tests may insert rows in parallel, so only a lower bound holds.
    assert!(count_tracks(pool).await? >= tracks_before + 1);
    assert!(count_users(pool).await? >= users_before + 1);
    Ok(())
}

#[tokio::test]
async fn test_list_user_ids_contains_upserted_user() -> Result<()> {
    skip_if_no_db!(test_list_user_ids_impl)
}

async fn test_list_user_ids_impl(pool: &PgPool) -> Result<()> {
    cleanup(pool, "IDS-", &[910_004]).await?;

    upsert_user(pool, 910_004, None, None).await?;
    let ids = list_user_ids(pool).await?;
    assert!(ids.contains(&910_004));
    Ok(())
}
