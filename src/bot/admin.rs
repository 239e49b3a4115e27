//! Admin console: authorization gate, statistics, broadcast, track deletion,
//! and bulk track upload from a text document.
//!
//! Every privileged entry point runs through [`AdminGate::authorize`].
//! Unauthorized requests are dropped without a reply so the admin surface
//! stays invisible to regular users.

use anyhow::{Context, Result};
use sqlx::postgres::PgPool;
use std::time::Duration;
use teloxide::prelude::*;
use teloxide::types::{FileId, ParseMode};
use tracing::{debug, error, info, warn};

use crate::config::AppConfig;
use crate::db;
use crate::dialogue::{AdminTask, ChatDialogue, ChatState};
use crate::localization::{t_args_lang, t_lang, LocalizationManager, DEFAULT_LANG};
use crate::validation::extract_track_codes;

/// Fixed allow-list of administrator user ids
pub struct AdminGate {
    ids: Vec<i64>,
}

/// Proof that a user id passed the gate; privileged handlers require it
#[derive(Clone, Copy, Debug)]
pub struct AdminAccess {
    pub user_id: i64,
}

impl AdminGate {
    pub fn new(ids: Vec<i64>) -> Self {
        Self { ids }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.admin_ids.clone())
    }

    /// Check the allow-list; `None` means the caller must stay silent
    pub fn authorize(&self, user_id: i64) -> Option<AdminAccess> {
        if self.ids.contains(&user_id) {
            Some(AdminAccess { user_id })
        } else {
            None
        }
    }
}

/// Outcome of one broadcast delivery attempt
#[derive(Debug, Clone, PartialEq)]
pub struct DeliveryOutcome {
    pub user_id: i64,
    pub delivered: bool,
}

/// Show track/user counts
pub async fn handle_stats(
    bot: &Bot,
    msg: &Message,
    pool: &PgPool,
    loc: &LocalizationManager,
    _access: AdminAccess,
) -> Result<()> {
    let tracks = db::count_tracks(pool).await?;
    let users = db::count_users(pool).await?;

    let reply = t_args_lang(
        loc,
        "admin-stats",
        &[
            ("tracks", tracks.to_string().as_str()),
            ("users", users.to_string().as_str()),
        ],
        DEFAULT_LANG,
    );
    bot.send_message(msg.chat.id, reply)
        .parse_mode(ParseMode::Markdown)
        .await?;
    Ok(())
}

/// Ask for the broadcast text
pub async fn prompt_broadcast(
    bot: &Bot,
    msg: &Message,
    dialogue: &ChatDialogue,
    loc: &LocalizationManager,
    _access: AdminAccess,
) -> Result<()> {
    dialogue
        .update(ChatState::AdminPrompt {
            task: AdminTask::Broadcast,
        })
        .await?;
    bot.send_message(msg.chat.id, t_lang(loc, "admin-broadcast-prompt", DEFAULT_LANG))
        .await?;
    Ok(())
}

/// Point the admin at the /addtrack command
pub async fn prompt_add_track(
    bot: &Bot,
    msg: &Message,
    loc: &LocalizationManager,
    _access: AdminAccess,
) -> Result<()> {
    bot.send_message(msg.chat.id, t_lang(loc, "admin-add-usage", DEFAULT_LANG))
        .parse_mode(ParseMode::Markdown)
        .await?;
    Ok(())
}

/// Ask for the track code to delete
pub async fn prompt_delete_track(
    bot: &Bot,
    msg: &Message,
    dialogue: &ChatDialogue,
    loc: &LocalizationManager,
    _access: AdminAccess,
) -> Result<()> {
    dialogue
        .update(ChatState::AdminPrompt {
            task: AdminTask::DeleteTrack,
        })
        .await?;
    bot.send_message(msg.chat.id, t_lang(loc, "admin-delete-prompt", DEFAULT_LANG))
        .await?;
    Ok(())
}

/// Consume the free-text message completing a pending admin action
pub async fn handle_admin_input(
    bot: &Bot,
    msg: &Message,
    pool: &PgPool,
    dialogue: &ChatDialogue,
    loc: &LocalizationManager,
    config: &AppConfig,
    task: AdminTask,
    text: &str,
    _access: AdminAccess,
) -> Result<()> {
    dialogue.exit().await?;

    match task {
        AdminTask::Broadcast => {
            let outcomes = broadcast_message(
                bot,
                pool,
                text,
                Duration::from_millis(config.broadcast_delay_ms),
            )
            .await?;
            let delivered = outcomes.iter().filter(|o| o.delivered).count();

            let reply = t_args_lang(
                loc,
                "broadcast-done",
                &[("delivered", delivered.to_string().as_str())],
                DEFAULT_LANG,
            );
            bot.send_message(msg.chat.id, reply).await?;
        }
        AdminTask::DeleteTrack => {
            let code = text.trim().to_uppercase();
            db::delete_track(pool, &code).await?;

            let reply = t_args_lang(loc, "track-deleted", &[("code", code.as_str())], DEFAULT_LANG);
            bot.send_message(msg.chat.id, reply)
                .parse_mode(ParseMode::Markdown)
                .await?;
        }
    }
    Ok(())
}

/// Deliver a message to every known user, best effort.
///
/// Deliveries run sequentially with a pacing delay to stay under Telegram's
/// outbound rate limits. Per-recipient failures (blocked bot, deactivated
/// account) are logged and recorded, never propagated.
pub async fn broadcast_message(
    bot: &Bot,
    pool: &PgPool,
    text: &str,
    delay: Duration,
) -> Result<Vec<DeliveryOutcome>> {
    let user_ids = db::list_user_ids(pool).await?;
    info!(recipients = user_ids.len(), "Starting broadcast");

    let mut outcomes = Vec::with_capacity(user_ids.len());
    for user_id in user_ids {
        let delivered = match bot.send_message(ChatId(user_id), text).await {
            Ok(_) => true,
            Err(err) => {
                warn!(user_id = %user_id, error = %err, "Broadcast delivery failed");
                false
            }
        };
        outcomes.push(DeliveryOutcome { user_id, delivered });
        tokio::time::sleep(delay).await;
    }

    info!(
        delivered = outcomes.iter().filter(|o| o.delivered).count(),
        total = outcomes.len(),
        "Broadcast finished"
    );
    Ok(outcomes)
}

/// Handle an uploaded document as a bulk track list (admin only)
pub async fn handle_document_upload(
    bot: &Bot,
    msg: &Message,
    pool: &PgPool,
    loc: &LocalizationManager,
    gate: &AdminGate,
) -> Result<()> {
    let Some(from) = msg.from.as_ref() else {
        return Ok(());
    };
    // Documents from regular users are none of our business.
    let Some(_access) = gate.authorize(from.id.0 as i64) else {
        return Ok(());
    };
    let Some(document) = msg.document() else {
        return Ok(());
    };

    debug!(user_id = %msg.chat.id, "Received track list document");

    match import_track_document(bot, pool, document.file.id.clone()).await {
        Ok(inserted) => {
            let reply = t_args_lang(
                loc,
                "upload-done",
                &[("count", inserted.to_string().as_str())],
                DEFAULT_LANG,
            );
            bot.send_message(msg.chat.id, reply).await?;
        }
        Err(err) => {
            error!(user_id = %msg.chat.id, error = %err, "Bulk track upload failed");
            let reply = t_args_lang(
                loc,
                "upload-failed",
                &[("error", err.to_string().as_str())],
                DEFAULT_LANG,
            );
            bot.send_message(msg.chat.id, reply).await?;
        }
    }
    Ok(())
}

async fn import_track_document(bot: &Bot, pool: &PgPool, file_id: FileId) -> Result<u64> {
    let content = download_text_file(bot, file_id).await?;
    let codes = extract_track_codes(&content);
    db::bulk_insert_tracks(pool, &codes).await
}

/// Download a Telegram file and decode it as text, replacing invalid bytes
async fn download_text_file(bot: &Bot, file_id: FileId) -> Result<String> {
    let file = bot.get_file(file_id).await.context("Failed to resolve file")?;
    let url = format!(
        "https://api.telegram.org/file/bot{}/{}",
        bot.token(),
        file.path
    );

    let response = reqwest::get(&url).await.context("Failed to download file")?;
    let bytes = response.bytes().await.context("Failed to read file body")?;

    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
