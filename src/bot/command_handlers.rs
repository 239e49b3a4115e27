//! Command Handlers module for processing bot commands

use anyhow::Result;
use sqlx::postgres::PgPool;
use teloxide::prelude::*;
use teloxide::types::ParseMode;
use tracing::{debug, warn};

use crate::db;
use crate::localization::{t_args_lang, t_lang, LocalizationManager, DEFAULT_LANG};

use super::admin::AdminGate;
use super::keyboards;

/// Handle the /start command: register the user and offer the language picker
pub async fn handle_start_command(
    bot: &Bot,
    msg: &Message,
    pool: &PgPool,
    loc: &LocalizationManager,
) -> Result<()> {
    let Some(from) = msg.from.as_ref() else {
        return Ok(());
    };
    debug!(user_id = %msg.chat.id, "Handling /start command");

    db::upsert_user(pool, from.id.0 as i64, from.username.as_deref(), None).await?;

    // The greeting is trilingual because no language is chosen yet.
    bot.send_message(msg.chat.id, t_lang(loc, "choose-language", DEFAULT_LANG))
        .reply_markup(keyboards::language_keyboard(loc))
        .await?;
    Ok(())
}

/// Handle the /admin command: show the admin console keyboard
pub async fn handle_admin_command(
    bot: &Bot,
    msg: &Message,
    loc: &LocalizationManager,
    gate: &AdminGate,
) -> Result<()> {
    let Some(from) = msg.from.as_ref() else {
        return Ok(());
    };
    let Some(_access) = gate.authorize(from.id.0 as i64) else {
        return Ok(());
    };

    bot.send_message(msg.chat.id, t_lang(loc, "admin-panel-title", DEFAULT_LANG))
        .parse_mode(ParseMode::Markdown)
        .reply_markup(keyboards::admin_keyboard(loc))
        .await?;
    Ok(())
}

/// Handle `/addtrack CODE STATUS...`: create or update a track's status and
/// notify its owner, if any, best effort
pub async fn handle_addtrack_command(
    bot: &Bot,
    msg: &Message,
    pool: &PgPool,
    loc: &LocalizationManager,
    gate: &AdminGate,
    args: &str,
) -> Result<()> {
    let Some(from) = msg.from.as_ref() else {
        return Ok(());
    };
    let Some(_access) = gate.authorize(from.id.0 as i64) else {
        return Ok(());
    };

    // Two arguments required: the code, then the status text (may contain
    // spaces).
    let usage = || t_lang(loc, "addtrack-usage", DEFAULT_LANG);
    let Some((code_raw, status)) = args.split_once(char::is_whitespace) else {
        bot.send_message(msg.chat.id, usage())
            .parse_mode(ParseMode::Markdown)
            .await?;
        return Ok(());
    };
    let status = status.trim();
    if status.is_empty() {
        bot.send_message(msg.chat.id, usage())
            .parse_mode(ParseMode::Markdown)
            .await?;
        return Ok(());
    }

    let code = code_raw.trim().to_uppercase();
    let owner = db::upsert_track_status(pool, &code, status, None).await?;

    if let Some(owner_id) = owner {
        let owner_lang = db::get_language(pool, owner_id).await?;
        let push = t_args_lang(
            loc,
            "status-update-push",
            &[("code", code.as_str()), ("status", status)],
            &owner_lang,
        );
        // The update stands even when the push bounces (blocked bot etc.).
        if let Err(err) = bot
            .send_message(ChatId(owner_id), push)
            .parse_mode(ParseMode::Markdown)
            .await
        {
            warn!(owner = %owner_id, code = %code, error = %err, "Status notification not delivered");
        }
    }

    let reply = t_args_lang(loc, "addtrack-done", &[("code", code.as_str())], DEFAULT_LANG);
    bot.send_message(msg.chat.id, reply)
        .parse_mode(ParseMode::Markdown)
        .await?;
    Ok(())
}
