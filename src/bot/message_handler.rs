//! Message Handler module: routes each incoming message to its handler.
//!
//! Dispatch priority for a text message:
//! 1. command token (/start, /admin, /addtrack),
//! 2. menu label in any language (a tap cancels pending input),
//! 3. the chat's pending input state (track codes, calculator, admin),
//! 4. otherwise the message is ignored.
//!
//! Documents are handled before text: an uploaded file from an admin is a
//! bulk track list.

use anyhow::Result;
use sqlx::postgres::PgPool;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::ParseMode;
use tracing::debug;

use crate::config::AppConfig;
use crate::db;
use crate::dialogue::{AdminTask, ChatDialogue, ChatState};
use crate::localization::{t_args_lang, t_lang, LocalizationManager};
use crate::pricing::{self, CalcMode};
use crate::validation::{extract_track_codes, parse_decimal};

use super::admin::{self, AdminGate};
use super::keyboards::{MenuAction, MenuIndex};
use super::{command_handlers, menu_handlers};

/// Where a text message should be dispatched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route<'a> {
    Start,
    AdminPanel,
    AddTrack { args: &'a str },
    Menu(MenuAction),
    TrackCodes,
    CalcInput(CalcMode),
    AdminInput(AdminTask),
    Ignore,
}

/// Split a leading bot command from its arguments, tolerating the
/// `/command@botname` form used in group chats
fn parse_command(text: &str) -> Option<(&str, &str)> {
    let trimmed = text.trim();
    if !trimmed.starts_with('/') {
        return None;
    }
    let (head, args) = trimmed
        .split_once(char::is_whitespace)
        .unwrap_or((trimmed, ""));
    let command = head.trim_start_matches('/');
    let command = command.split('@').next().unwrap_or(command);
    Some((command, args.trim()))
}

/// Pure routing decision over (text, pending state, admin flag).
///
/// Menu labels outrank pending input so a keyboard tap always works as a
/// cancellation; a pending admin prompt is only honored for admins.
pub fn route_message<'a>(
    text: &'a str,
    state: &ChatState,
    is_admin: bool,
    menus: &MenuIndex,
) -> Route<'a> {
    if let Some((command, args)) = parse_command(text) {
        match command {
            "start" => return Route::Start,
            "admin" => return Route::AdminPanel,
            "addtrack" => return Route::AddTrack { args },
            // Unknown commands fall through to state handling.
            _ => {}
        }
    }

    if let Some(action) = menus.resolve(text) {
        return Route::Menu(action);
    }

    match state {
        ChatState::AwaitingTrackCodes => Route::TrackCodes,
        ChatState::Calculating { mode } => Route::CalcInput(*mode),
        ChatState::AdminPrompt { task } if is_admin => Route::AdminInput(*task),
        _ => Route::Ignore,
    }
}

/// Main message entry point wired into the dispatcher
#[allow(clippy::too_many_arguments)]
pub async fn message_handler(
    bot: Bot,
    msg: Message,
    pool: Arc<PgPool>,
    dialogue: ChatDialogue,
    loc: Arc<LocalizationManager>,
    menus: Arc<MenuIndex>,
    gate: Arc<AdminGate>,
    config: Arc<AppConfig>,
) -> Result<()> {
    // Service messages and channel posts carry no author; nothing to do.
    let Some(from) = msg.from.as_ref() else {
        return Ok(());
    };
    let user_id = from.id.0 as i64;

    if msg.document().is_some() {
        return admin::handle_document_upload(&bot, &msg, &pool, &loc, &gate).await;
    }

    let Some(text) = msg.text() else {
        return Ok(());
    };
    debug!(user_id = %msg.chat.id, message_length = text.len(), "Received text message");

    let state = dialogue.get().await?.unwrap_or_default();
    let access = gate.authorize(user_id);

    match route_message(text, &state, access.is_some(), &menus) {
        Route::Start => command_handlers::handle_start_command(&bot, &msg, &pool, &loc).await,
        Route::AdminPanel => command_handlers::handle_admin_command(&bot, &msg, &loc, &gate).await,
        Route::AddTrack { args } => {
            command_handlers::handle_addtrack_command(&bot, &msg, &pool, &loc, &gate, args).await
        }
        Route::Menu(action) => {
            // Admin labels from regular users are dropped before any state
            // change, exactly like the admin commands.
            if action.requires_admin() && access.is_none() {
                return Ok(());
            }
            // A recognized tap cancels whatever input was pending.
            if state != ChatState::Idle {
                dialogue.exit().await?;
            }
            menu_handlers::handle_menu_action(&bot, &msg, &pool, &dialogue, &loc, action, access)
                .await
        }
        Route::TrackCodes => {
            handle_track_codes_input(&bot, &msg, &pool, &dialogue, &loc, user_id, text).await
        }
        Route::CalcInput(mode) => {
            handle_calc_input(&bot, &msg, &pool, &dialogue, &loc, user_id, mode, text).await
        }
        Route::AdminInput(task) => {
            let Some(access) = access else {
                return Ok(());
            };
            admin::handle_admin_input(
                &bot, &msg, &pool, &dialogue, &loc, &config, task, text, access,
            )
            .await
        }
        Route::Ignore => Ok(()),
    }
}

/// Consume a pending track-code submission: one reply line per valid input
/// line, in input order, claiming unowned tracks for the requester
async fn handle_track_codes_input(
    bot: &Bot,
    msg: &Message,
    pool: &PgPool,
    dialogue: &ChatDialogue,
    loc: &LocalizationManager,
    user_id: i64,
    text: &str,
) -> Result<()> {
    let lang = db::get_language(pool, user_id).await?;
    let codes = extract_track_codes(text);

    let mut lines = Vec::with_capacity(codes.len());
    for code in &codes {
        match db::find_track(pool, code).await? {
            Some(track) => {
                if track.user_id.is_none() {
                    // First lookup claims the track; losing the race just
                    // means someone else claimed it a moment earlier.
                    let _ = db::claim_track(pool, code, user_id).await?;
                }
                lines.push(t_args_lang(
                    loc,
                    "track-status-line",
                    &[("code", code.as_str()), ("status", track.status.as_str())],
                    &lang,
                ));
            }
            None => {
                lines.push(t_args_lang(
                    loc,
                    "track-not-found-line",
                    &[("code", code.as_str())],
                    &lang,
                ));
            }
        }
    }

    dialogue.exit().await?;

    let reply = if lines.is_empty() {
        t_lang(loc, "track-no-valid-codes", &lang)
    } else {
        lines.join("\n")
    };
    bot.send_message(msg.chat.id, reply)
        .parse_mode(ParseMode::Markdown)
        .await?;
    Ok(())
}

/// Consume a pending calculator value and reply with the quote
#[allow(clippy::too_many_arguments)]
async fn handle_calc_input(
    bot: &Bot,
    msg: &Message,
    pool: &PgPool,
    dialogue: &ChatDialogue,
    loc: &LocalizationManager,
    user_id: i64,
    mode: CalcMode,
    text: &str,
) -> Result<()> {
    let lang = db::get_language(pool, user_id).await?;

    // Clear first so a bad parse cannot wedge the chat in calculator mode.
    dialogue.exit().await?;

    match parse_decimal(text) {
        Ok(value) => {
            let quote = pricing::quote(mode, value);
            let amount = quote.amount.to_string();
            let price = quote.unit_price.to_string();
            let total = format!("{:.2}", quote.total);

            let (key, amount_arg) = match mode {
                CalcMode::ByWeight => ("calc-weight-result", "weight"),
                CalcMode::ByVolume => ("calc-volume-result", "volume"),
            };
            let reply = t_args_lang(
                loc,
                key,
                &[
                    (amount_arg, amount.as_str()),
                    ("price", price.as_str()),
                    ("total", total.as_str()),
                ],
                &lang,
            );
            bot.send_message(msg.chat.id, reply)
                .parse_mode(ParseMode::Markdown)
                .await?;
        }
        Err(err) => {
            debug!(user_id = %user_id, error = %err, "Calculator input rejected");
            bot.send_message(msg.chat.id, t_lang(loc, "calc-not-a-number", &lang))
                .await?;
        }
    }
    Ok(())
}
