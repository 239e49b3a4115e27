//! Handlers for tapped menu labels: screen navigation, informational texts,
//! and the prompts that arm a pending input state.

use anyhow::Result;
use sqlx::postgres::PgPool;
use teloxide::prelude::*;
use teloxide::types::ParseMode;
use tracing::debug;

use crate::db;
use crate::dialogue::{ChatDialogue, ChatState};
use crate::localization::{t_args_lang, t_lang, Lang, LocalizationManager};
use crate::pricing::CalcMode;

use super::admin::{self, AdminAccess};
use super::keyboards::{self, MenuAction};

/// Dispatch a resolved menu action.
///
/// `access` is `Some` only when the sender passed the admin gate; the caller
/// has already dropped unauthorized admin actions.
#[allow(clippy::too_many_arguments)]
pub async fn handle_menu_action(
    bot: &Bot,
    msg: &Message,
    pool: &PgPool,
    dialogue: &ChatDialogue,
    loc: &LocalizationManager,
    action: MenuAction,
    access: Option<AdminAccess>,
) -> Result<()> {
    let Some(from) = msg.from.as_ref() else {
        return Ok(());
    };
    let user_id = from.id.0 as i64;

    match action {
        MenuAction::SelectLanguage(lang) => {
            select_language(bot, msg, pool, loc, lang).await?;
        }
        MenuAction::CheckTrack => {
            let lang = db::get_language(pool, user_id).await?;
            dialogue.update(ChatState::AwaitingTrackCodes).await?;
            bot.send_message(msg.chat.id, t_lang(loc, "ask-tracks", &lang))
                .await?;
        }
        MenuAction::MyTracks => {
            show_my_tracks(bot, msg, pool, loc, user_id).await?;
        }
        MenuAction::OpenCalculator => {
            let lang = db::get_language(pool, user_id).await?;
            bot.send_message(msg.chat.id, t_lang(loc, "calc-choose", &lang))
                .reply_markup(keyboards::calculator_keyboard(loc, &lang))
                .await?;
        }
        MenuAction::CalcByWeight => {
            prompt_calculator(bot, msg, pool, dialogue, loc, CalcMode::ByWeight).await?;
        }
        MenuAction::CalcByVolume => {
            prompt_calculator(bot, msg, pool, dialogue, loc, CalcMode::ByVolume).await?;
        }
        MenuAction::Settings => {
            let lang = db::get_language(pool, user_id).await?;
            bot.send_message(msg.chat.id, t_lang(loc, "settings-title", &lang))
                .reply_markup(keyboards::language_keyboard(loc))
                .await?;
        }
        MenuAction::InfoMenu => {
            let lang = db::get_language(pool, user_id).await?;
            bot.send_message(msg.chat.id, t_lang(loc, "info-title", &lang))
                .reply_markup(keyboards::info_keyboard(loc, &lang))
                .await?;
        }
        MenuAction::Tariffs => {
            send_info_text(bot, msg, pool, loc, user_id, "tariffs-text").await?;
        }
        MenuAction::ChinaAddress => {
            send_info_text(bot, msg, pool, loc, user_id, "china-address-text").await?;
        }
        MenuAction::PickupPoint => {
            send_info_text(bot, msg, pool, loc, user_id, "pickup-text").await?;
        }
        MenuAction::Operator => {
            send_info_text(bot, msg, pool, loc, user_id, "operator-text").await?;
        }
        MenuAction::ForbiddenGoods => {
            send_info_text(bot, msg, pool, loc, user_id, "forbidden-text").await?;
        }
        MenuAction::BackToMain => {
            let lang = db::get_language(pool, user_id).await?;
            bot.send_message(msg.chat.id, t_lang(loc, "home-title", &lang))
                .reply_markup(keyboards::main_menu_keyboard(loc, &lang))
                .await?;
        }
        MenuAction::AdminStats => {
            if let Some(access) = access {
                admin::handle_stats(bot, msg, pool, loc, access).await?;
            }
        }
        MenuAction::AdminBroadcast => {
            if let Some(access) = access {
                admin::prompt_broadcast(bot, msg, dialogue, loc, access).await?;
            }
        }
        MenuAction::AdminAddTrack => {
            if let Some(access) = access {
                admin::prompt_add_track(bot, msg, loc, access).await?;
            }
        }
        MenuAction::AdminDeleteTrack => {
            if let Some(access) = access {
                admin::prompt_delete_track(bot, msg, dialogue, loc, access).await?;
            }
        }
    }
    Ok(())
}

/// Persist the selected language and show the main menu in it
async fn select_language(
    bot: &Bot,
    msg: &Message,
    pool: &PgPool,
    loc: &LocalizationManager,
    lang: Lang,
) -> Result<()> {
    let Some(from) = msg.from.as_ref() else {
        return Ok(());
    };
    debug!(user_id = %msg.chat.id, lang = %lang.code(), "Language selected");

    db::upsert_user(
        pool,
        from.id.0 as i64,
        from.username.as_deref(),
        Some(lang.code()),
    )
    .await?;

    bot.send_message(msg.chat.id, t_lang(loc, "language-saved", lang.code()))
        .reply_markup(keyboards::main_menu_keyboard(loc, lang.code()))
        .await?;
    Ok(())
}

/// List the user's claimed tracks, newest update first
async fn show_my_tracks(
    bot: &Bot,
    msg: &Message,
    pool: &PgPool,
    loc: &LocalizationManager,
    user_id: i64,
) -> Result<()> {
    let lang = db::get_language(pool, user_id).await?;
    let tracks = db::list_tracks_for_user(pool, user_id).await?;

    if tracks.is_empty() {
        bot.send_message(msg.chat.id, t_lang(loc, "no-tracks", &lang))
            .await?;
        return Ok(());
    }

    let lines: Vec<String> = tracks
        .iter()
        .map(|track| {
            t_args_lang(
                loc,
                "my-tracks-line",
                &[
                    ("code", track.code.as_str()),
                    ("status", track.status.as_str()),
                ],
                &lang,
            )
        })
        .collect();

    bot.send_message(msg.chat.id, lines.join("\n"))
        .parse_mode(ParseMode::Markdown)
        .await?;
    Ok(())
}

/// Arm a calculator mode and ask for the value
async fn prompt_calculator(
    bot: &Bot,
    msg: &Message,
    pool: &PgPool,
    dialogue: &ChatDialogue,
    loc: &LocalizationManager,
    mode: CalcMode,
) -> Result<()> {
    let Some(from) = msg.from.as_ref() else {
        return Ok(());
    };
    let lang = db::get_language(pool, from.id.0 as i64).await?;

    dialogue.update(ChatState::Calculating { mode }).await?;

    let key = match mode {
        CalcMode::ByWeight => "calc-ask-weight",
        CalcMode::ByVolume => "calc-ask-volume",
    };
    bot.send_message(msg.chat.id, t_lang(loc, key, &lang))
        .await?;
    Ok(())
}

/// Send one of the static informational texts
async fn send_info_text(
    bot: &Bot,
    msg: &Message,
    pool: &PgPool,
    loc: &LocalizationManager,
    user_id: i64,
    key: &str,
) -> Result<()> {
    let lang = db::get_language(pool, user_id).await?;
    bot.send_message(msg.chat.id, t_lang(loc, key, &lang))
        .parse_mode(ParseMode::Markdown)
        .await?;
    Ok(())
}
