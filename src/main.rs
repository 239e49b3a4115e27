use anyhow::Result;
use sqlx::postgres::PgPool;
use std::sync::Arc;
use std::time::Duration;
use teloxide::dispatching::dialogue::InMemStorage;
use teloxide::prelude::*;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use zfd_cargo_bot::bot::{self, AdminGate, MenuIndex};
use zfd_cargo_bot::config::AppConfig;
use zfd_cargo_bot::db;
use zfd_cargo_bot::dialogue::{ChatDialogue, ChatState};
use zfd_cargo_bot::health;
use zfd_cargo_bot::localization;

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file first
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::from_env()?;

    // The liveness endpoint comes up first so the platform health check
    // passes even while the rest of the startup is still in flight.
    let _liveness_handle = health::spawn_liveness_server(config.port);

    // A missing token keeps the process (and the health endpoint) alive so
    // the platform does not restart-loop it while the deployment is fixed.
    let Some(bot_token) = config.bot_token.clone() else {
        error!("TELEGRAM_BOT_TOKEN is not set; serving only the liveness endpoint");
        std::future::pending::<()>().await;
        return Ok(());
    };

    info!("Initializing database connection");
    let pool = PgPool::connect(&config.database_url).await?;
    db::init_database_schema(&pool).await?;

    // Wrap shared state in Arc for sharing across async tasks
    let shared_pool = Arc::new(pool);
    let localization_manager = localization::create_localization_manager()?;
    let menu_index = Arc::new(MenuIndex::build(&localization_manager));
    if !menu_index.conflicts().is_empty() {
        error!(
            conflicts = ?menu_index.conflicts(),
            "Ambiguous menu labels detected; routing for these labels is undefined"
        );
    }
    let admin_gate = Arc::new(AdminGate::from_config(&config));
    let shared_config = Arc::new(config);

    // Initialize the bot with a bounded-timeout client for better reliability
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(shared_config.http_timeout_secs))
        .build()
        .expect("Failed to create HTTP client");

    let bot = Bot::with_client(bot_token, client);

    info!("Bot initialized, starting dispatcher");

    // Create shared dialogue storage
    let dialogue_storage = InMemStorage::<ChatState>::new();

    // Set up the dispatcher; every message goes through the single router
    let handler = dptree::entry().branch(Update::filter_message().endpoint({
        let pool = Arc::clone(&shared_pool);
        let storage = dialogue_storage.clone();
        let loc = Arc::clone(&localization_manager);
        let menus = Arc::clone(&menu_index);
        let gate = Arc::clone(&admin_gate);
        let config = Arc::clone(&shared_config);
        move |bot: Bot, msg: Message| {
            let pool = Arc::clone(&pool);
            let storage = storage.clone();
            let loc = Arc::clone(&loc);
            let menus = Arc::clone(&menus);
            let gate = Arc::clone(&gate);
            let config = Arc::clone(&config);
            let dialogue = ChatDialogue::new(storage, msg.chat.id);
            async move {
                bot::message_handler(bot, msg, pool, dialogue, loc, menus, gate, config).await
            }
        }
    }));

    Dispatcher::builder(bot, handler)
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}
