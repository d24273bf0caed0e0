use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::sync::Arc;
use teloxide::prelude::*;
use tokio::time::sleep;

use sheetbot::cli::{Cli, Commands};
use sheetbot::core::logging::log_startup_configuration;
use sheetbot::core::retry::{polling_backoff, until_connected};
use sheetbot::core::{config, init_logger, AppError, BotConfig};
use sheetbot::i18n::Localization;
use sheetbot::services::{http_client, payment_url_or_empty, FileMediaStore, SheetsClient, YooKassaClient};
use sheetbot::session::{BotContext, Links, SessionDispatcher};
use sheetbot::storage::ProfileStore;
use sheetbot::telegram::{create_bot, schema, setup_bot_commands, HandlerDeps, TelegramTransport};

/// Main entry point for the Telegram bot
///
/// Parses CLI arguments and dispatches to the subcommand.
///
/// # Errors
/// Returns an error if initialization fails (logging, configuration, database).
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();

    // Load environment variables from .env if present
    let _ = dotenv();

    init_logger(&config::LOG_FILE_PATH, &config::LOG_LEVEL)?;

    match cli.command {
        Some(Commands::CheckConfig) => check_config(),
        Some(Commands::Run) | None => run_bot().await,
    }
}

/// Loads the configuration document, logging and wrapping failures.
fn load_config() -> Result<BotConfig> {
    BotConfig::load(config::CONFIG_PATH.as_str())
        .inspect_err(|e| log::error!("{}", e))
        .with_context(|| format!("cannot start without {}", config::CONFIG_PATH.as_str()))
}

fn load_locales() -> Result<Localization> {
    Localization::load_dir(config::LOCALES_DIR.as_str(), &config::DEFAULT_LANGUAGE)
        .inspect_err(|e| log::error!("{}", e))
        .with_context(|| format!("cannot load localization from {}", config::LOCALES_DIR.as_str()))
}

fn check_config() -> Result<()> {
    let bot_config = load_config()?;
    let locales = load_locales()?;
    let languages: Vec<&str> = locales.languages().collect();

    println!("Configuration: {}", config::CONFIG_PATH.as_str());
    println!("  table:     {}", bot_config.table);
    println!("  sheet:     {}", bot_config.sheet);
    println!("  maps:      {}", bot_config.maps);
    println!("  terms:     {}", bot_config.terms);
    println!("Languages:   {} (fallback {})", languages.join(", "), locales.fallback());
    for language in &languages {
        let missing = locales_missing(&locales, language);
        if !missing.is_empty() {
            println!("  {} is missing: {}", language, missing.join(", "));
        }
    }
    Ok(())
}

fn locales_missing(locales: &Localization, language: &str) -> Vec<String> {
    use strum::IntoEnumIterator;

    sheetbot::i18n::TextKey::iter()
        .filter(|key| locales.lookup(language, *key).is_err())
        .map(|key| key.path())
        .collect()
}

async fn run_bot() -> Result<()> {
    log::info!("Starting bot...");

    let bot_config = load_config()?;
    let locales = load_locales()?;
    let store = ProfileStore::open(&config::DATABASE_PATH).context("cannot open profile store")?;
    let client = http_client()?;

    let payment = YooKassaClient::new(client.clone(), &bot_config.ym_data)?;
    let payment_url = payment_url_or_empty(&payment).await;

    let languages: Vec<&str> = locales.languages().collect();
    log_startup_configuration(&bot_config, &languages, &payment_url);

    let sheet = Arc::new(SheetsClient::from_config(client, &bot_config)?);
    let links = Links {
        terms: bot_config.terms.clone(),
        map: bot_config.maps.clone(),
        payment: payment_url,
    };
    let ctx = Arc::new(BotContext::new(locales, links, bot_config.sheet.clone()));

    let bot = create_bot(&bot_config.token)?;

    let me = until_connected("get_me", config::network::reconnect_delay(), || async {
        bot.get_me().await.map_err(AppError::from)
    })
    .await?;
    log::info!("Bot username: {:?}, Bot ID: {}", me.username, me.id);

    if let Err(e) = setup_bot_commands(&bot).await {
        log::warn!("Failed to register bot commands: {}", e);
    }

    let dispatcher = SessionDispatcher::new(
        ctx,
        store,
        Arc::new(TelegramTransport::new(bot.clone())),
        sheet,
        Arc::new(FileMediaStore::new(config::MEDIA_DIR.as_str())),
    );
    let handler = schema(HandlerDeps::new(dispatcher));

    // Polling errors back off inside the listener; a panic restarts the whole dispatcher
    loop {
        let bot_clone = bot.clone();
        let handler_clone = handler.clone();

        // A separate task isolates panics inside the listener
        let handle = tokio::spawn(async move {
            use teloxide::update_listeners::Polling;

            let listener = Polling::builder(bot_clone.clone())
                .drop_pending_updates()
                .backoff_strategy(polling_backoff)
                .build();

            Dispatcher::builder(bot_clone, handler_clone)
                .dependencies(DependencyMap::new())
                .enable_ctrlc_handler()
                .build()
                .dispatch_with_listener(
                    listener,
                    LoggingErrorHandler::with_custom_text("An error from the update listener"),
                )
                .await
        });

        match handle.await {
            Ok(()) => {
                log::info!("Dispatcher shutdown gracefully");
                break;
            }
            Err(join_err) => {
                if join_err.is_panic() {
                    log::error!("Dispatcher panicked: {}", join_err);
                } else {
                    log::warn!("Dispatcher task was cancelled: {}", join_err);
                }
                log::info!("Reconnecting in {} seconds...", config::network::RECONNECT_DELAY_SECS);
                sleep(config::network::reconnect_delay()).await;
            }
        }
    }

    Ok(())
}
