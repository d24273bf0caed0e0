//! Bot initialization
//!
//! This module contains:
//! - Command enum definition
//! - Bot instance creation
//! - Command registration in the Telegram UI

use reqwest::ClientBuilder;
use secrecy::{ExposeSecret, SecretString};
use teloxide::prelude::*;
use teloxide::utils::command::BotCommands;

use crate::core::config;

/// Bot commands enum with descriptions
#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(rename_rule = "lowercase", description = "Я умею:")]
pub enum Command {
    #[command(description = "показывает условия использования и главное меню")]
    Start,
}

/// Creates a Bot instance with custom or default API URL
///
/// The token comes from the configuration document. `BOT_API_URL` points the
/// bot at a local Bot API server.
///
/// # Returns
/// * `Ok(Bot)` - Successfully created bot instance
/// * `Err(anyhow::Error)` - Invalid URL or HTTP client setup failure
pub fn create_bot(token: &SecretString) -> anyhow::Result<Bot> {
    let client = ClientBuilder::new().timeout(config::network::timeout()).build()?;
    let bot = Bot::with_client(token.expose_secret(), client);

    let bot = if let Ok(bot_api_url) = std::env::var("BOT_API_URL") {
        log::info!("Using custom Bot API URL: {}", bot_api_url);
        let url = url::Url::parse(&bot_api_url).map_err(|e| anyhow::anyhow!("Invalid BOT_API_URL: {}", e))?;
        bot.set_api_url(url)
    } else {
        bot
    };

    Ok(bot)
}

/// Sets up bot commands in Telegram UI
pub async fn setup_bot_commands(bot: &Bot) -> Result<(), teloxide::RequestError> {
    bot.set_my_commands(Command::bot_commands()).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_start_command() {
        assert_eq!(Command::parse("/start", "sheetbot").unwrap(), Command::Start);
        assert_eq!(Command::parse("/start@sheetbot", "sheetbot").unwrap(), Command::Start);
        assert!(Command::parse("/stop", "sheetbot").is_err());
    }

    #[test]
    fn registers_only_start() {
        let commands = Command::bot_commands();
        assert_eq!(commands.len(), 1);
        assert!(commands[0].command.ends_with("start"));
    }
}
