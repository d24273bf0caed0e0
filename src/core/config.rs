use figment::providers::{Env, Format, Json};
use figment::Figment;
use once_cell::sync::Lazy;
use secrecy::SecretString;
use serde::Deserialize;
use std::env;
use std::path::Path;
use std::time::Duration;

use crate::core::error::{AppError, AppResult};

/// Path to the bot configuration document
/// Read from CONFIG_PATH environment variable
/// Default: config.json
pub static CONFIG_PATH: Lazy<String> = Lazy::new(|| env::var("CONFIG_PATH").unwrap_or_else(|_| "config.json".to_string()));

/// SQLite file holding the `users` table
/// Read from DATABASE_PATH environment variable
/// Default: data/users.sqlite
pub static DATABASE_PATH: Lazy<String> =
    Lazy::new(|| env::var("DATABASE_PATH").unwrap_or_else(|_| "data/users.sqlite".to_string()));

/// Directory with one `lang_<code>.json` file per supported language
/// Read from LOCALES_DIR environment variable
/// Default: data/lang
pub static LOCALES_DIR: Lazy<String> = Lazy::new(|| env::var("LOCALES_DIR").unwrap_or_else(|_| "data/lang".to_string()));

/// Directory where received photos are stored
/// Read from MEDIA_DIR environment variable
/// Default: data/img
pub static MEDIA_DIR: Lazy<String> = Lazy::new(|| env::var("MEDIA_DIR").unwrap_or_else(|_| "data/img".to_string()));

/// Log file path
/// Read from LOG_FILE_PATH environment variable
/// Default: sheetbot.log
pub static LOG_FILE_PATH: Lazy<String> =
    Lazy::new(|| env::var("LOG_FILE_PATH").unwrap_or_else(|_| "sheetbot.log".to_string()));

/// Log level name (error, warn, info, debug, trace)
/// Read from LOG_LEVEL environment variable
/// Default: info
pub static LOG_LEVEL: Lazy<String> = Lazy::new(|| env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()));

/// Language given to new profiles and used when a stored language has no bundle
/// Read from DEFAULT_LANGUAGE environment variable
/// Default: ru
pub static DEFAULT_LANGUAGE: Lazy<String> =
    Lazy::new(|| env::var("DEFAULT_LANGUAGE").unwrap_or_else(|_| "ru".to_string()));

/// Prefix for environment overrides of the configuration document
pub const ENV_PREFIX: &str = "SHEETBOT_";

/// Network configuration
pub mod network {
    use super::Duration;

    /// Delay between reconnect attempts to the Bot API
    pub const RECONNECT_DELAY_SECS: u64 = 5;

    /// Timeout for every outbound HTTP request (Telegram, spreadsheet, payment)
    pub const TIMEOUT_SECS: u64 = 30;

    pub fn reconnect_delay() -> Duration {
        Duration::from_secs(RECONNECT_DELAY_SECS)
    }

    pub fn timeout() -> Duration {
        Duration::from_secs(TIMEOUT_SECS)
    }
}

/// Profile store configuration
pub mod store {
    use super::Duration;

    /// Maximum connections in the SQLite pool
    pub const POOL_SIZE: u32 = 4;

    /// Attempts for a store operation before StoreUnavailable reaches the user
    pub const RETRY_ATTEMPTS: usize = 3;

    /// Delay between store attempts (in milliseconds)
    pub const RETRY_DELAY_MS: u64 = 200;

    /// SQLite busy timeout (in milliseconds)
    pub const BUSY_TIMEOUT_MS: u64 = 5000;

    pub fn retry_delay() -> Duration {
        Duration::from_millis(RETRY_DELAY_MS)
    }

    pub fn busy_timeout() -> Duration {
        Duration::from_millis(BUSY_TIMEOUT_MS)
    }
}

/// Spreadsheet cells the bot reads and writes
pub mod sheet {
    /// Cell shown on the table screen
    pub const READ_CELL: &str = "A1";

    /// Cell receiving dates typed by users
    pub const WRITE_CELL: &str = "A2";

    /// Sheet used when the document names none
    pub const DEFAULT_SHEET: &str = "Sheet1";

    pub const DEFAULT_API_URL: &str = "https://sheets.googleapis.com";
}

/// Payment gateway defaults
pub mod payment {
    pub const DEFAULT_API_URL: &str = "https://api.yookassa.ru";
}

/// The bot configuration document.
///
/// Loaded once before the bot starts and never mutated afterwards.
#[derive(Debug, Deserialize)]
pub struct BotConfig {
    /// Telegram bot token
    pub token: SecretString,
    /// Spreadsheet URL (or bare spreadsheet id)
    pub table: String,
    /// Sheet name inside the spreadsheet
    #[serde(default = "default_sheet")]
    pub sheet: String,
    #[serde(default)]
    pub sheet_api: SheetApiConfig,
    /// Payment gateway credentials and the payment body sent at start-up
    pub ym_data: PaymentConfig,
    /// Link behind the map button
    #[serde(default)]
    pub maps: String,
    /// Link to the terms of use shown on the terms prompt
    #[serde(default)]
    pub terms: String,
}

#[derive(Debug, Deserialize)]
pub struct SheetApiConfig {
    #[serde(default)]
    pub access_token: Option<SecretString>,
    #[serde(default = "default_sheet_api_url")]
    pub base_url: String,
}

impl Default for SheetApiConfig {
    fn default() -> Self {
        Self {
            access_token: None,
            base_url: default_sheet_api_url(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct PaymentConfig {
    pub client_id: String,
    pub client_secret: SecretString,
    /// Request body for the payment creation call, passed through as-is
    #[serde(default)]
    pub payload: serde_json::Value,
    #[serde(default = "default_payment_api_url")]
    pub base_url: String,
}

fn default_sheet() -> String {
    sheet::DEFAULT_SHEET.to_string()
}

fn default_sheet_api_url() -> String {
    sheet::DEFAULT_API_URL.to_string()
}

fn default_payment_api_url() -> String {
    payment::DEFAULT_API_URL.to_string()
}

impl BotConfig {
    /// Loads the document at `path`, then applies `SHEETBOT_*` environment overrides.
    ///
    /// # Errors
    /// * `ConfigMissing` - the file does not exist
    /// * `ConfigInvalid` - the file cannot be parsed or misses required fields
    pub fn load(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(AppError::ConfigMissing(path.display().to_string()));
        }

        let config: BotConfig = Figment::new()
            .merge(Json::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .map_err(|e| AppError::ConfigInvalid(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> AppResult<()> {
        use secrecy::ExposeSecret;

        if self.token.expose_secret().trim().is_empty() {
            return Err(AppError::ConfigInvalid("token is empty".to_string()));
        }
        if self.table.trim().is_empty() {
            return Err(AppError::ConfigInvalid("table is empty".to_string()));
        }
        Ok(())
    }
}
