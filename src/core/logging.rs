//! Logging initialization and start-up diagnostics
//!
//! This module provides:
//! - Logger initialization (console + file)
//! - A start-up summary of what was loaded

use anyhow::Result;
use simplelog::*;
use std::str::FromStr;

use crate::core::config::BotConfig;

/// Parses a level name, falling back to `Info` on anything unknown.
pub fn parse_level(name: &str) -> LevelFilter {
    LevelFilter::from_str(name.trim()).unwrap_or(LevelFilter::Info)
}

/// Initialize logger for both console and file output
///
/// # Arguments
/// * `log_file_path` - Path to the log file (created or truncated)
/// * `level` - Level name, see [`parse_level`]
///
/// # Returns
/// * `Ok(())` - Logger initialized successfully
/// * `Err(anyhow::Error)` - Failed to create the file or a logger was already set
pub fn init_logger(log_file_path: &str, level: &str) -> Result<()> {
    let level = parse_level(level);
    let log_file =
        fs_err::File::create(log_file_path).map_err(|e| anyhow::anyhow!("Failed to create log file: {}", e))?;

    CombinedLogger::init(vec![
        TermLogger::new(level, Config::default(), TerminalMode::Mixed, ColorChoice::Auto),
        WriteLogger::new(level, Config::default(), log_file),
    ])
    .map_err(|e| anyhow::anyhow!("Failed to initialize logger: {}", e))?;

    Ok(())
}

/// Logs which optional collaborators are configured.
pub fn log_startup_configuration(config: &BotConfig, languages: &[&str], payment_url: &str) {
    log::info!("Sheet: {} ({})", config.sheet, config.table);
    if config.sheet_api.access_token.is_none() {
        log::warn!("sheet_api.access_token not set, spreadsheet calls will be unauthenticated");
    }
    log::info!("Languages loaded: {}", languages.join(", "));
    if payment_url.is_empty() {
        log::warn!("Payment URL is empty, the pay button will be hidden");
    } else {
        log::info!("Payment URL: {}", payment_url);
    }
    if config.maps.is_empty() {
        log::warn!("maps link not set, the map button will be hidden");
    }
    if config.terms.is_empty() {
        log::warn!("terms link not set");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_levels() {
        assert_eq!(parse_level("debug"), LevelFilter::Debug);
        assert_eq!(parse_level("WARN"), LevelFilter::Warn);
        assert_eq!(parse_level(" error "), LevelFilter::Error);
    }

    #[test]
    fn unknown_level_falls_back_to_info() {
        assert_eq!(parse_level("chatty"), LevelFilter::Info);
        assert_eq!(parse_level(""), LevelFilter::Info);
    }
}
