//! Sheetbot - Telegram front-end for a spreadsheet, a user store and a payment link
//!
//! Users accept the terms of use, pick a language and navigate a small menu:
//! read a spreadsheet cell, send a photo back, open a map or a payment link.
//! Typing a `dd.mm.yyyy` date anywhere writes it to the spreadsheet.
//!
//! # Module Structure
//!
//! - `core`: Configuration, errors, logging, retry policies and profile types
//! - `i18n`: Localization table loaded from per-language JSON files
//! - `storage`: SQLite profile store and migrations
//! - `session`: Navigation engine and the session dispatcher
//! - `services`: Spreadsheet, payment and media collaborators
//! - `telegram`: Telegram bot integration and handlers

pub mod cli;
pub mod core;
pub mod i18n;
pub mod services;
pub mod session;
pub mod storage;
pub mod telegram;

// Re-export commonly used types for convenience
pub use crate::core::{config, AppError, AppResult, BotConfig};
pub use i18n::{Localization, TextKey};
pub use session::{BotContext, Inbound, NavigationEngine, Screen, SessionDispatcher};
pub use storage::{create_pool, get_connection, DbConnection, DbPool, ProfileStore};
pub use telegram::{create_bot, schema, setup_bot_commands, HandlerDeps};
