//! Telegram bot handler tree configuration
//!
//! This module provides the main dispatcher schema for the Telegram bot.
//! The handlers only translate updates into [`Inbound`](crate::session::Inbound)
//! events; all behavior lives in the session dispatcher.

mod events;
mod schema;
mod types;

pub use events::{callback_inbound, command_inbound, largest_photo, media_inbound, text_inbound};
pub use schema::schema;
pub use types::{HandlerDeps, HandlerError};
