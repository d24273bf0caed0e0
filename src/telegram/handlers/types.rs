//! Handler types and dependencies

use teloxide::types::{Message, User};

use crate::session::SessionDispatcher;

/// Error type for handlers
pub type HandlerError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Dependencies required by handlers
#[derive(Clone)]
pub struct HandlerDeps {
    pub dispatcher: SessionDispatcher,
}

impl HandlerDeps {
    pub fn new(dispatcher: SessionDispatcher) -> Self {
        Self { dispatcher }
    }
}

/// Profile id for a Telegram user, falling back to the chat id.
pub(super) fn user_id(from: Option<&User>, chat_id: i64) -> i64 {
    from.and_then(|u| i64::try_from(u.id.0).ok()).unwrap_or(chat_id)
}

pub(super) fn message_user_id(msg: &Message) -> i64 {
    user_id(msg.from.as_ref(), msg.chat.id.0)
}
