//! Update → [`Inbound`] mapping.
//!
//! Telegram does not tell which screen a message was typed on, so plain
//! messages are attributed to the screen that expects them: commands to
//! `Welcome`, text to `TermsPending` (the only reply keyboard), photos to
//! `Menu`. Button presses carry their screen in the callback payload.

use teloxide::types::PhotoSize;

use crate::session::dispatcher::{Inbound, Origin};
use crate::session::screen::{parse_callback, Event, MediaRef, Screen};

pub fn command_inbound(user_id: i64, chat_id: i64) -> Inbound {
    Inbound {
        user_id,
        chat_id,
        screen: Screen::Welcome,
        event: Event::Start,
        origin: Origin::Message,
    }
}

pub fn text_inbound(user_id: i64, chat_id: i64, text: &str) -> Inbound {
    Inbound {
        user_id,
        chat_id,
        screen: Screen::TermsPending,
        event: Event::Text(text.to_string()),
        origin: Origin::Message,
    }
}

pub fn media_inbound(user_id: i64, chat_id: i64, media: MediaRef) -> Inbound {
    Inbound {
        user_id,
        chat_id,
        screen: Screen::Menu,
        event: Event::Media(media),
        origin: Origin::Message,
    }
}

/// `None` for payloads this bot never produced.
pub fn callback_inbound(
    user_id: i64,
    chat_id: i64,
    data: &str,
    query_id: String,
    message_id: i32,
) -> Option<Inbound> {
    let (screen, action) = parse_callback(data)?;
    Some(Inbound {
        user_id,
        chat_id,
        screen,
        event: Event::Button(action),
        origin: Origin::Callback { query_id, message_id },
    })
}

/// The biggest size Telegram offers for a photo.
pub fn largest_photo(sizes: &[PhotoSize]) -> Option<MediaRef> {
    sizes
        .iter()
        .max_by_key(|p| u64::from(p.width) * u64::from(p.height))
        .map(|p| MediaRef {
            file_id: p.file.id.0.clone(),
        })
}
