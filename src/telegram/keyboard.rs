//! Rendered keyboards → Telegram reply markup.

use teloxide::types::{
    InlineKeyboardButton, InlineKeyboardMarkup, KeyboardButton, KeyboardMarkup, KeyboardRemove, ReplyMarkup,
};
use url::Url;

use crate::session::render::{ButtonKind, Keyboard, RenderedButton};

/// Inline buttons per row.
pub const ROW_WIDTH: usize = 2;

fn is_back(button: &RenderedButton) -> bool {
    matches!(&button.kind, ButtonKind::Callback(data) if data.ends_with(":back"))
}

fn inline_button(button: &RenderedButton) -> Option<InlineKeyboardButton> {
    match &button.kind {
        ButtonKind::Callback(data) => Some(InlineKeyboardButton::callback(button.label.clone(), data.clone())),
        ButtonKind::Url(url) => match Url::parse(url) {
            Ok(url) => Some(InlineKeyboardButton::url(button.label.clone(), url)),
            Err(e) => {
                log::warn!("Dropping '{}' button with bad URL {}: {}", button.label, url, e);
                None
            }
        },
    }
}

/// Lays buttons out [`ROW_WIDTH`] per row; the back button gets a row of its own.
pub fn inline_keyboard(buttons: &[RenderedButton]) -> InlineKeyboardMarkup {
    let (back, rest): (Vec<&RenderedButton>, Vec<&RenderedButton>) = buttons.iter().partition(|b| is_back(b));

    let mut rows: Vec<Vec<InlineKeyboardButton>> = rest
        .chunks(ROW_WIDTH)
        .map(|chunk| chunk.iter().filter_map(|b| inline_button(b)).collect::<Vec<_>>())
        .filter(|row| !row.is_empty())
        .collect();
    rows.extend(back.into_iter().filter_map(inline_button).map(|b| vec![b]));

    InlineKeyboardMarkup::new(rows)
}

/// One-time reply keyboard, all options in one row.
pub fn reply_keyboard(options: &[String]) -> KeyboardMarkup {
    KeyboardMarkup::new(vec![options.iter().map(|o| KeyboardButton::new(o.clone())).collect::<Vec<_>>()])
        .resize_keyboard()
        .one_time_keyboard()
}

/// Markup for a message, `None` when it has no keyboard.
pub fn reply_markup(keyboard: &Keyboard) -> Option<ReplyMarkup> {
    match keyboard {
        Keyboard::None => None,
        Keyboard::Inline(buttons) => Some(ReplyMarkup::InlineKeyboard(inline_keyboard(buttons))),
        Keyboard::Reply(options) => Some(ReplyMarkup::Keyboard(reply_keyboard(options))),
        Keyboard::Remove => Some(ReplyMarkup::KeyboardRemove(KeyboardRemove::new())),
    }
}
