//! [`Transport`] over the Telegram Bot API.

use async_trait::async_trait;
use teloxide::net::Download;
use teloxide::prelude::*;
use teloxide::types::{CallbackQueryId, FileId, InputFile, MessageId};
use teloxide::{ApiError, RequestError};

use crate::core::error::{AppError, AppResult};
use crate::session::dispatcher::{Outbound, Transport};
use crate::session::render::Keyboard;
use crate::session::screen::MediaRef;
use crate::telegram::keyboard::{inline_keyboard, reply_markup};

#[derive(Clone)]
pub struct TelegramTransport {
    bot: Bot,
}

impl TelegramTransport {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl Transport for TelegramTransport {
    async fn send(&self, chat_id: i64, outbound: Outbound) -> AppResult<()> {
        let chat_id = ChatId(chat_id);
        match outbound {
            Outbound::Message(screen) => {
                let request = self.bot.send_message(chat_id, screen.text);
                match reply_markup(&screen.keyboard) {
                    Some(markup) => request.reply_markup(markup).await?,
                    None => request.await?,
                };
            }
            Outbound::Edit { message_id, screen } => {
                let request = self.bot.edit_message_text(chat_id, MessageId(message_id), screen.text);
                let result = match &screen.keyboard {
                    Keyboard::Inline(buttons) => request.reply_markup(inline_keyboard(buttons)).await,
                    _ => request.await,
                };
                match result {
                    Ok(_) => {}
                    // Pressing the same button twice
                    Err(RequestError::Api(ApiError::MessageNotModified)) => {
                        log::debug!("Message {} in chat {} not modified", message_id, chat_id)
                    }
                    Err(e) => return Err(e.into()),
                }
            }
            Outbound::Toast { query_id, text } => {
                let request = self.bot.answer_callback_query(CallbackQueryId(query_id));
                match text {
                    Some(text) => request.text(text).await?,
                    None => request.await?,
                };
            }
            Outbound::Photo { media, caption } => {
                self.bot
                    .send_photo(chat_id, InputFile::file_id(FileId(media.file_id)))
                    .caption(caption)
                    .await?;
            }
        }
        Ok(())
    }

    async fn fetch_media(&self, media: &MediaRef) -> AppResult<Vec<u8>> {
        let file = self.bot.get_file(FileId(media.file_id.clone())).await?;
        log::debug!("Fetching {} ({} bytes)", file.path, file.size);

        let mut bytes = Vec::with_capacity(file.size as usize);
        self.bot
            .download_file(&file.path, &mut bytes)
            .await
            .map_err(|e| AppError::Media(format!("download {}: {}", file.path, e)))?;
        Ok(bytes)
    }
}
