//! Dispatcher schema and handler chain builders

use teloxide::dispatching::{UpdateFilterExt, UpdateHandler};
use teloxide::prelude::*;
use teloxide::types::Message;

use super::events::{callback_inbound, command_inbound, largest_photo, media_inbound, text_inbound};
use super::types::{message_user_id, user_id, HandlerDeps, HandlerError};
use crate::session::{Inbound, MediaRef};
use crate::telegram::bot::Command;

/// Creates the main dispatcher schema for the Telegram bot.
///
/// The same schema is used in production and in integration tests.
///
/// # Arguments
/// * `deps` - Handler dependencies (the session dispatcher)
pub fn schema(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    let deps_commands = deps.clone();
    let deps_photos = deps.clone();
    let deps_text = deps.clone();
    let deps_callback = deps;

    dptree::entry()
        .branch(command_handler(deps_commands))
        .branch(photo_handler(deps_photos))
        .branch(text_handler(deps_text))
        .branch(callback_handler(deps_callback))
}

/// Runs one event through the session dispatcher.
///
/// Failures were already shown to the user; they only need logging here.
async fn dispatch(deps: &HandlerDeps, inbound: Inbound) {
    let user_id = inbound.user_id;
    if let Err(e) = deps.dispatcher.handle(inbound).await {
        log::error!("Event of user {} failed: {}", user_id, e);
    }
}

fn command_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_message().branch(dptree::entry().filter_command::<Command>().endpoint(
        move |msg: Message, cmd: Command| {
            let deps = deps.clone();
            async move {
                log::info!("Received command: {:?} from chat {}", cmd, msg.chat.id);
                match cmd {
                    Command::Start => dispatch(&deps, command_inbound(message_user_id(&msg), msg.chat.id.0)).await,
                }
                Ok(())
            }
        },
    ))
}

fn photo_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_message()
        .filter_map(|msg: Message| msg.photo().and_then(largest_photo))
        .endpoint(move |msg: Message, media: MediaRef| {
            let deps = deps.clone();
            async move {
                dispatch(&deps, media_inbound(message_user_id(&msg), msg.chat.id.0, media)).await;
                Ok(())
            }
        })
}

fn text_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_message()
        .filter_map(|msg: Message| msg.text().map(str::to_string))
        .endpoint(move |msg: Message, text: String| {
            let deps = deps.clone();
            async move {
                dispatch(&deps, text_inbound(message_user_id(&msg), msg.chat.id.0, &text)).await;
                Ok(())
            }
        })
}

fn callback_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_callback_query().endpoint(move |bot: Bot, q: CallbackQuery| {
        let deps = deps.clone();
        async move {
            let chat_id = q.message.as_ref().map(|m| m.chat().id.0);
            let message_id = q.message.as_ref().map(|m| m.id().0);
            let data = q.data.as_deref().unwrap_or_default();

            let inbound = match (chat_id, message_id) {
                (Some(chat_id), Some(message_id)) => callback_inbound(
                    user_id(Some(&q.from), chat_id),
                    chat_id,
                    data,
                    q.id.0.clone(),
                    message_id,
                ),
                _ => None,
            };

            match inbound {
                Some(inbound) => dispatch(&deps, inbound).await,
                None => {
                    log::warn!("Ignoring callback '{}' from user {}", data, q.from.id);
                    bot.answer_callback_query(q.id.clone()).await?;
                }
            }
            Ok(())
        }
    })
}
