//! Session dispatcher: one inbound event in, profile updates and outbound
//! messages out.
//!
//! For every event the dispatcher
//! 1. serializes on the user id,
//! 2. loads the profile (creating it when a non-start event arrives first),
//! 3. asks the [`NavigationEngine`] for the transition,
//! 4. applies profile deltas and side effects,
//! 5. renders the outputs and hands them to the [`Transport`].
//!
//! Side-effect failures are logged and shown as a generic error message; the
//! transition itself is never rolled back.

use async_trait::async_trait;
use std::sync::Arc;

use crate::core::config;
use crate::core::error::{AppError, AppResult};
use crate::core::retry::with_store_retry;
use crate::core::types::{ProfileDefaults, UserProfile};
use crate::i18n::{Localization, TextKey};
use crate::services::{MediaStore, Spreadsheet};
use crate::session::engine::{NavigationEngine, Output, ProfileDelta, SideEffect, Transition};
use crate::session::locks::UserLocks;
use crate::session::render::{Keyboard, Links, RenderContext, RenderedScreen};
use crate::session::screen::{Event, MediaRef, Placement, Screen};
use crate::storage::ProfileStore;

/// Where an event came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Origin {
    Message,
    /// Button press on the message `message_id`
    Callback { query_id: String, message_id: i32 },
}

/// Transport-neutral inbound event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inbound {
    pub user_id: i64,
    pub chat_id: i64,
    /// Screen the event was produced on
    pub screen: Screen,
    pub event: Event,
    pub origin: Origin,
}

/// Something to deliver to a chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    /// New message
    Message(RenderedScreen),
    /// Replace text and keyboard of an existing message
    Edit { message_id: i32, screen: RenderedScreen },
    /// Answer a button press, optionally with a short popup text
    Toast { query_id: String, text: Option<String> },
    /// Send a photo the transport already holds
    Photo { media: MediaRef, caption: String },
}

/// Messaging platform as seen by the dispatcher.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, chat_id: i64, outbound: Outbound) -> AppResult<()>;

    /// Downloads the content behind `media`.
    async fn fetch_media(&self, media: &MediaRef) -> AppResult<Vec<u8>>;
}

/// Immutable state built at start-up and shared by every event.
pub struct BotContext {
    pub locales: Localization,
    pub links: Links,
    /// Sheet holding the read and write cells
    pub sheet: String,
}

impl BotContext {
    pub fn new(locales: Localization, links: Links, sheet: impl Into<String>) -> Self {
        Self {
            locales,
            links,
            sheet: sheet.into(),
        }
    }

    /// Defaults for new profiles: free plan, one credit, fallback language.
    pub fn defaults(&self) -> ProfileDefaults {
        ProfileDefaults::with_language(self.locales.fallback())
    }
}

#[derive(Clone)]
pub struct SessionDispatcher {
    ctx: Arc<BotContext>,
    store: ProfileStore,
    transport: Arc<dyn Transport>,
    sheet: Arc<dyn Spreadsheet>,
    media: Arc<dyn MediaStore>,
    locks: UserLocks,
}

/// Outcome of side effects that the outputs depend on.
#[derive(Default)]
struct EffectResults {
    table_cell: Option<String>,
    notices: Vec<TextKey>,
    media: Vec<MediaRef>,
}

impl SessionDispatcher {
    pub fn new(
        ctx: Arc<BotContext>,
        store: ProfileStore,
        transport: Arc<dyn Transport>,
        sheet: Arc<dyn Spreadsheet>,
        media: Arc<dyn MediaStore>,
    ) -> Self {
        Self {
            ctx,
            store,
            transport,
            sheet,
            media,
            locks: UserLocks::new(),
        }
    }

    pub fn context(&self) -> &BotContext {
        &self.ctx
    }

    /// Handles one event and returns the screen the user ends up on.
    ///
    /// # Errors
    /// `StoreUnavailable` when the profile store keeps failing; the user has
    /// already been shown the generic error text.
    pub async fn handle(&self, inbound: Inbound) -> AppResult<Screen> {
        let _guard = self.locks.acquire(inbound.user_id).await;
        let user_id = inbound.user_id;

        let profile = match self.load_profile(&inbound).await {
            Ok(profile) => profile,
            Err(e) => {
                log::error!("User {}: cannot load profile: {}", user_id, e);
                self.fail(&inbound, self.ctx.locales.fallback()).await;
                return Err(e);
            }
        };

        let transition = NavigationEngine::new(&self.ctx.locales).transition(inbound.screen, &inbound.event, &profile);
        log::debug!("User {}: {:?} --{:?}--> {:?}", user_id, inbound.screen, inbound.event, transition.next);

        let language = match self.apply_deltas(user_id, &transition, profile.language.clone()).await {
            Ok(language) => language,
            Err(e) => {
                log::error!("User {}: cannot update profile: {}", user_id, e);
                self.fail(&inbound, &profile.language).await;
                return Err(e);
            }
        };

        let results = match self.run_effects(user_id, &transition).await {
            Ok(results) => results,
            Err(e) => {
                log::error!("User {}: cannot create profile: {}", user_id, e);
                self.fail(&inbound, &language).await;
                return Err(e);
            }
        };

        let mut acknowledged = false;
        for output in &transition.outputs {
            acknowledged |= self.deliver(&inbound, output, &language, &results).await;
        }
        for key in &results.notices {
            self.notice(inbound.chat_id, *key, &language).await;
        }
        for media in &results.media {
            self.store_media(user_id, inbound.chat_id, media, &language).await;
        }
        if !acknowledged {
            self.acknowledge(&inbound, None).await;
        }

        Ok(transition.next)
    }

    async fn load_profile(&self, inbound: &Inbound) -> AppResult<UserProfile> {
        let id = inbound.user_id;
        match with_store_retry("get", || self.store.get(id)).await {
            Ok(profile) => Ok(profile),
            // Start upserts as its own side effect
            Err(AppError::NotFound(_)) if inbound.event == Event::Start => Ok(UserProfile::new(id, &self.ctx.defaults())),
            Err(AppError::NotFound(_)) => {
                log::info!("User {} has no profile yet, creating it", id);
                let defaults = self.ctx.defaults();
                with_store_retry("upsert", || self.store.upsert(id, &defaults)).await?;
                with_store_retry("get", || self.store.get(id)).await
            }
            Err(e) => Err(e),
        }
    }

    /// Applies profile deltas and returns the language to render in.
    async fn apply_deltas(&self, user_id: i64, transition: &Transition, mut language: String) -> AppResult<String> {
        for delta in &transition.deltas {
            match delta {
                ProfileDelta::SetLanguage(code) => {
                    with_store_retry("set_language", || self.store.set_language(user_id, code)).await?;
                    log::info!("User {} switched language to {}", user_id, code);
                    language = code.clone();
                }
                ProfileDelta::DecrementCounter => {
                    let counter = with_store_retry("decrement_counter", || self.store.decrement_counter(user_id)).await?;
                    log::info!("User {} counter is now {}", user_id, counter);
                }
            }
        }
        Ok(language)
    }

    /// Runs side effects. Only the profile upsert may fail the event.
    async fn run_effects(&self, user_id: i64, transition: &Transition) -> AppResult<EffectResults> {
        let mut results = EffectResults::default();
        for effect in &transition.effects {
            match effect {
                SideEffect::UpsertProfile => {
                    let defaults = self.ctx.defaults();
                    with_store_retry("upsert", || self.store.upsert(user_id, &defaults)).await?;
                }
                SideEffect::ReadTable => match self.sheet.read_cell(&self.ctx.sheet, config::sheet::READ_CELL).await {
                    Ok(value) => results.table_cell = Some(value),
                    Err(e) => log::error!("User {}: can't read from table: {}", user_id, e),
                },
                SideEffect::WriteTable(text) => {
                    match self.sheet.write_cell(&self.ctx.sheet, config::sheet::WRITE_CELL, text).await {
                        Ok(()) => results.notices.push(TextKey::DateSaved),
                        Err(e) => {
                            log::error!("User {}: can't write to table: {}", user_id, e);
                            results.notices.push(TextKey::GenericError);
                        }
                    }
                }
                // Fetched after the echo so the user is not kept waiting
                SideEffect::StoreMedia(media) => results.media.push(media.clone()),
            }
        }
        Ok(results)
    }

    /// Sends one output. Returns true if it answered the button press.
    async fn deliver(&self, inbound: &Inbound, output: &Output, language: &str, results: &EffectResults) -> bool {
        let mut render = RenderContext::new(&self.ctx.locales, &self.ctx.links);
        if let Some(cell) = results.table_cell.as_deref() {
            render = render.with_table_cell(cell);
        }

        let outbound = match output {
            Output::Render(spec) => {
                let screen = match render.render(spec, language) {
                    Ok(screen) => screen,
                    Err(e) => {
                        log::error!("User {}: cannot render {:?}: {}", inbound.user_id, spec.screen, e);
                        return false;
                    }
                };
                match (&inbound.origin, spec.placement) {
                    (Origin::Callback { message_id, .. }, Placement::Replace) => Outbound::Edit {
                        message_id: *message_id,
                        screen,
                    },
                    _ => Outbound::Message(screen),
                }
            }
            Output::Notice { key, remove_keyboard } => {
                let Some(text) = self.text(*key, language) else {
                    return false;
                };
                Outbound::Message(RenderedScreen {
                    text,
                    keyboard: if *remove_keyboard { Keyboard::Remove } else { Keyboard::None },
                })
            }
            Output::Acknowledge(key) => {
                let text = self.text(*key, language).map(|text| format!("{} {}", text, language));
                return self.acknowledge(inbound, text).await;
            }
            Output::EchoMedia { media, caption } => Outbound::Photo {
                media: media.clone(),
                caption: self.text(*caption, language).unwrap_or_default(),
            },
        };

        if let Err(e) = self.transport.send(inbound.chat_id, outbound).await {
            log::error!("User {}: failed to send message: {}", inbound.user_id, e);
        }
        false
    }

    fn text(&self, key: TextKey, language: &str) -> Option<String> {
        match self.ctx.locales.text(language, key) {
            Ok(text) => Some(text.to_string()),
            Err(e) => {
                log::error!("{}", e);
                None
            }
        }
    }

    async fn notice(&self, chat_id: i64, key: TextKey, language: &str) {
        let Some(text) = self.text(key, language) else {
            return;
        };
        let outbound = Outbound::Message(RenderedScreen {
            text,
            keyboard: Keyboard::None,
        });
        if let Err(e) = self.transport.send(chat_id, outbound).await {
            log::error!("Chat {}: failed to send notice: {}", chat_id, e);
        }
    }

    /// Answers the button press, if the event was one.
    async fn acknowledge(&self, inbound: &Inbound, text: Option<String>) -> bool {
        let Origin::Callback { query_id, .. } = &inbound.origin else {
            return false;
        };
        let toast = Outbound::Toast {
            query_id: query_id.clone(),
            text,
        };
        if let Err(e) = self.transport.send(inbound.chat_id, toast).await {
            log::warn!("User {}: failed to answer callback: {}", inbound.user_id, e);
        }
        true
    }

    async fn store_media(&self, user_id: i64, chat_id: i64, media: &MediaRef, language: &str) {
        let stored = match self.transport.fetch_media(media).await {
            Ok(bytes) => self.media.store(&bytes).await,
            Err(e) => Err(e),
        };
        match stored {
            Ok(path) => log::info!("User {}: photo saved to {}", user_id, path.display()),
            Err(e) => {
                log::error!("User {}: can't save photo {}: {}", user_id, media.file_id, e);
                self.notice(chat_id, TextKey::GenericError, language).await;
            }
        }
    }

    /// Tells the user something went wrong and releases the button, if any.
    async fn fail(&self, inbound: &Inbound, language: &str) {
        self.notice(inbound.chat_id, TextKey::GenericError, language).await;
        self.acknowledge(inbound, None).await;
    }
}
