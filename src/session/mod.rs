//! Conversation state machine and the dispatcher that drives it.
//!
//! Nothing here knows about Telegram: the engine is pure, rendering produces
//! plain text and buttons, and the dispatcher talks to the messaging
//! platform through the [`Transport`] trait.

pub mod dispatcher;
pub mod engine;
pub mod locks;
pub mod render;
pub mod screen;

pub use dispatcher::{BotContext, Inbound, Origin, Outbound, SessionDispatcher, Transport};
pub use engine::{NavigationEngine, Output, ProfileDelta, SideEffect, Transition};
pub use locks::{UserGuard, UserLocks};
pub use render::{ButtonKind, Keyboard, Links, RenderContext, RenderedButton, RenderedScreen};
pub use screen::{callback_data, parse_callback, Action, Event, MediaRef, Screen};
