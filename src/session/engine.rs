//! Navigation engine: `(screen, event, profile) → transition`.
//!
//! Pure computation. The engine never touches the store or the network; it
//! describes profile changes, side effects and what to show, and the
//! dispatcher carries them out.

use lazy_regex::regex_is_match;

use crate::core::types::UserProfile;
use crate::i18n::{Localization, TextKey};
use crate::session::screen::{
    Action, ButtonSpec, Event, Header, Label, Link, MediaRef, Placement, RenderSpec, Screen, Target,
};

/// Marks the agree option of the terms prompt; text containing it is an agreement.
pub const AGREE_MARK: &str = "✅";
/// Marks the disagree option of the terms prompt.
pub const DISAGREE_MARK: &str = "❎";
pub const LANGUAGE_MARK: &str = "🔄";
pub const MENU_MARK: &str = "📋";
pub const BACK_MARK: &str = "↩";

/// Profile change requested by a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileDelta {
    SetLanguage(String),
    /// Subtract one usage credit, without a floor
    DecrementCounter,
}

/// Call to an external collaborator. Its failure never undoes the transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SideEffect {
    /// Insert the profile with defaults if absent
    UpsertProfile,
    /// Read the table cell shown on the table screen
    ReadTable,
    /// Write the literal text to the spreadsheet
    WriteTable(String),
    /// Fetch the media from the transport and store it
    StoreMedia(MediaRef),
}

/// Something the user sees, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Output {
    Render(RenderSpec),
    /// Standalone message; `remove_keyboard` clears a reply keyboard
    Notice { key: TextKey, remove_keyboard: bool },
    /// Short acknowledgement of a button press (`{language}` code appended)
    Acknowledge(TextKey),
    /// Send the received media back with a caption
    EchoMedia { media: MediaRef, caption: TextKey },
}

/// Result of one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub next: Screen,
    pub deltas: Vec<ProfileDelta>,
    pub effects: Vec<SideEffect>,
    pub outputs: Vec<Output>,
}

impl Transition {
    /// Stay on `screen` without doing anything.
    pub fn stay(screen: Screen) -> Self {
        Self {
            next: screen,
            deltas: Vec::new(),
            effects: Vec::new(),
            outputs: Vec::new(),
        }
    }

    fn to(next: Screen) -> Self {
        Self::stay(next)
    }

    fn delta(mut self, delta: ProfileDelta) -> Self {
        self.deltas.push(delta);
        self
    }

    fn effect(mut self, effect: SideEffect) -> Self {
        self.effects.push(effect);
        self
    }

    fn output(mut self, output: Output) -> Self {
        self.outputs.push(output);
        self
    }

    /// True when nothing changes and nothing is shown.
    pub fn is_noop(&self) -> bool {
        self.deltas.is_empty() && self.effects.is_empty() && self.outputs.is_empty()
    }
}

/// `dd.mm.yyyy` anywhere in the text.
pub fn is_date_text(text: &str) -> bool {
    regex_is_match!(r"\d\d\.\d\d\.\d\d\d\d", text)
}

/// Computes transitions. Holds only the read-only localization table, used to
/// list languages and validate language choices.
#[derive(Clone, Copy)]
pub struct NavigationEngine<'a> {
    locales: &'a Localization,
}

impl<'a> NavigationEngine<'a> {
    pub fn new(locales: &'a Localization) -> Self {
        Self { locales }
    }

    /// Next screen, profile deltas, side effects and outputs for `event` on `screen`.
    pub fn transition(&self, screen: Screen, event: &Event, profile: &UserProfile) -> Transition {
        match event {
            Event::Start => Transition::to(Screen::TermsPending)
                .effect(SideEffect::UpsertProfile)
                .output(Output::Render(self.spec(Screen::TermsPending, Placement::New))),

            Event::Text(text) if is_date_text(text) => {
                Transition::stay(screen).effect(SideEffect::WriteTable(text.clone()))
            }

            Event::Text(text) => self.on_text(screen, text),

            Event::Media(media) => Transition::to(Screen::Menu)
                .delta(ProfileDelta::DecrementCounter)
                .effect(SideEffect::StoreMedia(media.clone()))
                .output(Output::EchoMedia {
                    media: media.clone(),
                    caption: TextKey::ResultMessage,
                })
                .output(Output::Render(self.spec(Screen::Menu, Placement::New))),

            Event::Button(action) => self.on_button(screen, action, profile),
        }
    }

    fn on_text(&self, screen: Screen, text: &str) -> Transition {
        match screen {
            Screen::TermsPending if text.contains(AGREE_MARK) => Transition::to(Screen::Home)
                .output(Output::Notice {
                    key: TextKey::HelloMessage,
                    remove_keyboard: true,
                })
                .output(Output::Render(self.spec(Screen::Home, Placement::New))),
            Screen::TermsPending if text.contains(DISAGREE_MARK) => Transition::stay(Screen::TermsPending)
                .output(Output::Notice {
                    key: TextKey::DisagreeMessage,
                    remove_keyboard: false,
                })
                .output(Output::Render(self.spec(Screen::TermsPending, Placement::New))),
            _ => Transition::stay(screen),
        }
    }

    fn on_button(&self, screen: Screen, action: &Action, profile: &UserProfile) -> Transition {
        match (screen, action) {
            (Screen::Home, Action::Back) => Transition::stay(Screen::Home),
            (_, Action::Back) => self.show(Screen::Home, Placement::Replace),

            (Screen::Home, Action::ChooseLanguage) => self.show(Screen::LanguagePicker, Placement::Replace),
            (Screen::Home, Action::OpenMenu) => self.show(Screen::Menu, Placement::Replace),

            (Screen::LanguagePicker, Action::SelectLanguage(code)) => {
                if !self.locales.has_language(code) {
                    log::warn!("User {} picked unknown language '{}'", profile.id, code);
                    return Transition::stay(Screen::LanguagePicker);
                }
                Transition::to(Screen::Home)
                    .delta(ProfileDelta::SetLanguage(code.clone()))
                    .output(Output::Acknowledge(TextKey::LanguageChanged))
                    .output(Output::Render(self.spec(Screen::Home, Placement::Replace)))
            }

            (Screen::Menu | Screen::TableView, Action::Table) => Transition::to(Screen::TableView)
                .effect(SideEffect::ReadTable)
                .output(Output::Render(self.spec(Screen::TableView, Placement::New))),
            (Screen::Menu | Screen::TableView, Action::Photo) => self.show(Screen::PhotoPrompt, Placement::Replace),

            _ => Transition::stay(screen),
        }
    }

    fn show(&self, screen: Screen, placement: Placement) -> Transition {
        Transition::to(screen).output(Output::Render(self.spec(screen, placement)))
    }

    /// Render description of `screen`. Button sets are fixed per screen.
    pub fn spec(&self, screen: Screen, placement: Placement) -> RenderSpec {
        let back = || ButtonSpec::callback(TextKey::ButtonBack, screen, Action::Back).marked(BACK_MARK);

        let (header, buttons) = match screen {
            Screen::Welcome | Screen::TermsPending => (
                Header::KeyWithLink(TextKey::TermsMessage, Link::Terms),
                vec![
                    ButtonSpec::reply(TextKey::AgreeOption, AGREE_MARK),
                    ButtonSpec::reply(TextKey::DisagreeOption, DISAGREE_MARK),
                ],
            ),
            Screen::Home => (
                Header::Key(TextKey::HomeHeader),
                vec![
                    ButtonSpec::callback(TextKey::ButtonLanguage, screen, Action::ChooseLanguage).marked(LANGUAGE_MARK),
                    ButtonSpec::callback(TextKey::ButtonMenu, screen, Action::OpenMenu).marked(MENU_MARK),
                ],
            ),
            Screen::LanguagePicker => {
                let mut buttons: Vec<ButtonSpec> = self
                    .locales
                    .languages()
                    .map(|code| ButtonSpec {
                        label: Label::Literal(code.to_string()),
                        mark: None,
                        target: Target::Callback(screen, Action::SelectLanguage(code.to_string())),
                    })
                    .collect();
                buttons.push(back());
                (Header::Key(TextKey::LanguageHeader), buttons)
            }
            Screen::Menu | Screen::TableView => (
                if screen == Screen::TableView {
                    Header::TableCell
                } else {
                    Header::Key(TextKey::MenuHeader)
                },
                vec![
                    ButtonSpec::callback(TextKey::ButtonPhoto, screen, Action::Photo),
                    ButtonSpec::link(TextKey::ButtonMap, Link::Map),
                    ButtonSpec::link(TextKey::ButtonPay, Link::Payment),
                    ButtonSpec::callback(TextKey::ButtonTable, screen, Action::Table),
                    back(),
                ],
            ),
            Screen::PhotoPrompt => (Header::Key(TextKey::PhotoMessage), vec![back()]),
        };

        RenderSpec {
            screen,
            header,
            buttons,
            placement,
        }
    }
}
