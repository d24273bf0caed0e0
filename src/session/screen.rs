//! Screens, user actions and the render descriptions the engine produces.

use strum::{Display, EnumString};

use crate::i18n::TextKey;

/// Named point in the menu hierarchy.
///
/// `Display`/`FromStr` use the short prefix found in callback payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
pub enum Screen {
    #[strum(serialize = "welcome")]
    Welcome,
    #[strum(serialize = "terms")]
    TermsPending,
    #[strum(serialize = "home")]
    Home,
    #[strum(serialize = "lang")]
    LanguagePicker,
    #[strum(serialize = "menu")]
    Menu,
    #[strum(serialize = "table")]
    TableView,
    #[strum(serialize = "photo")]
    PhotoPrompt,
}

/// Button press.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Action {
    ChooseLanguage,
    OpenMenu,
    SelectLanguage(String),
    Table,
    Photo,
    Back,
}

impl Action {
    fn encode(&self) -> String {
        match self {
            Action::ChooseLanguage => "language".to_string(),
            Action::OpenMenu => "menu".to_string(),
            Action::SelectLanguage(code) => format!("set:{}", code),
            Action::Table => "table".to_string(),
            Action::Photo => "photo".to_string(),
            Action::Back => "back".to_string(),
        }
    }

    fn decode(raw: &str) -> Option<Self> {
        match raw {
            "language" => Some(Action::ChooseLanguage),
            "menu" => Some(Action::OpenMenu),
            "table" => Some(Action::Table),
            "photo" => Some(Action::Photo),
            "back" => Some(Action::Back),
            other => {
                let code = other.strip_prefix("set:")?;
                (!code.is_empty()).then(|| Action::SelectLanguage(code.to_string()))
            }
        }
    }
}

/// Callback payload for pressing `action` on `screen`: `<screen>:<action>`.
pub fn callback_data(screen: Screen, action: &Action) -> String {
    format!("{}:{}", screen, action.encode())
}

/// Inverse of [`callback_data`].
pub fn parse_callback(data: &str) -> Option<(Screen, Action)> {
    let (tag, action) = data.split_once(':')?;
    Some((tag.parse().ok()?, Action::decode(action)?))
}

/// Reference to a media file held by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaRef {
    pub file_id: String,
}

/// Inbound user event, already stripped of transport details.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// The start command
    Start,
    /// Free text
    Text(String),
    /// Button press
    Button(Action),
    /// Photo received
    Media(MediaRef),
}

/// External link a button or header can point at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Link {
    Terms,
    Map,
    Payment,
}

/// Screen title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Header {
    Key(TextKey),
    /// Text followed by `(link)`
    KeyWithLink(TextKey, Link),
    /// Value read from the spreadsheet
    TableCell,
}

/// Button caption.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Label {
    Key(TextKey),
    /// Shown verbatim (language codes)
    Literal(String),
}

/// What pressing a button does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// Inline callback carrying `<screen>:<action>`
    Callback(Screen, Action),
    /// Inline URL button; dropped when the link is empty
    Link(Link),
    /// Reply-keyboard button sending its own caption as text
    Reply,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ButtonSpec {
    pub label: Label,
    /// Emoji put in front of the caption
    pub mark: Option<&'static str>,
    pub target: Target,
}

impl ButtonSpec {
    pub fn callback(label: TextKey, screen: Screen, action: Action) -> Self {
        Self {
            label: Label::Key(label),
            mark: None,
            target: Target::Callback(screen, action),
        }
    }

    pub fn link(label: TextKey, link: Link) -> Self {
        Self {
            label: Label::Key(label),
            mark: None,
            target: Target::Link(link),
        }
    }

    pub fn reply(label: TextKey, mark: &'static str) -> Self {
        Self {
            label: Label::Key(label),
            mark: Some(mark),
            target: Target::Reply,
        }
    }

    #[must_use]
    pub fn marked(mut self, mark: &'static str) -> Self {
        self.mark = Some(mark);
        self
    }
}

/// Whether a render replaces the message the button was on or is sent anew.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    Replace,
    New,
}

/// Immutable description of a screen: header and buttons.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderSpec {
    pub screen: Screen,
    pub header: Header,
    pub buttons: Vec<ButtonSpec>,
    pub placement: Placement,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn callback_payloads_parse_back() {
        let cases = [
            (Screen::Home, Action::ChooseLanguage, "home:language"),
            (Screen::Home, Action::OpenMenu, "home:menu"),
            (Screen::LanguagePicker, Action::SelectLanguage("en".into()), "lang:set:en"),
            (Screen::Menu, Action::Table, "menu:table"),
            (Screen::TableView, Action::Photo, "table:photo"),
            (Screen::PhotoPrompt, Action::Back, "photo:back"),
        ];
        for (screen, action, data) in cases {
            assert_eq!(callback_data(screen, &action), data);
            assert_eq!(parse_callback(data), Some((screen, action)));
        }
    }

    #[test]
    fn screen_prefixes() {
        assert_eq!(Screen::LanguagePicker.to_string(), "lang");
        assert_eq!("terms".parse::<Screen>(), Ok(Screen::TermsPending));
        assert!("Home".parse::<Screen>().is_err());
    }

    #[test]
    fn unknown_payloads_are_rejected() {
        assert_eq!(parse_callback("choose_language"), None);
        assert_eq!(parse_callback("nowhere:back"), None);
        assert_eq!(parse_callback("home:fly"), None);
        assert_eq!(parse_callback("lang:set:"), None);
        assert_eq!(parse_callback(""), None);
    }
}
