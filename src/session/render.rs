//! Resolves a [`RenderSpec`] into concrete text and buttons for one language.

use crate::core::error::AppResult;
use crate::i18n::{Localization, TextKey};
use crate::session::screen::{callback_data, Header, Label, Link, RenderSpec, Target};

/// External URLs fixed at start-up.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Links {
    pub terms: String,
    pub map: String,
    /// Cached payment confirmation URL; empty when generation failed
    pub payment: String,
}

impl Links {
    pub fn get(&self, link: Link) -> &str {
        match link {
            Link::Terms => &self.terms,
            Link::Map => &self.map,
            Link::Payment => &self.payment,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ButtonKind {
    Callback(String),
    Url(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedButton {
    pub label: String,
    pub kind: ButtonKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Keyboard {
    None,
    Inline(Vec<RenderedButton>),
    /// One-time reply keyboard; each entry is sent back as text
    Reply(Vec<String>),
    /// Clears a reply keyboard shown earlier
    Remove,
}

/// Text plus keyboard, ready for a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedScreen {
    pub text: String,
    pub keyboard: Keyboard,
}

/// Everything rendering needs besides the spec itself.
#[derive(Clone, Copy)]
pub struct RenderContext<'a> {
    pub locales: &'a Localization,
    pub links: &'a Links,
    /// Text shown for [`Header::TableCell`]
    pub table_cell: Option<&'a str>,
}

impl<'a> RenderContext<'a> {
    pub fn new(locales: &'a Localization, links: &'a Links) -> Self {
        Self {
            locales,
            links,
            table_cell: None,
        }
    }

    #[must_use]
    pub fn with_table_cell(mut self, cell: &'a str) -> Self {
        self.table_cell = Some(cell);
        self
    }

    /// Renders `spec` in `language`, falling back to the default language per key.
    ///
    /// # Errors
    /// `LocalizationMissing` if neither language has a needed key.
    pub fn render(&self, spec: &RenderSpec, language: &str) -> AppResult<RenderedScreen> {
        let text = self.header(&spec.header, language)?;

        let mut inline = Vec::new();
        let mut reply = Vec::new();
        for button in &spec.buttons {
            let caption = match &button.label {
                Label::Key(key) => self.locales.text(language, *key)?.to_string(),
                Label::Literal(text) => text.clone(),
            };
            let label = match button.mark {
                Some(mark) => format!("{} {}", mark, caption),
                None => caption,
            };

            match &button.target {
                Target::Callback(screen, action) => inline.push(RenderedButton {
                    label,
                    kind: ButtonKind::Callback(callback_data(*screen, action)),
                }),
                Target::Link(link) => {
                    let url = self.links.get(*link);
                    if url.is_empty() {
                        log::debug!("Skipping {:?} button without URL", link);
                        continue;
                    }
                    inline.push(RenderedButton {
                        label,
                        kind: ButtonKind::Url(url.to_string()),
                    });
                }
                Target::Reply => reply.push(label),
            }
        }

        let keyboard = if !reply.is_empty() {
            Keyboard::Reply(reply)
        } else if !inline.is_empty() {
            Keyboard::Inline(inline)
        } else {
            Keyboard::None
        };

        Ok(RenderedScreen { text, keyboard })
    }

    fn header(&self, header: &Header, language: &str) -> AppResult<String> {
        Ok(match header {
            Header::Key(key @ (TextKey::LanguageHeader | TextKey::MenuHeader)) => {
                format!("{}:", self.locales.text(language, *key)?)
            }
            Header::Key(key) => self.locales.text(language, *key)?.to_string(),
            Header::KeyWithLink(key, link) => {
                format!("{}({})", self.locales.text(language, *key)?, self.links.get(*link))
            }
            Header::TableCell => match self.table_cell {
                Some(cell) => cell.to_string(),
                None => self.locales.text(language, TextKey::TableError)?.to_string(),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::AppError;
    use crate::i18n::Bundle;
    use crate::session::engine::NavigationEngine;
    use crate::session::screen::{Placement, Screen};
    use pretty_assertions::assert_eq;
    use std::collections::BTreeMap;

    const RU: &str = r#"{
        "terms_message": "Примите условия",
        "agree_options": ["Принимаю", "Отказываюсь"],
        "headers": ["Язык", "Меню", "Главная"],
        "buttons": ["Язык", "Меню", "Фото", "Карта", "Оплата", "Таблица", "Назад"],
        "photo_message": "Пришлите фото",
        "table_error": "Oups..."
    }"#;
    const EN: &str = r#"{
        "headers": ["Language", "Menu", "Home"],
        "buttons": ["Language", "Menu"]
    }"#;

    fn locales() -> Localization {
        let mut bundles = BTreeMap::new();
        bundles.insert("ru".to_string(), Bundle::from_json(RU).unwrap());
        bundles.insert("en".to_string(), Bundle::from_json(EN).unwrap());
        Localization::from_bundles(bundles, "ru").unwrap()
    }

    fn links(payment: &str) -> Links {
        Links {
            terms: "https://example.com/terms".into(),
            map: "https://maps.example.com".into(),
            payment: payment.into(),
        }
    }

    #[test]
    fn terms_prompt_is_reply_keyboard_with_link() {
        let locales = locales();
        let links = links("");
        let spec = NavigationEngine::new(&locales).spec(Screen::TermsPending, Placement::New);
        let screen = RenderContext::new(&locales, &links).render(&spec, "ru").unwrap();

        assert_eq!(screen.text, "Примите условия(https://example.com/terms)");
        assert_eq!(
            screen.keyboard,
            Keyboard::Reply(vec!["✅ Принимаю".into(), "❎ Отказываюсь".into()])
        );
    }

    #[test]
    fn home_in_english() {
        let locales = locales();
        let links = links("");
        let spec = NavigationEngine::new(&locales).spec(Screen::Home, Placement::New);
        let screen = RenderContext::new(&locales, &links).render(&spec, "en").unwrap();

        assert_eq!(screen.text, "Home");
        assert_eq!(
            screen.keyboard,
            Keyboard::Inline(vec![
                RenderedButton {
                    label: "🔄 Language".into(),
                    kind: ButtonKind::Callback("home:language".into()),
                },
                RenderedButton {
                    label: "📋 Menu".into(),
                    kind: ButtonKind::Callback("home:menu".into()),
                },
            ])
        );
    }

    #[test]
    fn menu_omits_pay_without_url() {
        let locales = locales();
        let engine = NavigationEngine::new(&locales);
        let spec = engine.spec(Screen::Menu, Placement::Replace);

        let without = links("");
        let screen = RenderContext::new(&locales, &without).render(&spec, "ru").unwrap();
        assert_eq!(screen.text, "Меню:");
        let Keyboard::Inline(buttons) = screen.keyboard else {
            panic!("expected inline keyboard");
        };
        let labels: Vec<&str> = buttons.iter().map(|b| b.label.as_str()).collect();
        assert_eq!(labels, vec!["Фото", "Карта", "Таблица", "↩ Назад"]);

        let with = links("https://pay.example.com/c/1");
        let screen = RenderContext::new(&locales, &with).render(&spec, "ru").unwrap();
        let Keyboard::Inline(buttons) = screen.keyboard else {
            panic!("expected inline keyboard");
        };
        assert!(buttons.contains(&RenderedButton {
            label: "Оплата".into(),
            kind: ButtonKind::Url("https://pay.example.com/c/1".into()),
        }));
    }

    #[test]
    fn table_view_shows_cell_or_error_text() {
        let locales = locales();
        let links = links("");
        let spec = NavigationEngine::new(&locales).spec(Screen::TableView, Placement::New);
        let ctx = RenderContext::new(&locales, &links);

        assert_eq!(ctx.render(&spec, "ru").unwrap().text, "Oups...");
        assert_eq!(ctx.with_table_cell("42").render(&spec, "ru").unwrap().text, "42");
    }

    #[test]
    fn unknown_language_degrades_to_fallback() {
        let locales = locales();
        let links = links("");
        let spec = NavigationEngine::new(&locales).spec(Screen::PhotoPrompt, Placement::Replace);
        let screen = RenderContext::new(&locales, &links).render(&spec, "de").unwrap();
        assert_eq!(screen.text, "Пришлите фото");
    }

    #[test]
    fn missing_everywhere_is_an_error() {
        let locales = locales();
        let links = links("");
        let spec = RenderSpec {
            screen: Screen::Home,
            placement: Placement::New,
            header: Header::Key(TextKey::GenericError),
            buttons: Vec::new(),
        };
        assert!(matches!(
            RenderContext::new(&locales, &links).render(&spec, "en"),
            Err(AppError::LocalizationMissing { .. })
        ));
    }
}
