use leptos::prelude::*;
use strum::{AsRefStr, EnumString};

use crate::storage::{local_storage, THEME_KEY};

#[derive(Clone, Copy, Debug, PartialEq, Eq, AsRefStr, EnumString)]
#[strum(serialize_all = "lowercase")]
pub(crate) enum Theme {
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }

    /// Stored value first, then the OS preference.
    fn resolve(stored: Option<&str>, prefers_dark: bool) -> Self {
        stored
            .and_then(|s| s.parse().ok())
            .unwrap_or(if prefers_dark { Self::Dark } else { Self::Light })
    }
}

#[derive(Clone, Copy)]
pub(crate) struct ThemeService {
    pub theme: RwSignal<Theme>,
}

impl ThemeService {
    pub fn new() -> Self {
        let stored = local_storage().and_then(|s| s.get_item(THEME_KEY).ok().flatten());
        Self {
            theme: RwSignal::new(Theme::resolve(stored.as_deref(), prefers_dark())),
        }
    }

    /// Keeps the `dark` class on `<html>` in sync with the signal.
    pub fn init(self) {
        let theme = self.theme;
        Effect::new(move |_| apply_theme(theme.get()));
    }

    pub fn is_dark(self) -> bool {
        self.theme.get() == Theme::Dark
    }

    pub fn toggle(self) {
        self.theme.update(|t| *t = t.toggled());
        if let Some(storage) = local_storage() {
            let _ = storage.set_item(THEME_KEY, self.theme.get_untracked().as_ref());
        }
    }
}

fn prefers_dark() -> bool {
    web_sys::window()
        .and_then(|w| w.match_media("(prefers-color-scheme: dark)").ok().flatten())
        .is_some_and(|m| m.matches())
}

fn apply_theme(theme: Theme) {
    if let Some(root) = web_sys::window()
        .and_then(|w| w.document())
        .and_then(|d| d.document_element())
    {
        let _ = root
            .class_list()
            .toggle_with_force("dark", theme == Theme::Dark);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stored_theme_wins_over_os_preference() {
        assert_eq!(Theme::resolve(Some("light"), true), Theme::Light);
        assert_eq!(Theme::resolve(Some("dark"), false), Theme::Dark);
    }

    #[test]
    fn falls_back_to_os_preference() {
        assert_eq!(Theme::resolve(None, true), Theme::Dark);
        assert_eq!(Theme::resolve(Some("sepia"), false), Theme::Light);
        assert_eq!(Theme::Dark.toggled(), Theme::Light);
    }
}
