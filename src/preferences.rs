pub const THEME_KEY: &str = "portfolio-theme";
pub const LOCALE_KEY: &str = "portfolio-locale";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Theme {
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "light" => Some(Self::Light),
            "dark" => Some(Self::Dark),
            _ => None,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }

    pub fn pressed(self) -> bool {
        matches!(self, Self::Dark)
    }

    pub fn icon(self) -> &'static str {
        match self {
            Self::Light => "◐",
            Self::Dark => "◑",
        }
    }

    /// Stored choice first, then the system preference.
    pub fn resolve(stored: Option<&str>, system_prefers_dark: bool) -> Self {
        stored.and_then(Self::parse).unwrap_or(if system_prefers_dark {
            Self::Dark
        } else {
            Self::Light
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Locale {
    En,
    Sv,
}

impl Locale {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Sv => "sv",
        }
    }

    /// Accepts full language tags such as `sv-SE`.
    pub fn parse(value: &str) -> Option<Self> {
        let language = value.split(|c: char| c == '-' || c == '_').next()?.trim().to_ascii_lowercase();
        match language.as_str() {
            "en" => Some(Self::En),
            "sv" => Some(Self::Sv),
            _ => None,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Self::En => Self::Sv,
            Self::Sv => Self::En,
        }
    }

    pub fn resolve(stored: Option<&str>, browser_language: Option<&str>) -> Self {
        stored
            .and_then(Self::parse)
            .or_else(|| browser_language.and_then(Self::parse))
            .unwrap_or(Self::En)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Preferences {
    pub theme: Theme,
    pub locale: Locale,
}

impl Preferences {
    pub fn toggle_label(self) -> &'static str {
        match (self.locale, self.theme) {
            (Locale::En, Theme::Light) => "Switch to dark theme",
            (Locale::En, Theme::Dark) => "Switch to light theme",
            (Locale::Sv, Theme::Light) => "Byt till mörkt tema",
            (Locale::Sv, Theme::Dark) => "Byt till ljust tema",
        }
    }
}
