//! Light/dark theme and preview style preferences.

use std::str::FromStr;

/// Color scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }

    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }

    /// Pick a theme from the `COLORFGBG` convention (`"15;0"` = light text
    /// on dark background). Falls back to light.
    pub fn detect() -> Self {
        std::env::var("COLORFGBG")
            .ok()
            .and_then(|value| value.rsplit(';').next().and_then(|bg| bg.parse::<u8>().ok()))
            .map_or(Self::Light, |bg| if bg < 7 || bg == 8 { Self::Dark } else { Self::Light })
    }
}

impl FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "light" => Ok(Self::Light),
            "dark" => Ok(Self::Dark),
            other => Err(format!("unknown theme '{other}'")),
        }
    }
}

/// How the preview body is typeset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PreviewStyle {
    /// Typographic prose styling.
    #[default]
    Prose,
    /// Unstyled HTML.
    Plain,
}

impl FromStr for PreviewStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "prose" => Ok(Self::Prose),
            "plain" => Ok(Self::Plain),
            other => Err(format!("unknown preview style '{other}'")),
        }
    }
}

/// Theme preferences read by the preview and island engines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ThemeSettings {
    pub theme: Theme,
    pub preview_style: PreviewStyle,
}

impl ThemeSettings {
    pub const fn new(theme: Theme, preview_style: PreviewStyle) -> Self {
        Self {
            theme,
            preview_style,
        }
    }

    pub const fn toggle_theme(&mut self) {
        self.theme = self.theme.toggled();
    }

    /// Class list for the preview body wrapper.
    pub fn preview_class(&self) -> String {
        let mut classes = vec!["preview"];
        if self.preview_style == PreviewStyle::Prose {
            classes.extend(["prose", "prose-slate", "max-w-none"]);
            if self.theme == Theme::Dark {
                classes.push("prose-invert");
            }
        }
        classes.join(" ")
    }

    /// Class for the document root element.
    pub const fn root_class(&self) -> &'static str {
        match self.theme {
            Theme::Light => "",
            Theme::Dark => "dark",
        }
    }
}
