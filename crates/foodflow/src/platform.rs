//! The Mini-App host platform, when the app runs inside one.
//!
//! The host injects a JSON snapshot of its web-app object. Its presence is
//! decided once, when the theme context is built, and never forces a theme:
//! the platform's colors are only used after the user picks
//! [`ThemeMode::TelegramNative`](crate::ThemeMode::TelegramNative).

use serde::{Deserialize, Serialize};

use crate::error::PlatformError;
use crate::theme::AmbientScheme;

/// Colors the platform publishes for its current theme. Every field is
/// optional; older clients send fewer of them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThemeParams {
    pub bg_color: Option<String>,
    pub text_color: Option<String>,
    pub hint_color: Option<String>,
    pub link_color: Option<String>,
    pub button_color: Option<String>,
    pub button_text_color: Option<String>,
    pub secondary_bg_color: Option<String>,
    pub header_bg_color: Option<String>,
    pub accent_text_color: Option<String>,
    pub section_bg_color: Option<String>,
    pub section_header_text_color: Option<String>,
    pub subtitle_text_color: Option<String>,
    pub destructive_text_color: Option<String>,
}

impl ThemeParams {
    fn entries(&self) -> [(&'static str, Option<&String>); 13] {
        [
            ("bg_color", self.bg_color.as_ref()),
            ("text_color", self.text_color.as_ref()),
            ("hint_color", self.hint_color.as_ref()),
            ("link_color", self.link_color.as_ref()),
            ("button_color", self.button_color.as_ref()),
            ("button_text_color", self.button_text_color.as_ref()),
            ("secondary_bg_color", self.secondary_bg_color.as_ref()),
            ("header_bg_color", self.header_bg_color.as_ref()),
            ("accent_text_color", self.accent_text_color.as_ref()),
            ("section_bg_color", self.section_bg_color.as_ref()),
            ("section_header_text_color", self.section_header_text_color.as_ref()),
            ("subtitle_text_color", self.subtitle_text_color.as_ref()),
            ("destructive_text_color", self.destructive_text_color.as_ref()),
        ]
    }

    /// Checks that every present color is `#rgb` or `#rrggbb`.
    pub fn validate(&self) -> Result<(), PlatformError> {
        for (name, value) in self.entries() {
            if let Some(value) = value {
                if !is_hex_color(value) {
                    return Err(PlatformError::InvalidColor {
                        name,
                        value: value.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    /// CSS custom properties for the set colors, e.g.
    /// `("--tg-theme-bg-color", "#ffffff")`, in declaration order.
    pub fn css_variables(&self) -> Vec<(String, String)> {
        self.entries()
            .into_iter()
            .filter_map(|(name, value)| {
                value.map(|v| (format!("--tg-theme-{}", name.replace('_', "-")), v.clone()))
            })
            .collect()
    }
}

fn is_hex_color(value: &str) -> bool {
    match value.strip_prefix('#') {
        Some(hex) => {
            (hex.len() == 3 || hex.len() == 6) && hex.chars().all(|c| c.is_ascii_hexdigit())
        }
        None => false,
    }
}

/// The subset of the platform's web-app object the app reads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WebAppContext {
    pub platform: String,
    pub version: String,
    pub color_scheme: AmbientScheme,
    pub theme_params: ThemeParams,
}

impl WebAppContext {
    pub fn from_json(payload: &str) -> Result<Self, PlatformError> {
        let context: WebAppContext = serde_json::from_str(payload)?;
        context.theme_params.validate()?;
        Ok(context)
    }
}

/// Whether the app is embedded in a Mini-App host.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PlatformHost {
    Present(WebAppContext),
    #[default]
    Absent,
}

impl PlatformHost {
    /// Interprets the host's payload; `None` means there is no host.
    pub fn from_json(payload: Option<&str>) -> Result<Self, PlatformError> {
        match payload {
            Some(payload) => Ok(PlatformHost::Present(WebAppContext::from_json(payload)?)),
            None => Ok(PlatformHost::Absent),
        }
    }

    pub fn context(&self) -> Option<&WebAppContext> {
        match self {
            PlatformHost::Present(context) => Some(context),
            PlatformHost::Absent => None,
        }
    }

    pub fn is_present(&self) -> bool {
        matches!(self, PlatformHost::Present(_))
    }
}
