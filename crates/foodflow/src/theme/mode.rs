//! Theme modes, ambient schemes and the pure resolution between them.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ParseModeError;

/// The theme preference chosen by the user and persisted across sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    Light,
    Dark,
    /// Follow the host's ambient light/dark preference.
    #[default]
    System,
    /// Defer to the Mini-App platform's own color parameters.
    #[serde(rename = "telegram")]
    TelegramNative,
}

impl ThemeMode {
    /// Every mode, in the order a settings menu lists them.
    pub const ALL: [ThemeMode; 4] = [
        ThemeMode::Light,
        ThemeMode::Dark,
        ThemeMode::System,
        ThemeMode::TelegramNative,
    ];

    /// The literal name stored on disk.
    pub fn as_str(self) -> &'static str {
        match self {
            ThemeMode::Light => "light",
            ThemeMode::Dark => "dark",
            ThemeMode::System => "system",
            ThemeMode::TelegramNative => "telegram",
        }
    }
}

impl fmt::Display for ThemeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ThemeMode {
    type Err = ParseModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ThemeMode::ALL
            .into_iter()
            .find(|mode| mode.as_str() == s)
            .ok_or_else(|| ParseModeError(s.to_string()))
    }
}

/// The host environment's current light/dark preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AmbientScheme {
    #[default]
    Light,
    Dark,
}

impl From<dark_light::Mode> for AmbientScheme {
    fn from(mode: dark_light::Mode) -> Self {
        match mode {
            dark_light::Mode::Dark => AmbientScheme::Dark,
            dark_light::Mode::Light => AmbientScheme::Light,
        }
    }
}

/// The concrete theme applied to the presentation root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolvedTheme {
    Light,
    Dark,
    #[serde(rename = "telegram")]
    TelegramNative,
}

impl ResolvedTheme {
    pub fn as_str(self) -> &'static str {
        match self {
            ResolvedTheme::Light => "light",
            ResolvedTheme::Dark => "dark",
            ResolvedTheme::TelegramNative => "telegram",
        }
    }
}

impl fmt::Display for ResolvedTheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<AmbientScheme> for ResolvedTheme {
    fn from(scheme: AmbientScheme) -> Self {
        match scheme {
            AmbientScheme::Light => ResolvedTheme::Light,
            AmbientScheme::Dark => ResolvedTheme::Dark,
        }
    }
}

/// Combines a mode with the ambient scheme.
///
/// Only [`ThemeMode::System`] looks at `ambient`.
pub fn resolve(mode: ThemeMode, ambient: AmbientScheme) -> ResolvedTheme {
    match mode {
        ThemeMode::Light => ResolvedTheme::Light,
        ThemeMode::Dark => ResolvedTheme::Dark,
        ThemeMode::System => ambient.into(),
        ThemeMode::TelegramNative => ResolvedTheme::TelegramNative,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn any_mode() -> impl Strategy<Value = ThemeMode> {
        prop::sample::select(ThemeMode::ALL.to_vec())
    }

    fn any_scheme() -> impl Strategy<Value = AmbientScheme> {
        prop_oneof![Just(AmbientScheme::Light), Just(AmbientScheme::Dark)]
    }

    #[test]
    fn test_resolve_table() {
        use AmbientScheme as A;
        use ResolvedTheme as R;
        use ThemeMode as M;

        let table = [
            (M::Light, A::Light, R::Light),
            (M::Light, A::Dark, R::Light),
            (M::Dark, A::Light, R::Dark),
            (M::Dark, A::Dark, R::Dark),
            (M::System, A::Light, R::Light),
            (M::System, A::Dark, R::Dark),
            (M::TelegramNative, A::Light, R::TelegramNative),
            (M::TelegramNative, A::Dark, R::TelegramNative),
        ];
        for (mode, ambient, expected) in table {
            assert_eq!(resolve(mode, ambient), expected, "{mode} + {ambient:?}");
        }
    }

    #[test]
    fn test_mode_parse_literals() {
        assert_eq!("light".parse::<ThemeMode>(), Ok(ThemeMode::Light));
        assert_eq!("telegram".parse::<ThemeMode>(), Ok(ThemeMode::TelegramNative));
        assert!("Light".parse::<ThemeMode>().is_err());
        assert!("".parse::<ThemeMode>().is_err());
    }

    #[test]
    fn test_default_mode_is_system() {
        assert_eq!(ThemeMode::default(), ThemeMode::System);
        assert_eq!(AmbientScheme::default(), AmbientScheme::Light);
    }

    #[test]
    fn test_serde_names_match_storage_literals() {
        for mode in ThemeMode::ALL {
            let json = serde_json::to_string(&mode).unwrap();
            assert_eq!(json, format!("\"{}\"", mode.as_str()));
        }
        let resolved = serde_json::to_string(&ResolvedTheme::TelegramNative).unwrap();
        assert_eq!(resolved, "\"telegram\"");
    }

    proptest! {
        #[test]
        fn prop_resolve_is_deterministic(mode in any_mode(), ambient in any_scheme()) {
            prop_assert_eq!(resolve(mode, ambient), resolve(mode, ambient));
        }

        #[test]
        fn prop_only_system_follows_ambient(mode in any_mode()) {
            let light = resolve(mode, AmbientScheme::Light);
            let dark = resolve(mode, AmbientScheme::Dark);
            prop_assert_eq!(light != dark, mode == ThemeMode::System);
        }

        #[test]
        fn prop_display_parses_back(mode in any_mode()) {
            prop_assert_eq!(mode.to_string().parse::<ThemeMode>(), Ok(mode));
        }
    }
}
