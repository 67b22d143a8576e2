//! The theme context: one resolver per app, built once and shared by handle.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use super::mode::{resolve, AmbientScheme, ResolvedTheme, ThemeMode};
use super::scheme::{OsScheme, PlatformScheme, SchemeSource};
use super::store::{KeyValueStore, MemoryStore, PreferenceStore};
use super::target::{RootElement, ThemeTarget};
use crate::error::PlatformError;
use crate::platform::{PlatformHost, WebAppContext};
use crate::subscription::{Listeners, Subscription};

/// Storage key used when none is configured.
pub const DEFAULT_STORAGE_KEY: &str = "foodflow-theme";

/// Settings for a [`ThemeContext`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThemeConfig {
    /// Key the preference is stored under.
    pub storage_key: String,
    /// Mode used when nothing usable is stored.
    pub default_mode: ThemeMode,
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            default_mode: ThemeMode::System,
        }
    }
}

struct State {
    mode: ThemeMode,
    ambient: AmbientScheme,
    resolved: ResolvedTheme,
    platform: PlatformHost,
    target: Box<dyn ThemeTarget>,
}

struct Shared {
    state: RefCell<State>,
    store: RefCell<PreferenceStore>,
    listeners: Listeners<ResolvedTheme>,
}

impl Shared {
    /// Runs `update`, recomputes, and applies and publishes only on change.
    ///
    /// The state borrow ends before listeners run, so they may call back in.
    fn transition(&self, update: impl FnOnce(&mut State)) -> Option<ResolvedTheme> {
        let changed = {
            let mut state = self.state.borrow_mut();
            update(&mut state);
            let next = resolve(state.mode, state.ambient);
            if next == state.resolved {
                None
            } else {
                debug!(from = %state.resolved, to = %next, mode = %state.mode, "theme resolved");
                state.resolved = next;
                state.target.apply(next);
                Some(next)
            }
        };
        if let Some(theme) = changed {
            self.listeners.emit(theme);
        }
        changed
    }

    fn ambient_changed(&self, scheme: AmbientScheme) {
        let ignored = self.state.borrow().mode != ThemeMode::System;
        if ignored {
            trace!(?scheme, "ambient change ignored outside system mode");
        }
        self.transition(|state| state.ambient = scheme);
    }

    /// Replaces the platform context. While the platform's theme is in
    /// effect its colors just changed, so the theme is re-applied and
    /// republished.
    fn platform_changed(&self, context: WebAppContext) {
        let refreshed = {
            let mut state = self.state.borrow_mut();
            state.platform = PlatformHost::Present(context);
            if state.resolved == ResolvedTheme::TelegramNative {
                debug!("platform colors changed, re-applying platform theme");
                state.target.apply(ResolvedTheme::TelegramNative);
                true
            } else {
                false
            }
        };
        if refreshed {
            self.listeners.emit(ResolvedTheme::TelegramNative);
        }
    }
}

/// Owns the theme state machine.
///
/// Construction loads the stored mode, snapshots the ambient scheme, applies
/// the first resolved theme to the target and only then starts watching the
/// ambient source. Dropping the context stops watching.
///
/// # Example
///
/// ```rust
/// use foodflow::{AmbientScheme, ManualScheme, MemoryStore, RootElement, ThemeContext, ThemeMode};
///
/// let ambient = ManualScheme::new(AmbientScheme::Dark);
/// let root = RootElement::new();
/// let theme = ThemeContext::builder()
///     .store(MemoryStore::new())
///     .scheme(ambient.clone())
///     .target(root.clone())
///     .build();
///
/// assert_eq!(root.theme().as_deref(), Some("dark"));
///
/// theme.set_mode(ThemeMode::Light);
/// ambient.set_scheme(AmbientScheme::Dark);
/// assert_eq!(root.theme().as_deref(), Some("light"));
/// ```
pub struct ThemeContext {
    shared: Rc<Shared>,
    storage_key: String,
    _ambient: Subscription,
    _platform: Subscription,
    _source: Box<dyn SchemeSource>,
}

impl ThemeContext {
    pub fn builder() -> ThemeContextBuilder {
        ThemeContextBuilder::new()
    }

    /// The user's chosen mode.
    pub fn mode(&self) -> ThemeMode {
        self.shared.state.borrow().mode
    }

    /// The theme currently applied.
    pub fn resolved(&self) -> ResolvedTheme {
        self.shared.state.borrow().resolved
    }

    /// The last ambient scheme reported by the source.
    pub fn ambient(&self) -> AmbientScheme {
        self.shared.state.borrow().ambient
    }

    /// The current platform host, including the latest accepted colors.
    pub fn platform(&self) -> PlatformHost {
        self.shared.state.borrow().platform.clone()
    }

    pub fn storage_key(&self) -> &str {
        &self.storage_key
    }

    /// Switches mode and persists it. Persistence failures are logged and do
    /// not stop the switch. Returns the resolved theme afterwards.
    pub fn set_mode(&self, mode: ThemeMode) -> ResolvedTheme {
        self.shared.store.borrow_mut().save(mode);
        self.shared.transition(|state| state.mode = mode);
        self.resolved()
    }

    /// Reports an ambient scheme change. Only affects [`ThemeMode::System`].
    ///
    /// The context already listens to its scheme source; this is for hosts
    /// that deliver ambient events themselves.
    pub fn ambient_changed(&self, scheme: AmbientScheme) {
        self.shared.ambient_changed(scheme);
    }

    /// Reports a new platform payload for hosts that do not build the context
    /// from a [`PlatformScheme`]. Malformed colors are rejected and change
    /// nothing. The payload's color scheme is not treated as an ambient change.
    pub fn platform_changed(&self, context: WebAppContext) -> Result<(), PlatformError> {
        context.theme_params.validate()?;
        self.shared.platform_changed(context);
        Ok(())
    }

    /// Calls `listener` with every newly resolved theme, and again with
    /// [`ResolvedTheme::TelegramNative`] when the platform's colors change
    /// while that theme is in effect.
    pub fn subscribe(&self, listener: impl Fn(ResolvedTheme) + 'static) -> Subscription {
        self.shared.listeners.subscribe(listener)
    }

    /// Platform color variables to set on the root while the platform's own
    /// theme is in effect. Empty otherwise.
    pub fn theme_variables(&self) -> Vec<(String, String)> {
        let state = self.shared.state.borrow();
        match (state.resolved, state.platform.context()) {
            (ResolvedTheme::TelegramNative, Some(context)) => context.theme_params.css_variables(),
            _ => Vec::new(),
        }
    }
}

impl fmt::Debug for ThemeContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.shared.state.borrow();
        f.debug_struct("ThemeContext")
            .field("mode", &state.mode)
            .field("ambient", &state.ambient)
            .field("resolved", &state.resolved)
            .field("platform", &state.platform.is_present())
            .finish_non_exhaustive()
    }
}

/// Builder for [`ThemeContext`].
///
/// Unset parts default to an in-memory store, the operating system's scheme
/// and a detached [`RootElement`].
pub struct ThemeContextBuilder {
    config: ThemeConfig,
    store: Option<Box<dyn KeyValueStore>>,
    scheme: Option<Box<dyn SchemeSource>>,
    target: Option<Box<dyn ThemeTarget>>,
    platform: PlatformHost,
    platform_source: Option<PlatformScheme>,
}

impl ThemeContextBuilder {
    pub fn new() -> Self {
        Self {
            config: ThemeConfig::default(),
            store: None,
            scheme: None,
            target: None,
            platform: PlatformHost::Absent,
            platform_source: None,
        }
    }

    pub fn config(mut self, config: ThemeConfig) -> Self {
        self.config = config;
        self
    }

    pub fn storage_key(mut self, key: impl Into<String>) -> Self {
        self.config.storage_key = key.into();
        self
    }

    pub fn default_mode(mut self, mode: ThemeMode) -> Self {
        self.config.default_mode = mode;
        self
    }

    pub fn store(mut self, store: impl KeyValueStore + 'static) -> Self {
        self.store = Some(Box::new(store));
        self
    }

    pub fn scheme(mut self, scheme: impl SchemeSource + 'static) -> Self {
        self.scheme = Some(Box::new(scheme));
        self.platform_source = None;
        self
    }

    pub fn target(mut self, target: impl ThemeTarget + 'static) -> Self {
        self.target = Some(Box::new(target));
        self
    }

    /// A fixed platform snapshot. Later payloads go through
    /// [`ThemeContext::platform_changed`].
    pub fn platform(mut self, platform: PlatformHost) -> Self {
        self.platform = platform;
        self
    }

    /// Uses the platform as both the ambient source and the host context.
    /// Every `themeChanged` payload fed to `source` reaches the context.
    pub fn platform_scheme(mut self, source: PlatformScheme) -> Self {
        self.platform = PlatformHost::Present(source.context());
        self.scheme = Some(Box::new(source.clone()));
        self.platform_source = Some(source);
        self
    }

    pub fn build(self) -> ThemeContext {
        let backend = self
            .store
            .unwrap_or_else(|| Box::new(MemoryStore::new()));
        let scheme = self.scheme.unwrap_or_else(|| Box::new(OsScheme::new()));
        let mut target = self
            .target
            .unwrap_or_else(|| Box::new(RootElement::new()));

        let store = PreferenceStore::new(
            backend,
            self.config.storage_key.clone(),
            self.config.default_mode,
        );
        let mode = store.load();
        let ambient = scheme.current_scheme();
        let resolved = resolve(mode, ambient);
        target.apply(resolved);
        debug!(
            %mode,
            ?ambient,
            %resolved,
            platform = self.platform.is_present(),
            "theme context initialised"
        );

        let shared = Rc::new(Shared {
            state: RefCell::new(State {
                mode,
                ambient,
                resolved,
                platform: self.platform,
                target,
            }),
            store: RefCell::new(store),
            listeners: Listeners::new(),
        });

        let weak: Weak<Shared> = Rc::downgrade(&shared);
        let ambient_subscription = scheme.subscribe(Box::new(move |scheme| {
            if let Some(shared) = weak.upgrade() {
                shared.ambient_changed(scheme);
            }
        }));

        let platform_subscription = match &self.platform_source {
            Some(source) => {
                let weak: Weak<Shared> = Rc::downgrade(&shared);
                source.subscribe_context(move |context| {
                    if let Some(shared) = weak.upgrade() {
                        shared.platform_changed(context);
                    }
                })
            }
            None => Subscription::noop(),
        };

        ThemeContext {
            shared,
            storage_key: self.config.storage_key,
            _ambient: ambient_subscription,
            _platform: platform_subscription,
            _source: scheme,
        }
    }
}

impl Default for ThemeContextBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::theme::scheme::{ManualScheme, UnsupportedScheme};

    struct Harness {
        ambient: ManualScheme,
        store: MemoryStore,
        root: RootElement,
        theme: ThemeContext,
    }

    fn harness(stored: Option<&str>, ambient: AmbientScheme) -> Harness {
        let store = match stored {
            Some(value) => MemoryStore::with_entry(DEFAULT_STORAGE_KEY, value),
            None => MemoryStore::new(),
        };
        let ambient = ManualScheme::new(ambient);
        let root = RootElement::new();
        let theme = ThemeContext::builder()
            .store(store.clone())
            .scheme(ambient.clone())
            .target(root.clone())
            .build();
        Harness {
            ambient,
            store,
            root,
            theme,
        }
    }

    fn record(theme: &ThemeContext) -> (Rc<RefCell<Vec<ResolvedTheme>>>, Subscription) {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let sub = theme.subscribe(move |t| sink.borrow_mut().push(t));
        (seen, sub)
    }

    #[test]
    fn test_initial_state_applied_once() {
        let h = harness(None, AmbientScheme::Dark);
        assert_eq!(h.theme.mode(), ThemeMode::System);
        assert_eq!(h.theme.resolved(), ResolvedTheme::Dark);
        assert_eq!(h.root.theme().as_deref(), Some("dark"));
        assert_eq!(h.root.apply_count(), 1);
    }

    #[test]
    fn test_initial_mode_from_store() {
        let h = harness(Some("telegram"), AmbientScheme::Dark);
        assert_eq!(h.theme.mode(), ThemeMode::TelegramNative);
        assert_eq!(h.root.theme().as_deref(), Some("telegram"));
    }

    #[test]
    fn test_set_mode_persists_applies_and_publishes() {
        let h = harness(None, AmbientScheme::Dark);
        let (seen, _sub) = record(&h.theme);

        assert_eq!(h.theme.set_mode(ThemeMode::Light), ResolvedTheme::Light);

        assert_eq!(h.store.value(DEFAULT_STORAGE_KEY).as_deref(), Some("light"));
        assert_eq!(h.root.theme().as_deref(), Some("light"));
        assert_eq!(*seen.borrow(), vec![ResolvedTheme::Light]);
    }

    #[test]
    fn test_set_same_mode_is_idempotent() {
        let h = harness(Some("dark"), AmbientScheme::Light);
        let (seen, _sub) = record(&h.theme);

        h.theme.set_mode(ThemeMode::Dark);
        h.theme.set_mode(ThemeMode::Dark);

        assert_eq!(h.root.apply_count(), 1);
        assert!(seen.borrow().is_empty());
    }

    #[test]
    fn test_mode_change_with_same_resolution_does_not_reapply() {
        let h = harness(Some("system"), AmbientScheme::Dark);
        h.theme.set_mode(ThemeMode::Dark);
        assert_eq!(h.theme.mode(), ThemeMode::Dark);
        assert_eq!(h.root.apply_count(), 1);
        assert_eq!(h.store.value(DEFAULT_STORAGE_KEY).as_deref(), Some("dark"));
    }

    #[test]
    fn test_ambient_followed_in_system_mode() {
        let h = harness(None, AmbientScheme::Light);
        let (seen, _sub) = record(&h.theme);

        h.ambient.set_scheme(AmbientScheme::Dark);

        assert_eq!(h.theme.resolved(), ResolvedTheme::Dark);
        assert_eq!(h.root.theme().as_deref(), Some("dark"));
        assert_eq!(*seen.borrow(), vec![ResolvedTheme::Dark]);
    }

    #[test]
    fn test_ambient_ignored_outside_system_mode() {
        for stored in ["light", "dark", "telegram"] {
            let h = harness(Some(stored), AmbientScheme::Light);
            let (seen, _sub) = record(&h.theme);
            let before = h.theme.resolved();

            h.ambient.set_scheme(AmbientScheme::Dark);
            h.theme.ambient_changed(AmbientScheme::Light);
            h.theme.ambient_changed(AmbientScheme::Dark);

            assert_eq!(h.theme.resolved(), before, "mode {stored}");
            assert_eq!(h.root.apply_count(), 1, "mode {stored}");
            assert!(seen.borrow().is_empty(), "mode {stored}");
        }
    }

    #[test]
    fn test_return_to_system_uses_latest_ambient() {
        let h = harness(Some("light"), AmbientScheme::Light);
        h.ambient.set_scheme(AmbientScheme::Dark);
        assert_eq!(h.theme.ambient(), AmbientScheme::Dark);

        assert_eq!(h.theme.set_mode(ThemeMode::System), ResolvedTheme::Dark);
    }

    #[test]
    fn test_persistence_failure_does_not_block_transition() {
        struct ReadOnly;
        impl KeyValueStore for ReadOnly {
            fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
                Ok(None)
            }
            fn set(&mut self, _key: &str, _value: &str) -> Result<(), StoreError> {
                Err(StoreError::Unavailable("read-only".to_string()))
            }
        }

        let root = RootElement::new();
        let theme = ThemeContext::builder()
            .store(ReadOnly)
            .scheme(UnsupportedScheme)
            .target(root.clone())
            .build();
        let (seen, _sub) = record(&theme);

        theme.set_mode(ThemeMode::Dark);

        assert_eq!(theme.mode(), ThemeMode::Dark);
        assert_eq!(root.theme().as_deref(), Some("dark"));
        assert_eq!(*seen.borrow(), vec![ResolvedTheme::Dark]);
    }

    #[test]
    fn test_unsupported_scheme_resolves_system_to_light() {
        let theme = ThemeContext::builder().scheme(UnsupportedScheme).build();
        assert_eq!(theme.resolved(), ResolvedTheme::Light);
    }

    #[test]
    fn test_drop_releases_ambient_subscription() {
        let h = harness(None, AmbientScheme::Light);
        assert_eq!(h.ambient.subscriber_count(), 1);
        let Harness { ambient, theme, .. } = h;

        drop(theme);

        assert_eq!(ambient.subscriber_count(), 0);
        ambient.set_scheme(AmbientScheme::Dark);
    }

    #[test]
    fn test_listener_may_set_mode() {
        let h = harness(None, AmbientScheme::Light);
        let theme = Rc::new(h.theme);
        let inner = Rc::downgrade(&theme);
        let _sub = theme.subscribe(move |resolved| {
            if resolved == ResolvedTheme::Dark {
                if let Some(theme) = inner.upgrade() {
                    theme.set_mode(ThemeMode::Light);
                }
            }
        });

        h.ambient.set_scheme(AmbientScheme::Dark);

        assert_eq!(theme.mode(), ThemeMode::Light);
        assert_eq!(theme.resolved(), ResolvedTheme::Light);
        assert_eq!(h.root.theme().as_deref(), Some("light"));
    }

    #[test]
    fn test_custom_storage_key_and_default() {
        let store = MemoryStore::new();
        let theme = ThemeContext::builder()
            .storage_key("prefs.theme")
            .default_mode(ThemeMode::Dark)
            .store(store.clone())
            .scheme(UnsupportedScheme)
            .build();

        assert_eq!(theme.mode(), ThemeMode::Dark);
        assert_eq!(theme.storage_key(), "prefs.theme");
        theme.set_mode(ThemeMode::Light);
        assert_eq!(store.value("prefs.theme").as_deref(), Some("light"));
        assert_eq!(store.value(DEFAULT_STORAGE_KEY), None);
    }

    #[test]
    fn test_theme_variables_only_for_platform_theme() {
        let context = WebAppContext::from_json(r##"{"themeParams": {"bg_color": "#000000"}}"##)
            .unwrap();
        let theme = ThemeContext::builder()
            .scheme(UnsupportedScheme)
            .platform(PlatformHost::Present(context))
            .build();

        assert!(theme.theme_variables().is_empty());
        theme.set_mode(ThemeMode::TelegramNative);
        assert_eq!(
            theme.theme_variables(),
            vec![("--tg-theme-bg-color".to_string(), "#000000".to_string())]
        );
    }

    #[test]
    fn test_platform_presence_does_not_force_telegram() {
        let theme = ThemeContext::builder()
            .scheme(UnsupportedScheme)
            .platform(PlatformHost::Present(WebAppContext::default()))
            .build();
        assert_eq!(theme.mode(), ThemeMode::System);
        assert_eq!(theme.resolved(), ResolvedTheme::Light);
    }

    fn platform_payload(bg: &str) -> WebAppContext {
        let mut context = WebAppContext::default();
        context.theme_params.bg_color = Some(bg.to_string());
        context
    }

    #[test]
    fn test_platform_theme_changed_refreshes_colors() {
        let source = PlatformScheme::new(&platform_payload("#000000"));
        let root = RootElement::new();
        let theme = ThemeContext::builder()
            .platform_scheme(source.clone())
            .target(root.clone())
            .build();
        theme.set_mode(ThemeMode::TelegramNative);
        let (seen, _sub) = record(&theme);
        let writes = root.apply_count();

        source.theme_changed(&platform_payload("#ffffff")).unwrap();

        assert_eq!(
            theme.theme_variables(),
            vec![("--tg-theme-bg-color".to_string(), "#ffffff".to_string())]
        );
        assert_eq!(*seen.borrow(), vec![ResolvedTheme::TelegramNative]);
        assert_eq!(root.apply_count(), writes + 1);
        assert_eq!(root.theme().as_deref(), Some("telegram"));
    }

    #[test]
    fn test_platform_colors_outside_platform_theme_are_kept_quietly() {
        let source = PlatformScheme::new(&platform_payload("#000000"));
        let root = RootElement::new();
        let theme = ThemeContext::builder()
            .platform_scheme(source.clone())
            .target(root.clone())
            .build();
        let (seen, _sub) = record(&theme);

        source.theme_changed(&platform_payload("#ffffff")).unwrap();

        assert!(seen.borrow().is_empty());
        assert_eq!(root.apply_count(), 1);
        theme.set_mode(ThemeMode::TelegramNative);
        assert_eq!(
            theme.theme_variables(),
            vec![("--tg-theme-bg-color".to_string(), "#ffffff".to_string())]
        );
    }

    #[test]
    fn test_platform_changed_validates_colors() {
        let theme = ThemeContext::builder()
            .scheme(UnsupportedScheme)
            .platform(PlatformHost::Present(platform_payload("#000000")))
            .build();
        theme.set_mode(ThemeMode::TelegramNative);
        let (seen, _sub) = record(&theme);

        let err = theme.platform_changed(platform_payload("black")).unwrap_err();
        assert!(matches!(err, PlatformError::InvalidColor { name: "bg_color", .. }));
        assert!(seen.borrow().is_empty());
        assert_eq!(theme.platform(), PlatformHost::Present(platform_payload("#000000")));

        theme.platform_changed(platform_payload("#fff")).unwrap();
        assert_eq!(*seen.borrow(), vec![ResolvedTheme::TelegramNative]);
        assert_eq!(
            theme.theme_variables(),
            vec![("--tg-theme-bg-color".to_string(), "#fff".to_string())]
        );
    }

    #[test]
    fn test_store_may_read_context_while_saving() {
        type Handle = Rc<RefCell<Option<Weak<ThemeContext>>>>;

        struct Observing {
            context: Handle,
            seen_modes: Rc<RefCell<Vec<ThemeMode>>>,
        }

        impl KeyValueStore for Observing {
            fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
                Ok(None)
            }
            fn set(&mut self, _key: &str, _value: &str) -> Result<(), StoreError> {
                if let Some(theme) = self.context.borrow().as_ref().and_then(Weak::upgrade) {
                    self.seen_modes.borrow_mut().push(theme.mode());
                }
                Ok(())
            }
        }

        let handle: Handle = Rc::new(RefCell::new(None));
        let seen_modes = Rc::new(RefCell::new(Vec::new()));
        let theme = Rc::new(
            ThemeContext::builder()
                .store(Observing {
                    context: Rc::clone(&handle),
                    seen_modes: Rc::clone(&seen_modes),
                })
                .scheme(UnsupportedScheme)
                .build(),
        );
        *handle.borrow_mut() = Some(Rc::downgrade(&theme));

        theme.set_mode(ThemeMode::Dark);

        assert_eq!(*seen_modes.borrow(), vec![ThemeMode::System]);
        assert_eq!(theme.mode(), ThemeMode::Dark);
    }

    #[test]
    fn test_config_deserializes_with_defaults() {
        let config: ThemeConfig = serde_json::from_str(r#"{"default_mode": "dark"}"#).unwrap();
        assert_eq!(config.storage_key, DEFAULT_STORAGE_KEY);
        assert_eq!(config.default_mode, ThemeMode::Dark);
    }
}
