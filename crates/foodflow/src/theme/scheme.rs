//! Sources of the ambient light/dark preference.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use tracing::{debug, trace};

use super::mode::AmbientScheme;
use crate::error::PlatformError;
use crate::platform::WebAppContext;
use crate::subscription::{Listeners, Subscription};

/// Something that knows the host's light/dark preference and reports changes.
pub trait SchemeSource {
    /// Snapshot of the preference at call time.
    fn current_scheme(&self) -> AmbientScheme;

    /// Calls `on_change` for every change until the guard is released.
    fn subscribe(&self, on_change: Box<dyn Fn(AmbientScheme)>) -> Subscription;
}

/// Current value plus listeners, shared by the concrete sources.
#[derive(Debug)]
struct SchemeState {
    current: Cell<AmbientScheme>,
    listeners: Listeners<AmbientScheme>,
}

impl SchemeState {
    fn new(initial: AmbientScheme) -> Rc<Self> {
        Rc::new(Self {
            current: Cell::new(initial),
            listeners: Listeners::new(),
        })
    }

    /// Stores `scheme` and notifies if it differs from the previous value.
    fn update(&self, scheme: AmbientScheme) -> bool {
        if self.current.replace(scheme) == scheme {
            trace!(?scheme, "ambient scheme unchanged");
            return false;
        }
        debug!(?scheme, "ambient scheme changed");
        self.listeners.emit(scheme);
        true
    }

    fn subscribe(&self, on_change: Box<dyn Fn(AmbientScheme)>) -> Subscription {
        self.listeners.subscribe(on_change)
    }
}

/// A source the host drives by hand, the way a media-query change event would.
///
/// Clones share state: keep one handle, give another to the theme context.
#[derive(Debug, Clone)]
pub struct ManualScheme {
    state: Rc<SchemeState>,
}

impl ManualScheme {
    pub fn new(initial: AmbientScheme) -> Self {
        Self {
            state: SchemeState::new(initial),
        }
    }

    /// Reports a new preference. Returns whether it was a change.
    pub fn set_scheme(&self, scheme: AmbientScheme) -> bool {
        self.state.update(scheme)
    }

    pub fn subscriber_count(&self) -> usize {
        self.state.listeners.len()
    }
}

impl SchemeSource for ManualScheme {
    fn current_scheme(&self) -> AmbientScheme {
        self.state.current.get()
    }

    fn subscribe(&self, on_change: Box<dyn Fn(AmbientScheme)>) -> Subscription {
        self.state.subscribe(on_change)
    }
}

/// Function used to query the operating system's preference.
pub type SchemeDetector = fn() -> AmbientScheme;

fn detect_os_scheme() -> AmbientScheme {
    dark_light::detect().into()
}

/// The operating system's preference, read through `dark-light`.
///
/// The OS gives no change notification here; the host calls
/// [`poll`](OsScheme::poll) from its event loop.
#[derive(Debug, Clone)]
pub struct OsScheme {
    state: Rc<SchemeState>,
    detector: SchemeDetector,
}

impl OsScheme {
    pub fn new() -> Self {
        Self::with_detector(detect_os_scheme)
    }

    /// Uses `detector` instead of asking the OS. Handy for tests.
    pub fn with_detector(detector: SchemeDetector) -> Self {
        Self {
            state: SchemeState::new(detector()),
            detector,
        }
    }

    /// Re-detects and notifies subscribers. Returns the new scheme if it changed.
    pub fn poll(&self) -> Option<AmbientScheme> {
        let scheme = (self.detector)();
        self.state.update(scheme).then_some(scheme)
    }
}

impl Default for OsScheme {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemeSource for OsScheme {
    fn current_scheme(&self) -> AmbientScheme {
        self.state.current.get()
    }

    fn subscribe(&self, on_change: Box<dyn Fn(AmbientScheme)>) -> Subscription {
        self.state.subscribe(on_change)
    }
}

/// The Mini-App platform's `colorScheme` and colors, updated on its
/// `themeChanged` event.
///
/// Clones share state. Besides ambient changes, subscribers of
/// [`subscribe_context`](PlatformScheme::subscribe_context) hear about every
/// accepted payload whose theme parameters changed.
#[derive(Debug, Clone)]
pub struct PlatformScheme {
    state: Rc<SchemeState>,
    context: Rc<RefCell<WebAppContext>>,
    context_listeners: Rc<Listeners<WebAppContext>>,
}

impl PlatformScheme {
    pub fn new(context: &WebAppContext) -> Self {
        Self {
            state: SchemeState::new(context.color_scheme),
            context: Rc::new(RefCell::new(context.clone())),
            context_listeners: Rc::new(Listeners::new()),
        }
    }

    /// The last accepted platform payload.
    pub fn context(&self) -> WebAppContext {
        self.context.borrow().clone()
    }

    /// Feeds the platform's `themeChanged` payload.
    ///
    /// Payloads with malformed colors are rejected and change nothing.
    /// Returns whether the color scheme changed.
    pub fn theme_changed(&self, context: &WebAppContext) -> Result<bool, PlatformError> {
        context.theme_params.validate()?;
        let params_changed = {
            let mut current = self.context.borrow_mut();
            let changed = current.theme_params != context.theme_params;
            *current = context.clone();
            changed
        };
        if params_changed {
            debug!("platform theme parameters changed");
            self.context_listeners.emit(context.clone());
        }
        Ok(self.state.update(context.color_scheme))
    }

    /// Calls `on_change` with each payload that brings new theme parameters.
    pub fn subscribe_context(&self, on_change: impl Fn(WebAppContext) + 'static) -> Subscription {
        self.context_listeners.subscribe(on_change)
    }
}

impl SchemeSource for PlatformScheme {
    fn current_scheme(&self) -> AmbientScheme {
        self.state.current.get()
    }

    fn subscribe(&self, on_change: Box<dyn Fn(AmbientScheme)>) -> Subscription {
        self.state.subscribe(on_change)
    }
}

/// A host without any ambient preference query: always light, never fires.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnsupportedScheme;

impl SchemeSource for UnsupportedScheme {
    fn current_scheme(&self) -> AmbientScheme {
        AmbientScheme::Light
    }

    fn subscribe(&self, _on_change: Box<dyn Fn(AmbientScheme)>) -> Subscription {
        Subscription::noop()
    }
}
