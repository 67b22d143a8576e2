//! Where a resolved theme gets applied.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use super::mode::ResolvedTheme;

/// Attribute carrying the theme name on the presentation root.
pub const THEME_ATTRIBUTE: &str = "data-theme";

/// Receives each newly resolved theme.
///
/// Implementations must not call back into the theme context.
pub trait ThemeTarget {
    fn apply(&mut self, theme: ResolvedTheme);
}

impl<F> ThemeTarget for F
where
    F: FnMut(ResolvedTheme),
{
    fn apply(&mut self, theme: ResolvedTheme) {
        self(theme)
    }
}

#[derive(Debug, Default)]
struct ElementState {
    attributes: BTreeMap<String, String>,
    classes: Vec<String>,
    writes: usize,
}

/// The document root: attributes, a class list and a count of theme writes.
///
/// Clones are handles to the same element.
#[derive(Debug, Clone, Default)]
pub struct RootElement {
    state: Rc<RefCell<ElementState>>,
}

impl RootElement {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attribute(&self, name: &str) -> Option<String> {
        self.state.borrow().attributes.get(name).cloned()
    }

    pub fn set_attribute(&self, name: &str, value: &str) {
        self.state
            .borrow_mut()
            .attributes
            .insert(name.to_string(), value.to_string());
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.state.borrow().classes.iter().any(|c| c == class)
    }

    pub fn classes(&self) -> Vec<String> {
        self.state.borrow().classes.clone()
    }

    pub fn add_class(&self, class: &str) {
        let mut state = self.state.borrow_mut();
        if !state.classes.iter().any(|c| c == class) {
            state.classes.push(class.to_string());
        }
    }

    /// Number of times a theme has been applied.
    pub fn apply_count(&self) -> usize {
        self.state.borrow().writes
    }

    /// The theme currently marked on the element, if any.
    pub fn theme(&self) -> Option<String> {
        self.attribute(THEME_ATTRIBUTE)
    }
}

impl ThemeTarget for RootElement {
    fn apply(&mut self, theme: ResolvedTheme) {
        let mut state = self.state.borrow_mut();
        state.attributes.remove(THEME_ATTRIBUTE);
        state
            .classes
            .retain(|c| c != ResolvedTheme::Light.as_str() && c != ResolvedTheme::Dark.as_str());

        state
            .attributes
            .insert(THEME_ATTRIBUTE.to_string(), theme.as_str().to_string());
        if theme != ResolvedTheme::TelegramNative {
            state.classes.push(theme.as_str().to_string());
        }
        state.writes += 1;
    }
}
