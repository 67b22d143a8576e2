//! Single-threaded publish/subscribe with scoped unsubscription.
//!
//! [`Listeners`] keeps callbacks for one event type. Each call to
//! [`Listeners::subscribe`] hands back a [`Subscription`] guard; dropping the
//! guard (or calling [`Subscription::unsubscribe`]) removes the callback.
//!
//! Emission works on a snapshot of the registered callbacks and never holds a
//! borrow while a callback runs, so callbacks may subscribe, unsubscribe or
//! emit again. A callback removed during an emission pass is skipped for the
//! rest of that pass: once `unsubscribe` returns, it is never called again.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

type Callback<T> = Rc<dyn Fn(T)>;

struct Entry<T> {
    id: u64,
    active: Rc<Cell<bool>>,
    callback: Callback<T>,
}

struct Registry<T> {
    next_id: u64,
    entries: Vec<Entry<T>>,
}

/// A set of callbacks notified with values of type `T`.
pub struct Listeners<T> {
    registry: Rc<RefCell<Registry<T>>>,
}

impl<T: Clone + 'static> Listeners<T> {
    pub fn new() -> Self {
        Self {
            registry: Rc::new(RefCell::new(Registry {
                next_id: 0,
                entries: Vec::new(),
            })),
        }
    }

    /// Registers `callback` until the returned guard is released.
    pub fn subscribe(&self, callback: impl Fn(T) + 'static) -> Subscription {
        let active = Rc::new(Cell::new(true));
        let id = {
            let mut registry = self.registry.borrow_mut();
            let id = registry.next_id;
            registry.next_id += 1;
            registry.entries.push(Entry {
                id,
                active: Rc::clone(&active),
                callback: Rc::new(callback),
            });
            id
        };

        let registry: Weak<RefCell<Registry<T>>> = Rc::downgrade(&self.registry);
        Subscription::new(move || {
            active.set(false);
            if let Some(registry) = registry.upgrade() {
                registry.borrow_mut().entries.retain(|entry| entry.id != id);
            }
        })
    }

    /// Calls every live callback with a clone of `value`, in subscription order.
    pub fn emit(&self, value: T) {
        let snapshot: Vec<(Rc<Cell<bool>>, Callback<T>)> = self
            .registry
            .borrow()
            .entries
            .iter()
            .map(|entry| (Rc::clone(&entry.active), Rc::clone(&entry.callback)))
            .collect();

        for (active, callback) in snapshot {
            if active.get() {
                callback(value.clone());
            }
        }
    }

    pub fn len(&self) -> usize {
        self.registry.borrow().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: Clone + 'static> Default for Listeners<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Listeners<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listeners")
            .field("len", &self.registry.borrow().entries.len())
            .finish()
    }
}

/// Guard for a registered callback. Released exactly once, on
/// [`unsubscribe`](Subscription::unsubscribe) or drop, whichever comes first.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    release: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    pub(crate) fn new(release: impl FnOnce() + 'static) -> Self {
        Self {
            release: Some(Box::new(release)),
        }
    }

    /// A subscription to a source that never fires.
    pub fn noop() -> Self {
        Self { release: None }
    }

    /// Removes the callback. Calling this again is a no-op.
    pub fn unsubscribe(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }

    pub fn is_active(&self) -> bool {
        self.release.is_some()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.is_active())
            .finish()
    }
}
