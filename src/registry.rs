//! Registry: event handlers tracked without keeping them alive.
//!
//! A registry is an ordinary value. Construct one and hand it by reference to
//! whatever publishes or subscribes; there is no process-wide instance.

use crate::error::WeakSetError;
use crate::weak::ByAddress;
use crate::weak_set::PtrWeakSet;
use std::fmt;
use std::rc::{Rc, Weak};
use tracing::debug;

/// Shared event handler. The subscriber owns it; the registry only observes it.
pub type Handler<E> = Rc<dyn Fn(&E)>;

/// Set of event handlers keyed by handler identity.
///
/// Subscribing never extends a handler's lifetime: once every `Handler` clone
/// held by its owner is dropped, the handler stops receiving events.
pub struct Registry<E: ?Sized + 'static> {
    handlers: PtrWeakSet<Weak<dyn Fn(&E)>>,
}

impl<E: ?Sized + 'static> Registry<E> {
    pub fn new() -> Self {
        Self {
            handlers: PtrWeakSet::new(),
        }
    }

    /// Returns false if `handler` was already subscribed.
    pub fn subscribe(&self, handler: &Handler<E>) -> bool {
        self.handlers.insert(handler)
    }

    /// Returns false if `handler` was not subscribed.
    pub fn unsubscribe(&self, handler: &Handler<E>) -> bool {
        self.handlers.remove(handler)
    }

    pub fn is_subscribed(&self, handler: &Handler<E>) -> bool {
        self.handlers.contains(handler)
    }

    /// Subscribe through a weak handle. Fails if the handler is already gone.
    pub fn try_subscribe(&self, handler: &Weak<dyn Fn(&E)>) -> Result<bool, WeakSetError> {
        self.handlers.try_insert(&ByAddress(handler.clone()))
    }

    /// Unsubscribe through a weak handle. Fails if the handler is already gone.
    pub fn try_unsubscribe(&self, handler: &Weak<dyn Fn(&E)>) -> Result<bool, WeakSetError> {
        self.handlers.try_remove(&ByAddress(handler.clone()))
    }

    /// Invoke every live handler once with `event`. Returns how many ran.
    ///
    /// The handler list is copied out before the first call, so handlers may
    /// subscribe or unsubscribe; the change applies from the next publish.
    pub fn publish(&self, event: &E) -> usize {
        let live = self.handlers.to_vec();
        debug!(handlers = live.len(), "publishing event");
        for handler in &live {
            handler(event);
        }
        live.len()
    }

    /// Number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.handlers.len()
    }

    pub fn clear(&self) {
        self.handlers.clear();
    }
}

impl<E: ?Sized + 'static> Default for Registry<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: ?Sized + 'static> fmt::Debug for Registry<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("slots", &self.handlers.slot_count())
            .finish()
    }
}
