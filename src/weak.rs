//! Slot types: weak pointers the set can store, resolve, and compare by identity.
//!
//! A slot is resolvable while its target has at least one strong pointer
//! outside the set, and expired afterwards. Identity is the address of the
//! shared allocation with pointer metadata stripped, so `Rc<dyn Trait>` values
//! compare by data pointer only. A `Weak` keeps its allocation reserved, so the
//! address of an expired slot cannot be handed out to a new object while the
//! slot exists.

use core::hash::{Hash, Hasher};
use std::rc;
use std::sync;

/// A non-owning handle to a shared object.
pub trait WeakElement {
    /// The owning pointer type this handle is created from and resolves to.
    type Strong;

    /// Create a handle that does not keep `strong` alive.
    fn new(strong: &Self::Strong) -> Self;

    /// Resolve to a fresh strong pointer, or `None` once the target is gone.
    fn view(&self) -> Option<Self::Strong>;

    /// Whether the target has been reclaimed.
    fn is_expired(&self) -> bool;

    /// Address of the target allocation.
    fn addr(&self) -> *const ();

    /// Address of the allocation `strong` points to.
    fn strong_addr(strong: &Self::Strong) -> *const ();

    /// Identity comparison against a strong pointer. Never consults `PartialEq`.
    #[inline]
    fn is_same(&self, strong: &Self::Strong) -> bool {
        self.addr() == Self::strong_addr(strong)
    }
}

/// A handle whose target can be hashed to pick a bucket.
///
/// The hash must not change while the target is a member of a set, otherwise
/// lookups search the wrong bucket and miss the member until it is dropped.
pub trait WeakKey: WeakElement {
    fn hash_strong<H: Hasher>(strong: &Self::Strong, state: &mut H);
}

impl<T: ?Sized> WeakElement for rc::Weak<T> {
    type Strong = rc::Rc<T>;

    #[inline]
    fn new(strong: &Self::Strong) -> Self {
        rc::Rc::downgrade(strong)
    }

    #[inline]
    fn view(&self) -> Option<Self::Strong> {
        self.upgrade()
    }

    #[inline]
    fn is_expired(&self) -> bool {
        self.strong_count() == 0
    }

    #[inline]
    fn addr(&self) -> *const () {
        self.as_ptr() as *const ()
    }

    #[inline]
    fn strong_addr(strong: &Self::Strong) -> *const () {
        rc::Rc::as_ptr(strong) as *const ()
    }
}

impl<T: ?Sized + Hash> WeakKey for rc::Weak<T> {
    #[inline]
    fn hash_strong<H: Hasher>(strong: &Self::Strong, state: &mut H) {
        (**strong).hash(state)
    }
}

impl<T: ?Sized> WeakElement for sync::Weak<T> {
    type Strong = sync::Arc<T>;

    #[inline]
    fn new(strong: &Self::Strong) -> Self {
        sync::Arc::downgrade(strong)
    }

    #[inline]
    fn view(&self) -> Option<Self::Strong> {
        self.upgrade()
    }

    #[inline]
    fn is_expired(&self) -> bool {
        self.strong_count() == 0
    }

    #[inline]
    fn addr(&self) -> *const () {
        self.as_ptr() as *const ()
    }

    #[inline]
    fn strong_addr(strong: &Self::Strong) -> *const () {
        sync::Arc::as_ptr(strong) as *const ()
    }
}

impl<T: ?Sized + Hash> WeakKey for sync::Weak<T> {
    #[inline]
    fn hash_strong<H: Hasher>(strong: &Self::Strong, state: &mut H) {
        (**strong).hash(state)
    }
}

/// Wrapper that hashes a slot by the address of its target instead of its
/// value. Works for targets without a `Hash` impl (closures, trait objects)
/// and is immune to targets whose hash changes over time.
#[derive(Clone, Debug, Default)]
pub struct ByAddress<W>(pub W);

impl<W: WeakElement> WeakElement for ByAddress<W> {
    type Strong = W::Strong;

    #[inline]
    fn new(strong: &Self::Strong) -> Self {
        ByAddress(W::new(strong))
    }

    #[inline]
    fn view(&self) -> Option<Self::Strong> {
        self.0.view()
    }

    #[inline]
    fn is_expired(&self) -> bool {
        self.0.is_expired()
    }

    #[inline]
    fn addr(&self) -> *const () {
        self.0.addr()
    }

    #[inline]
    fn strong_addr(strong: &Self::Strong) -> *const () {
        W::strong_addr(strong)
    }
}

impl<W: WeakElement> WeakKey for ByAddress<W> {
    #[inline]
    fn hash_strong<H: Hasher>(strong: &Self::Strong, state: &mut H) {
        (W::strong_addr(strong) as usize).hash(state)
    }
}
