//! WeakSet: public set of weak pointers with lazy pruning.

use crate::bucket_index::{BucketIndex, Cursor};
use crate::error::WeakSetError;
use crate::weak::{ByAddress, WeakElement, WeakKey};
use core::cell::RefCell;
use core::fmt;
use core::hash::{BuildHasher, Hasher};
use core::iter::FusedIterator;
use std::collections::hash_map::RandomState;
use std::rc;
use std::sync;
use tracing::debug;

/// A set that tracks shared objects by identity without keeping them alive.
///
/// Members are stored as weak pointers. Once the last strong pointer to a
/// member is dropped, the member disappears from every later `contains`,
/// `len` and `iter`; its slot is discarded the next time an operation scans
/// it. All operations take `&self` and prune through interior mutability, so
/// the set is `!Sync`.
///
/// Equality is object identity. Two distinct objects that compare equal with
/// `PartialEq` are two members.
///
/// With `rc::Weak<T>` / `sync::Weak<T>` slots the bucket is chosen by the
/// target's `Hash`, which must stay the same while it is a member. A member
/// whose hash changes cannot be found or removed by lookup until it is dropped.
/// Use [`ByAddress`] slots (see [`PtrWeakSet`]) to hash by address instead.
///
/// ```
/// use rc_weakset::RcWeakSet;
/// use std::rc::Rc;
///
/// let set = RcWeakSet::new();
/// let a = Rc::new("a".to_string());
/// assert!(set.insert(&a));
/// assert!(set.contains(&a));
/// drop(a);
/// assert_eq!(set.len(), 0);
/// ```
pub struct WeakSet<W, S = RandomState> {
    hasher: S,
    table: RefCell<BucketIndex<W>>,
}

/// Set of `Rc` targets, hashed by value.
pub type RcWeakSet<T, S = RandomState> = WeakSet<rc::Weak<T>, S>;
/// Set of `Arc` targets, hashed by value.
pub type ArcWeakSet<T, S = RandomState> = WeakSet<sync::Weak<T>, S>;
/// Set hashed by target address. `W` is the underlying weak pointer type.
pub type PtrWeakSet<W, S = RandomState> = WeakSet<ByAddress<W>, S>;

impl<W: WeakKey> WeakSet<W> {
    pub fn new() -> Self {
        Self::with_hasher(Default::default())
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_hasher(capacity, Default::default())
    }
}

impl<W: WeakKey> Default for WeakSet<W> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: WeakKey, S: BuildHasher> WeakSet<W, S> {
    pub fn with_hasher(hasher: S) -> Self {
        Self {
            hasher,
            table: RefCell::new(BucketIndex::new()),
        }
    }

    pub fn with_capacity_and_hasher(capacity: usize, hasher: S) -> Self {
        Self {
            hasher,
            table: RefCell::new(BucketIndex::with_capacity(capacity)),
        }
    }

    // User code (`Hash`) only ever runs here, before the table is borrowed.
    fn make_hash(&self, strong: &W::Strong) -> u64 {
        let mut state = self.hasher.build_hasher();
        W::hash_strong(strong, &mut state);
        state.finish()
    }

    /// Start tracking `item`. Returns false if it is already a member.
    pub fn insert(&self, item: &W::Strong) -> bool {
        let hash = self.make_hash(item);
        self.table.borrow_mut().insert(hash, item)
    }

    /// Stop tracking `item`. Returns whether it was a member.
    pub fn remove(&self, item: &W::Strong) -> bool {
        let hash = self.make_hash(item);
        self.table.borrow_mut().remove(hash, item)
    }

    /// Membership test by identity. Prunes expired slots sharing `item`'s bucket.
    pub fn contains(&self, item: &W::Strong) -> bool {
        let hash = self.make_hash(item);
        self.table.borrow_mut().contains(hash, item)
    }

    /// Like [`insert`](Self::insert), for callers holding only a weak handle.
    pub fn try_insert(&self, item: &W) -> Result<bool, WeakSetError> {
        let strong = resolve(item, "try_insert")?;
        Ok(self.insert(&strong))
    }

    /// Like [`remove`](Self::remove), for callers holding only a weak handle.
    pub fn try_remove(&self, item: &W) -> Result<bool, WeakSetError> {
        let strong = resolve(item, "try_remove")?;
        Ok(self.remove(&strong))
    }

    /// Like [`contains`](Self::contains), for callers holding only a weak handle.
    pub fn try_contains(&self, item: &W) -> Result<bool, WeakSetError> {
        let strong = resolve(item, "try_contains")?;
        Ok(self.contains(&strong))
    }
}

fn resolve<W: WeakElement>(
    item: &W,
    operation: &'static str,
) -> Result<W::Strong, WeakSetError> {
    item.view().ok_or_else(|| {
        debug!(operation, "rejected dangling weak handle");
        WeakSetError::dangling(operation)
    })
}

impl<W: WeakElement, S> WeakSet<W, S> {
    pub fn hasher(&self) -> &S {
        &self.hasher
    }

    /// Number of live members. Prunes the whole set, so this is O(slots).
    pub fn len(&self) -> usize {
        self.table.borrow_mut().live_len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Forget every member at once.
    pub fn clear(&self) {
        let mut table = self.table.borrow_mut();
        debug!(buckets = table.bucket_count(), "clearing weak set");
        table.clear();
    }

    /// Lazily yield a strong pointer to each live member.
    ///
    /// The pass covers the buckets present when `iter` was called. The set is
    /// not borrowed between steps, so the loop body may use the set, including
    /// removing the member it was just given. Members added meanwhile may or
    /// may not be visited.
    pub fn iter(&self) -> Iter<'_, W, S> {
        Iter {
            set: self,
            cursor: self.table.borrow().cursor(),
        }
    }

    /// Copy out strong pointers to every live member.
    pub fn to_vec(&self) -> Vec<W::Strong> {
        self.iter().collect()
    }

    /// Discard every expired slot now. Returns how many were discarded.
    pub fn remove_expired(&self) -> usize {
        self.table.borrow_mut().prune_all()
    }

    /// Stored slots, including expired ones not pruned yet. Does not prune.
    pub fn slot_count(&self) -> usize {
        self.table.borrow().slot_count()
    }

    /// Buckets currently in the index. Does not prune.
    pub fn bucket_count(&self) -> usize {
        self.table.borrow().bucket_count()
    }
}

impl<W: Clone, S: Clone> Clone for WeakSet<W, S> {
    fn clone(&self) -> Self {
        Self {
            hasher: self.hasher.clone(),
            table: RefCell::new(self.table.borrow().clone()),
        }
    }
}

impl<W, S> fmt::Debug for WeakSet<W, S>
where
    W: WeakElement,
    W::Strong: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Resolve first so member `Debug` impls run without the table borrowed.
        let members: Vec<W::Strong> = self.table.borrow().live().collect();
        f.debug_set().entries(members.iter()).finish()
    }
}

impl<W: WeakKey, S: BuildHasher> Extend<W::Strong> for WeakSet<W, S> {
    fn extend<I: IntoIterator<Item = W::Strong>>(&mut self, iter: I) {
        for item in iter {
            self.insert(&item);
        }
    }
}

impl<W: WeakKey, S: BuildHasher + Default> FromIterator<W::Strong> for WeakSet<W, S> {
    fn from_iter<I: IntoIterator<Item = W::Strong>>(iter: I) -> Self {
        let mut set = Self::with_hasher(S::default());
        set.extend(iter);
        set
    }
}

impl<'a, W: WeakElement, S> IntoIterator for &'a WeakSet<W, S> {
    type Item = W::Strong;
    type IntoIter = Iter<'a, W, S>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over live members, see [`WeakSet::iter`].
pub struct Iter<'a, W, S = RandomState> {
    set: &'a WeakSet<W, S>,
    cursor: Cursor,
}

impl<'a, W: WeakElement, S> Iterator for Iter<'a, W, S> {
    type Item = W::Strong;

    fn next(&mut self) -> Option<Self::Item> {
        self.set.table.borrow_mut().next_live(&mut self.cursor)
    }
}

impl<'a, W: WeakElement, S> FusedIterator for Iter<'a, W, S> {}
