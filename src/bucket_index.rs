//! BucketIndex: structural layer mapping hash keys to ordered slot sequences.
//!
//! Buckets live in a `SlotMap` so that a pass over the index can hold on to
//! bucket keys while buckets are dropped underneath it; a dropped bucket's key
//! never resolves again, even if its storage is reused. `index` maps a hash to
//! the single bucket holding every slot with that hash.
//!
//! Callers supply precomputed hashes. Nothing in this layer runs user code:
//! slots are only resolved, compared by address, and dropped.

use crate::weak::WeakElement;
use hashbrown::HashTable;
use slotmap::SlotMap;
use tracing::{debug, trace};

slotmap::new_key_type! {
    /// Generational key of a bucket.
    pub(crate) struct BucketKey;
}

#[derive(Clone, Debug)]
struct Bucket<W> {
    hash: u64,
    slots: Vec<W>,
}

impl<W: WeakElement> Bucket<W> {
    /// Drop expired slots, keeping the order of the rest. Returns how many went.
    fn prune(&mut self) -> usize {
        let before = self.slots.len();
        self.slots.retain(|w| !w.is_expired());
        let pruned = before - self.slots.len();
        if pruned > 0 {
            trace!(hash = self.hash, pruned, "pruned expired slots");
        }
        pruned
    }

    fn position(&self, strong: &W::Strong) -> Option<usize> {
        self.slots.iter().position(|w| w.is_same(strong))
    }
}

/// Position of an in-progress pass over the index.
///
/// Holds the keys of the buckets that existed when the pass started.
#[derive(Debug)]
pub(crate) struct Cursor {
    keys: Vec<BucketKey>,
    bucket: usize,
    slot: usize,
    // Address of the slot yielded last; `slot` still points at it.
    last: Option<*const ()>,
}

impl Cursor {
    fn advance(&mut self) {
        self.bucket += 1;
        self.slot = 0;
        self.last = None;
    }
}

/// Where a pass resumes in `slots` after yielding the slot at address `last`,
/// which was at index `slot`. Removals in between may have shifted it left or
/// taken it out entirely.
fn resume_after<W: WeakElement>(slots: &[W], slot: usize, last: *const ()) -> usize {
    if slots.get(slot).map_or(false, |w| w.addr() == last) {
        return slot + 1;
    }
    match slots.iter().position(|w| w.addr() == last) {
        Some(i) => i + 1,
        None => slot,
    }
}

#[derive(Clone)]
pub(crate) struct BucketIndex<W> {
    index: HashTable<BucketKey>,
    buckets: SlotMap<BucketKey, Bucket<W>>,
}

impl<W: WeakElement> BucketIndex<W> {
    pub(crate) fn new() -> Self {
        Self::with_capacity(0)
    }

    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            index: HashTable::with_capacity(capacity),
            buckets: SlotMap::with_capacity_and_key(capacity),
        }
    }

    fn find_bucket(&self, hash: u64) -> Option<BucketKey> {
        let buckets = &self.buckets;
        self.index
            .find(hash, |&k| buckets.get(k).map_or(false, |b| b.hash == hash))
            .copied()
    }

    fn unlink(&mut self, key: BucketKey) {
        if let Some(bucket) = self.buckets.remove(key) {
            if let Ok(entry) = self.index.find_entry(bucket.hash, |&k| k == key) {
                entry.remove();
            }
        }
    }

    /// Track `strong` under `hash`. Returns false if it is already tracked.
    pub(crate) fn insert(&mut self, hash: u64, strong: &W::Strong) -> bool {
        let key = self.find_bucket(hash);
        if let Some(bucket) = key.and_then(|k| self.buckets.get_mut(k)) {
            bucket.prune();
            if bucket.position(strong).is_some() {
                return false;
            }
            bucket.slots.push(W::new(strong));
            return true;
        }

        let key = self.buckets.insert(Bucket {
            hash,
            slots: vec![W::new(strong)],
        });
        let buckets = &self.buckets;
        self.index
            .insert_unique(hash, key, |&k| buckets.get(k).map_or(0, |b| b.hash));
        true
    }

    /// Stop tracking `strong`. Returns whether it was tracked.
    pub(crate) fn remove(&mut self, hash: u64, strong: &W::Strong) -> bool {
        let Some(key) = self.find_bucket(hash) else {
            return false;
        };
        let Some(bucket) = self.buckets.get_mut(key) else {
            return false;
        };
        bucket.prune();
        let found = match bucket.position(strong) {
            Some(i) => {
                bucket.slots.remove(i);
                true
            }
            None => false,
        };
        if bucket.slots.is_empty() {
            self.unlink(key);
        }
        found
    }

    pub(crate) fn contains(&mut self, hash: u64, strong: &W::Strong) -> bool {
        let Some(key) = self.find_bucket(hash) else {
            return false;
        };
        let Some(bucket) = self.buckets.get_mut(key) else {
            return false;
        };
        bucket.prune();
        let found = bucket.position(strong).is_some();
        if bucket.slots.is_empty() {
            self.unlink(key);
        }
        found
    }

    /// Full pass: prune every bucket and drop the ones left empty.
    /// Returns the number of slots discarded.
    pub(crate) fn prune_all(&mut self) -> usize {
        let mut pruned = 0;
        let before = self.buckets.len();
        self.buckets.retain(|_, b| {
            pruned += b.prune();
            !b.slots.is_empty()
        });
        let dropped = before - self.buckets.len();
        if dropped > 0 {
            let buckets = &self.buckets;
            self.index.retain(|k| buckets.contains_key(*k));
        }
        if pruned > 0 {
            debug!(pruned, dropped_buckets = dropped, "full pruning pass");
        }
        pruned
    }

    /// Number of live members, after a full pass.
    pub(crate) fn live_len(&mut self) -> usize {
        self.prune_all();
        self.slot_count()
    }

    /// Physically stored slots, expired or not.
    pub(crate) fn slot_count(&self) -> usize {
        self.buckets.values().map(|b| b.slots.len()).sum()
    }

    pub(crate) fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    pub(crate) fn clear(&mut self) {
        self.index.clear();
        self.buckets.clear();
    }

    /// Resolve every slot without pruning.
    pub(crate) fn live(&self) -> impl Iterator<Item = W::Strong> + '_ {
        self.buckets
            .values()
            .flat_map(|b| b.slots.iter().filter_map(W::view))
    }

    pub(crate) fn cursor(&self) -> Cursor {
        Cursor {
            keys: self.buckets.keys().collect(),
            bucket: 0,
            slot: 0,
            last: None,
        }
    }

    /// Advance `cur` to the next resolvable slot, pruning expired slots and
    /// emptied buckets on the way. Buckets dropped since the cursor was made
    /// are skipped. Slots removed between steps do not make the pass skip
    /// the slots that shift into their place.
    pub(crate) fn next_live(&mut self, cur: &mut Cursor) -> Option<W::Strong> {
        while let Some(&key) = cur.keys.get(cur.bucket) {
            let Some(bucket) = self.buckets.get_mut(key) else {
                cur.advance();
                continue;
            };
            if let Some(last) = cur.last.take() {
                cur.slot = resume_after(&bucket.slots, cur.slot, last);
            }
            while cur.slot < bucket.slots.len() {
                match bucket.slots[cur.slot].view() {
                    Some(strong) => {
                        cur.last = Some(bucket.slots[cur.slot].addr());
                        return Some(strong);
                    }
                    None => {
                        bucket.slots.remove(cur.slot);
                        trace!(hash = bucket.hash, "pruned expired slot during pass");
                    }
                }
            }
            if bucket.slots.is_empty() {
                self.unlink(key);
            }
            cur.advance();
        }
        None
    }
}
