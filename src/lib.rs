//! rc-weakset: a single-threaded hash set of weak pointers that tracks
//! shared objects by identity without keeping them alive.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: membership, counting, and iteration over objects owned
//!   elsewhere, converging on "only live objects" without any notification
//!   when an object is dropped.
//! - Layers:
//!   - `weak`: slot types. `WeakElement` resolves and compares a weak
//!     pointer by address; `WeakKey` picks the bucket hash (target value for
//!     `rc::Weak`/`sync::Weak`, target address for `ByAddress`).
//!   - `BucketIndex<W>`: structural multimap from a precomputed `u64` hash to
//!     an ordered `Vec` of slots. Prunes expired slots in every bucket it
//!     scans and drops buckets it leaves empty. Never runs user code.
//!   - `WeakSet<W, S>`: public API. Hashes with `S: BuildHasher`, then
//!     borrows the index through a `RefCell` so reads can prune via `&self`.
//!   - `Registry<E>`: event handlers held in a `PtrWeakSet`; the consumer the
//!     set was built for.
//!
//! Constraints
//! - Single-threaded: `WeakSet` is `!Sync`. `ArcWeakSet` may be sent to
//!   another thread but not shared.
//! - Never holds a strong pointer to a member between calls.
//! - Identity equality: deduplication and removal compare allocation
//!   addresses, never `PartialEq`.
//! - O(1) average lookup; `len` is a full pass and therefore O(slots).
//!
//! Liveness
//! - A slot is resolvable while its target has a strong pointer outside the
//!   set. The set observes expiry lazily: a dropped member is excluded from
//!   every later answer, and its slot is discarded the next time its bucket
//!   is scanned (`insert`/`remove`/`contains` on the same hash, `iter`, `len`,
//!   `remove_expired`).
//! - Every read resolves a slot and uses the result immediately; no proof of
//!   liveness is cached.
//!
//! Hash stability
//! - Value-hashed slots require the member's `Hash` to stay fixed while it is
//!   a member. If it changes, lookups search the wrong bucket and miss the
//!   member until it is dropped; `len` and `iter` still see it. This is not
//!   corrected. `ByAddress` slots hash by address and are immune.
//!
//! Reentrancy
//! - `Hash` is the only user code the set calls, and it runs before the index
//!   is borrowed. Iteration releases the borrow between steps. A member's
//!   `Hash` and a loop body over `iter()` may therefore call back into the
//!   same set.
//!
//! Notes and non-goals
//! - No ordering guarantee among members.
//! - No persistence, no thread-safe variant.
//! - Members added while an `iter()` is in progress may or may not be
//!   visited by that pass.

mod bucket_index;
mod bucket_index_proptest;
mod error;
pub mod registry;
pub mod weak;
mod weak_set;

// Public surface
pub use error::WeakSetError;
pub use registry::{Handler, Registry};
pub use weak::{ByAddress, WeakElement, WeakKey};
pub use weak_set::{ArcWeakSet, Iter, PtrWeakSet, RcWeakSet, WeakSet};
