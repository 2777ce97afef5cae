//! growth-containers: `Vec`, hash map and hash set adapters that route
//! every reallocating insertion through a dedicated, hookable growth path.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: give debuggers, profilers and fuzzers a stable place to observe
//!   container reallocation without re-implementing the growth policy or
//!   slowing the common insert path.
//! - Layers:
//!   - BucketTable<T>: hashbrown `HashTable` with a logical bucket count
//!     and a configurable max load factor; physical storage is kept at
//!     twice the logical capacity, so tombstones are rehashed in place and
//!     an insertion reallocates only when the bucket count changes.
//!   - BucketMap<K, V, S> / BucketSet<T, S>: the delegate containers.
//!     Unique keys; insert-style calls keep an existing entry and report
//!     whether anything was added.
//!   - GrowthVec<T>, GrowthMap<K, V, S>, GrowthSet<T, S>: the adapters.
//!     Each owns its delegate and forwards everything; only insertion is
//!     intercepted.
//!
//! Prediction
//! - GrowthVec: exact. `Vec` publishes its capacity, so a push reallocates
//!   iff `len == capacity`.
//! - GrowthMap / GrowthSet: approximate. The adapter caches
//!   `floor(bucket_count * max_load_factor)` and takes the growth path when
//!   `len + 1 >= threshold`. This fires on every insert that rehashes, and
//!   occasionally on one that does not.
//! - GrowthMap index access (`get_or_insert_default`) is also checked
//!   after the fact: if `bucket_count` moved during a fast-path call, the
//!   threshold is refreshed and a reactive event is emitted.
//!
//! Threshold maintenance
//! - Computed at construction from the delegate's geometry.
//! - Recomputed after reserve/try_reserve/rehash/set_max_load_factor and
//!   after any growth-path call that added an entry or moved buckets.
//! - Buckets never shrink; removal and clear keep the threshold.
//!
//! Growth paths
//! - `grow_and_*` methods are `#[cold]` and `#[inline(never)]`, so they
//!   remain addressable symbols regardless of inlining elsewhere.
//! - Each traversal emits a TRACE event on `growth_containers::growth` and
//!   calls the per-instance `GrowthHook`, if set.
//! - Each growth path re-reads the size it was entered with; a mismatch
//!   panics. It means the container changed between prediction and call.
//!
//! Constraints
//! - Single-threaded per instance; `&mut self` on every mutation is the
//!   only synchronization.
//! - No shared scratch state: results are returned by value.
//! - Allocation failure inside insertion behaves like the delegate's
//!   (panic/abort); `try_reserve` is the fallible entry point.
//!
//! Notes and non-goals
//! - Hashing and collision resolution are hashbrown's.
//! - No custom allocators, no shrink operations, no attempt to prevent
//!   reallocation.

pub mod bucket_map;
pub mod bucket_set;
mod bucket_table;
mod bucket_table_proptest;
pub mod config;
pub mod error;
pub mod growth_map;
pub mod growth_set;
pub mod growth_vec;
pub mod hook;
mod threshold;

// Public surface
pub use bucket_map::BucketMap;
pub use bucket_set::BucketSet;
pub use config::HashConfig;
pub use error::GrowthError;
pub use growth_map::GrowthMap;
pub use growth_set::GrowthSet;
pub use growth_vec::GrowthVec;
pub use hook::{
    ContainerKind, Detection, GrowthEvent, GrowthHook, GrowthSite, GROWTH_TARGET, MAP_TARGET,
    SET_TARGET, VEC_TARGET,
};
pub use threshold::Geometry;
