//! Growth prediction shared by the hash adapters.
//!
//! A hash table does not publish the exact size at which it will rehash;
//! the adapters keep an approximation, `bucket_count * max_load_factor`,
//! and treat any insertion that would bring the size up to it as a
//! growth candidate. The threshold is recomputed from fresh [`Geometry`]
//! after every operation that can change it, so a prediction never reads
//! a stale value.

use crate::hook::{
    emit, ContainerKind, Detection, GrowthEvent, GrowthHook, GrowthSite, GROWTH_TARGET,
};

/// Snapshot of a hash table's sizing state.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Geometry {
    pub len: usize,
    pub bucket_count: usize,
    pub max_load_factor: f32,
}

impl Geometry {
    /// Number of elements the buckets hold before the table must grow:
    /// `floor(bucket_count * max_load_factor)`.
    #[inline]
    pub fn capacity(&self) -> usize {
        scaled_capacity(self.bucket_count, self.max_load_factor)
    }
}

#[inline]
pub(crate) fn scaled_capacity(buckets: usize, max_load_factor: f32) -> usize {
    // `as` saturates on overflow.
    (buckets as f64 * max_load_factor as f64).floor() as usize
}

/// Adapter-owned approximation of the size at which the next insert
/// forces the delegate to grow.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct GrowthThreshold(usize);

impl GrowthThreshold {
    #[inline]
    pub(crate) fn from_geometry(g: &Geometry) -> Self {
        GrowthThreshold(g.capacity())
    }

    #[inline]
    pub(crate) fn get(self) -> usize {
        self.0
    }

    /// True when inserting one more element at size `len` may grow the table.
    #[inline]
    pub(crate) fn predicts_growth(self, len: usize) -> bool {
        len.saturating_add(1) >= self.0
    }

    #[cfg(test)]
    pub(crate) fn forced(value: usize) -> Self {
        GrowthThreshold(value)
    }
}

/// Finish a predicted growth-path traversal of a hash adapter.
///
/// `geometry` is the table's state after the call. The threshold is
/// recomputed when the call added an element or moved the buckets; a
/// duplicate leaves it alone.
pub(crate) fn settle(
    threshold: &mut GrowthThreshold,
    hook: Option<GrowthHook>,
    container: ContainerKind,
    site: GrowthSite,
    len_before: usize,
    buckets_before: usize,
    geometry: &Geometry,
) {
    if geometry.len != len_before || geometry.bucket_count != buckets_before {
        *threshold = GrowthThreshold::from_geometry(geometry);
    }
    emit(
        hook,
        GrowthEvent {
            container,
            site,
            detection: Detection::Predicted,
            len_before,
            capacity_before: buckets_before,
            capacity_after: geometry.bucket_count,
        },
    );
}

/// Growth paths are entered with the size observed by the caller's
/// predicate. A mismatch means the container changed between the check and
/// the call, which the single-threaded model rules out; continuing would
/// act on a prediction about a different container state.
#[inline]
#[track_caller]
pub(crate) fn verify_snapshot(observed: usize, actual: usize) {
    if observed != actual {
        tracing::error!(
            target: GROWTH_TARGET,
            observed,
            actual,
            "size snapshot diverged on growth path"
        );
        panic!(
            "growth path entered with stale size snapshot: observed {observed}, container holds {actual}"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geometry(len: usize, bucket_count: usize, max_load_factor: f32) -> Geometry {
        Geometry {
            len,
            bucket_count,
            max_load_factor,
        }
    }

    #[test]
    fn capacity_floors_fractional_products() {
        assert_eq!(geometry(0, 16, 0.75).capacity(), 12);
        assert_eq!(geometry(0, 3, 0.5).capacity(), 1);
        assert_eq!(geometry(0, 1, 0.5).capacity(), 0);
        assert_eq!(geometry(0, 8, 2.0).capacity(), 16);
    }

    #[test]
    fn capacity_saturates() {
        assert_eq!(scaled_capacity(usize::MAX, 16.0), usize::MAX);
    }

    /// Invariant: the predicate fires once `len + 1` reaches the threshold.
    #[test]
    fn predicate_boundary() {
        let t = GrowthThreshold::from_geometry(&geometry(0, 8, 1.0));
        assert_eq!(t.get(), 8);
        assert!(!t.predicts_growth(6));
        assert!(t.predicts_growth(7));
        assert!(t.predicts_growth(8));
    }

    #[test]
    fn zero_threshold_always_predicts() {
        let t = GrowthThreshold::from_geometry(&geometry(0, 1, 0.5));
        assert!(t.predicts_growth(0));
        assert!(GrowthThreshold::forced(0).predicts_growth(usize::MAX));
    }

    thread_local! {
        static SEEN: std::cell::RefCell<Vec<GrowthEvent>> =
            const { std::cell::RefCell::new(Vec::new()) };
    }

    fn record(e: &GrowthEvent) {
        SEEN.with(|s| s.borrow_mut().push(*e));
    }

    /// Invariant: an added element refreshes the threshold even when the
    /// buckets did not move; a duplicate does not.
    #[test]
    fn settle_refreshes_only_on_change() {
        let after = geometry(4, 8, 1.0);

        let mut t = GrowthThreshold::forced(0);
        settle(&mut t, None, ContainerKind::Set, GrowthSite::Insert, 3, 8, &after);
        assert_eq!(t.get(), 8);

        let mut t = GrowthThreshold::forced(0);
        settle(&mut t, None, ContainerKind::Map, GrowthSite::Insert, 4, 8, &after);
        assert_eq!(t.get(), 0);

        let mut t = GrowthThreshold::forced(0);
        let grown = geometry(4, 16, 1.0);
        settle(&mut t, None, ContainerKind::Map, GrowthSite::Emplace, 4, 8, &grown);
        assert_eq!(t.get(), 16);
    }

    #[test]
    fn settle_reports_container_and_buckets() {
        let mut t = GrowthThreshold::forced(0);
        settle(
            &mut t,
            Some(record),
            ContainerKind::Set,
            GrowthSite::Emplace,
            8,
            8,
            &geometry(9, 16, 1.0),
        );
        SEEN.with(|s| {
            let seen = s.borrow();
            assert_eq!(seen.len(), 1);
            assert_eq!(seen[0].container, ContainerKind::Set);
            assert_eq!(seen[0].site, GrowthSite::Emplace);
            assert_eq!(seen[0].detection, Detection::Predicted);
            assert_eq!((seen[0].capacity_before, seen[0].capacity_after), (8, 16));
        });
    }

    #[test]
    fn matching_snapshot_passes() {
        verify_snapshot(3, 3);
    }

    #[test]
    #[should_panic(expected = "stale size snapshot")]
    fn diverged_snapshot_panics() {
        verify_snapshot(3, 4);
    }
}
