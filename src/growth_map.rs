//! GrowthMap: [`BucketMap`] adapter with a dedicated rehash path.
//!
//! `insert` and `emplace` predict growth before the call with
//! `len + 1 >= bucket_count * max_load_factor` and take the
//! `grow_and_*` path when it fires. Index-style access
//! (`get_or_insert_default`) additionally compares `bucket_count` before
//! and after a fast-path call and refreshes the threshold if the table
//! grew anyway. Both kinds of detection keep [`GrowthThreshold`] current
//! before the next prediction reads it.

use crate::bucket_map::{BucketMap, Iter, IterMut};
use crate::bucket_table::Placed;
use crate::config::HashConfig;
use crate::error::GrowthError;
use crate::hook::{
    emit, ContainerKind, Detection, GrowthEvent, GrowthHook, GrowthSite, MAP_TARGET,
};
use crate::threshold::{settle, verify_snapshot, Geometry, GrowthThreshold};
use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use std::collections::hash_map::RandomState;

pub struct GrowthMap<K, V, S = RandomState> {
    inner: BucketMap<K, V, S>,
    threshold: GrowthThreshold,
    hook: Option<GrowthHook>,
}

impl<K, V> GrowthMap<K, V>
where
    K: Eq + Hash,
{
    pub fn new() -> Self {
        Self::from_inner(BucketMap::new())
    }

    pub fn with_config(config: HashConfig) -> Result<Self, GrowthError> {
        BucketMap::with_config(config).map(Self::from_inner)
    }
}

impl<K, V> Default for GrowthMap<K, V>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

/// The fast path of an index access found the buckets changed.
#[cold]
#[inline(never)]
fn observe_reactive_growth(
    threshold: &mut GrowthThreshold,
    hook: Option<GrowthHook>,
    len_before: usize,
    buckets_before: usize,
    geometry: &Geometry,
) {
    *threshold = GrowthThreshold::from_geometry(geometry);
    emit(
        hook,
        GrowthEvent {
            container: ContainerKind::Map,
            site: GrowthSite::IndexAccess,
            detection: Detection::Reactive,
            len_before,
            capacity_before: buckets_before,
            capacity_after: geometry.bucket_count,
        },
    );
}

impl<K, V, S> GrowthMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    pub fn with_hasher(hasher: S) -> Self {
        Self::from_inner(BucketMap::with_hasher(hasher))
    }

    pub fn with_config_and_hasher(config: HashConfig, hasher: S) -> Result<Self, GrowthError> {
        BucketMap::with_config_and_hasher(config, hasher).map(Self::from_inner)
    }

    /// Adopt an existing map; the threshold is computed from its geometry.
    pub fn from_inner(inner: BucketMap<K, V, S>) -> Self {
        let threshold = GrowthThreshold::from_geometry(&inner.geometry());
        Self {
            inner,
            threshold,
            hook: None,
        }
    }

    /// Install a callback run on every growth-path traversal.
    pub fn set_growth_hook(&mut self, hook: GrowthHook) {
        self.hook = Some(hook);
    }

    pub fn clear_growth_hook(&mut self) {
        self.hook = None;
    }

    /// Size at which the next insert is predicted to rehash.
    pub fn growth_threshold(&self) -> usize {
        self.threshold.get()
    }

    /// Insert unless `key` is present. Returns the stored value and
    /// whether an entry was added.
    #[inline]
    pub fn insert(&mut self, key: K, value: V) -> (&mut V, bool) {
        let len = self.inner.len();
        if !self.threshold.predicts_growth(len) {
            return self.inner.insert(key, value);
        }
        self.grow_and_insert(len, key, value)
    }

    /// Insert a value built by `make` unless `key` is present.
    #[inline]
    pub fn emplace<F>(&mut self, key: K, make: F) -> (&mut V, bool)
    where
        F: FnOnce() -> V,
    {
        let len = self.inner.len();
        if !self.threshold.predicts_growth(len) {
            return self.inner.emplace(key, make);
        }
        self.grow_and_emplace(len, key, make)
    }

    /// Index-style access: the value for `key`, default-inserted if absent.
    ///
    /// Placement decisions are internal to the table, so this operation
    /// also checks after the fact whether the fast path rehashed.
    #[inline]
    pub fn get_or_insert_default(&mut self, key: K) -> &mut V
    where
        V: Default,
    {
        let len = self.inner.len();
        if self.threshold.predicts_growth(len) {
            return self.grow_and_index(len, key);
        }
        let buckets_before = self.inner.bucket_count();
        let Placed { item, geometry, .. } = self.inner.place_default(key);
        if geometry.bucket_count != buckets_before {
            observe_reactive_growth(
                &mut self.threshold,
                self.hook,
                len,
                buckets_before,
                &geometry,
            );
        }
        &mut item.1
    }

    #[cold]
    #[inline(never)]
    fn grow_and_insert(&mut self, observed_len: usize, key: K, value: V) -> (&mut V, bool) {
        verify_snapshot(observed_len, self.inner.len());
        let buckets_before = self.inner.bucket_count();
        let Placed {
            item,
            inserted,
            geometry,
        } = self.inner.place_insert(key, value);
        settle(
            &mut self.threshold,
            self.hook,
            ContainerKind::Map,
            GrowthSite::Insert,
            observed_len,
            buckets_before,
            &geometry,
        );
        (&mut item.1, inserted)
    }

    #[cold]
    #[inline(never)]
    fn grow_and_emplace<F>(&mut self, observed_len: usize, key: K, make: F) -> (&mut V, bool)
    where
        F: FnOnce() -> V,
    {
        verify_snapshot(observed_len, self.inner.len());
        let buckets_before = self.inner.bucket_count();
        let Placed {
            item,
            inserted,
            geometry,
        } = self.inner.place_emplace(key, make);
        settle(
            &mut self.threshold,
            self.hook,
            ContainerKind::Map,
            GrowthSite::Emplace,
            observed_len,
            buckets_before,
            &geometry,
        );
        (&mut item.1, inserted)
    }

    #[cold]
    #[inline(never)]
    fn grow_and_index(&mut self, observed_len: usize, key: K) -> &mut V
    where
        V: Default,
    {
        verify_snapshot(observed_len, self.inner.len());
        let buckets_before = self.inner.bucket_count();
        let Placed { item, geometry, .. } = self.inner.place_default(key);
        settle(
            &mut self.threshold,
            self.hook,
            ContainerKind::Map,
            GrowthSite::IndexAccess,
            observed_len,
            buckets_before,
            &geometry,
        );
        &mut item.1
    }

    fn refresh_threshold(&mut self, op: &'static str) {
        let geometry = self.inner.geometry();
        self.threshold = GrowthThreshold::from_geometry(&geometry);
        tracing::debug!(
            target: MAP_TARGET,
            op,
            bucket_count = geometry.bucket_count,
            max_load_factor = geometry.max_load_factor,
            threshold = self.threshold.get(),
            "threshold refreshed"
        );
    }

    pub fn reserve(&mut self, n: usize) {
        self.inner.reserve(n);
        self.refresh_threshold("reserve");
    }

    pub fn try_reserve(&mut self, n: usize) -> Result<(), GrowthError> {
        let res = self.inner.try_reserve(n);
        self.refresh_threshold("try_reserve");
        res
    }

    pub fn rehash(&mut self, n: usize) {
        self.inner.rehash(n);
        self.refresh_threshold("rehash");
    }

    pub fn set_max_load_factor(&mut self, z: f32) -> Result<(), GrowthError> {
        let res = self.inner.set_max_load_factor(z);
        self.refresh_threshold("set_max_load_factor");
        res
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
    pub fn bucket_count(&self) -> usize {
        self.inner.bucket_count()
    }
    pub fn max_load_factor(&self) -> f32 {
        self.inner.max_load_factor()
    }
    pub fn load_factor(&self) -> f32 {
        self.inner.load_factor()
    }
    pub fn capacity(&self) -> usize {
        self.inner.capacity()
    }
    pub fn hasher(&self) -> &S {
        self.inner.hasher()
    }

    pub fn get<Q>(&self, q: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.inner.get(q)
    }

    pub fn get_key_value<Q>(&self, q: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.inner.get_key_value(q)
    }

    pub fn get_mut<Q>(&mut self, q: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.inner.get_mut(q)
    }

    pub fn contains_key<Q>(&self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.inner.contains_key(q)
    }

    pub fn remove<Q>(&mut self, q: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.inner.remove(q)
    }

    pub fn remove_entry<Q>(&mut self, q: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.inner.remove_entry(q)
    }

    pub fn retain<F>(&mut self, keep: F)
    where
        F: FnMut(&K, &mut V) -> bool,
    {
        self.inner.retain(keep);
    }

    pub fn clear(&mut self) {
        self.inner.clear();
    }

    pub fn iter(&self) -> Iter<'_, K, V> {
        self.inner.iter()
    }

    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        self.inner.iter_mut()
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.inner.keys()
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.inner.values()
    }

    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut V> {
        self.inner.values_mut()
    }

    /// Read-only view of the delegate.
    pub fn as_inner(&self) -> &BucketMap<K, V, S> {
        &self.inner
    }

    pub fn into_inner(self) -> BucketMap<K, V, S> {
        self.inner
    }
}

impl<K, V, S> Clone for GrowthMap<K, V, S>
where
    K: Clone,
    V: Clone,
    S: Clone,
{
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            threshold: self.threshold,
            hook: self.hook,
        }
    }
}

impl<K, V, S> fmt::Debug for GrowthMap<K, V, S>
where
    K: fmt::Debug,
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.inner.fmt(f)
    }
}

impl<K, V, S> Extend<(K, V)> for GrowthMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

impl<K, V, S> FromIterator<(K, V)> for GrowthMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher + Default,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut m = Self::with_hasher(S::default());
        m.extend(iter);
        m
    }
}

impl<K, V, S> IntoIterator for GrowthMap<K, V, S> {
    type Item = (K, V);
    type IntoIter = crate::bucket_map::IntoIter<K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.into_iter()
    }
}

impl<'a, K, V, S> IntoIterator for &'a GrowthMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    thread_local! {
        static EVENTS: RefCell<Vec<GrowthEvent>> = const { RefCell::new(Vec::new()) };
    }

    fn record(e: &GrowthEvent) {
        EVENTS.with(|ev| ev.borrow_mut().push(*e));
    }

    fn take_events() -> Vec<GrowthEvent> {
        EVENTS.with(|ev| std::mem::take(&mut *ev.borrow_mut()))
    }

    fn expected_threshold<K: Eq + Hash, V, S: BuildHasher>(m: &GrowthMap<K, V, S>) -> usize {
        (m.bucket_count() as f64 * m.max_load_factor() as f64).floor() as usize
    }

    /// Invariant: every insert that rehashes goes through the growth path.
    #[test]
    fn every_rehash_is_predicted() {
        let mut m: GrowthMap<u32, u32> = GrowthMap::new();
        m.set_growth_hook(record);
        for i in 0..500 {
            let before = m.bucket_count();
            let predicted = m.growth_threshold() <= m.len() + 1;
            m.insert(i, i);
            if m.bucket_count() != before {
                assert!(predicted, "rehash at len {} was not predicted", i);
            }
            assert_eq!(m.growth_threshold(), expected_threshold(&m));
        }
        let events = take_events();
        assert!(events.iter().any(|e| e.reallocated()));
        assert!(events.iter().all(|e| e.detection == Detection::Predicted));
    }

    /// Invariant: a stale threshold is corrected by the reactive check on
    /// index access, even though the fast path was taken.
    #[test]
    fn reactive_detection_repairs_stale_threshold() {
        let mut m: GrowthMap<u32, u32> = GrowthMap::new();
        m.set_growth_hook(record);
        *m.get_or_insert_default(0) += 1;
        take_events();

        // Pretend the cached threshold is far ahead of the table.
        m.threshold = GrowthThreshold::forced(usize::MAX);
        let buckets = m.bucket_count();
        *m.get_or_insert_default(1) += 1;
        assert_ne!(m.bucket_count(), buckets);
        assert_eq!(m.growth_threshold(), expected_threshold(&m));

        let events = take_events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].detection, Detection::Reactive);
        assert_eq!(events[0].site, GrowthSite::IndexAccess);
        assert!(events[0].reallocated());
    }

    /// Invariant: a stale threshold on insert only delays the refresh to
    /// the next explicit geometry change; the delegate still grows.
    #[test]
    fn insert_with_stale_threshold_still_inserts() {
        let mut m: GrowthMap<u32, u32> = GrowthMap::new();
        m.threshold = GrowthThreshold::forced(usize::MAX);
        for i in 0..10 {
            assert!(m.insert(i, i).1);
        }
        assert_eq!(m.len(), 10);
        m.rehash(0);
        assert_eq!(m.growth_threshold(), expected_threshold(&m));
    }

    #[test]
    #[should_panic(expected = "stale size snapshot")]
    fn stale_snapshot_is_fatal() {
        let mut m: GrowthMap<u32, u32> = GrowthMap::new();
        m.grow_and_insert(5, 1, 1);
    }

    #[test]
    fn duplicate_on_growth_path_keeps_threshold() {
        let mut m: GrowthMap<&'static str, i32> = GrowthMap::new();
        m.insert("a", 1);
        // One bucket at load 1.0: every insert now predicts growth.
        assert!(m.growth_threshold() <= m.len() + 1);
        let t = m.growth_threshold();
        let (v, added) = m.insert("a", 2);
        assert!(!added);
        assert_eq!(*v, 1);
        assert_eq!(m.growth_threshold(), t);
    }

    #[test]
    fn emplace_on_growth_path_is_lazy_for_duplicates() {
        let mut m: GrowthMap<u8, String> = GrowthMap::new();
        m.emplace(1, || "one".to_string());
        let (v, added) = m.emplace(1, || unreachable!("value built for existing key"));
        assert!(!added);
        assert_eq!(v.as_str(), "one");
    }

    #[test]
    fn failed_load_factor_change_keeps_threshold_consistent() {
        let mut m: GrowthMap<u8, u8> = GrowthMap::new();
        m.reserve(10);
        assert!(m.set_max_load_factor(f32::NAN).is_err());
        assert_eq!(m.growth_threshold(), expected_threshold(&m));
        assert_eq!(m.growth_threshold(), 16);
    }
}
