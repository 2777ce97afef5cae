//! GrowthSet: [`BucketSet`] adapter with a dedicated rehash path.
//!
//! Same prediction and threshold protocol as the map adapter, without
//! index access. The growth path re-checks that the size it was entered
//! with is still the container's size.

use crate::bucket_set::{BucketSet, Iter};
use crate::bucket_table::Placed;
use crate::config::HashConfig;
use crate::error::GrowthError;
use crate::hook::{ContainerKind, GrowthHook, GrowthSite, SET_TARGET};
use crate::threshold::{settle, verify_snapshot, GrowthThreshold};
use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use std::collections::hash_map::RandomState;

pub struct GrowthSet<T, S = RandomState> {
    inner: BucketSet<T, S>,
    threshold: GrowthThreshold,
    hook: Option<GrowthHook>,
}

impl<T> GrowthSet<T>
where
    T: Eq + Hash,
{
    pub fn new() -> Self {
        Self::from_inner(BucketSet::new())
    }

    pub fn with_config(config: HashConfig) -> Result<Self, GrowthError> {
        BucketSet::with_config(config).map(Self::from_inner)
    }
}

impl<T> Default for GrowthSet<T>
where
    T: Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T, S> GrowthSet<T, S>
where
    T: Eq + Hash,
    S: BuildHasher,
{
    pub fn with_hasher(hasher: S) -> Self {
        Self::from_inner(BucketSet::with_hasher(hasher))
    }

    pub fn with_config_and_hasher(config: HashConfig, hasher: S) -> Result<Self, GrowthError> {
        BucketSet::with_config_and_hasher(config, hasher).map(Self::from_inner)
    }

    pub fn from_inner(inner: BucketSet<T, S>) -> Self {
        let threshold = GrowthThreshold::from_geometry(&inner.geometry());
        Self {
            inner,
            threshold,
            hook: None,
        }
    }

    pub fn set_growth_hook(&mut self, hook: GrowthHook) {
        self.hook = Some(hook);
    }

    pub fn clear_growth_hook(&mut self) {
        self.hook = None;
    }

    pub fn growth_threshold(&self) -> usize {
        self.threshold.get()
    }

    /// Add `value` unless an equal element is present.
    #[inline]
    pub fn insert(&mut self, value: T) -> (&T, bool) {
        let len = self.inner.len();
        if !self.threshold.predicts_growth(len) {
            return self.inner.insert(value);
        }
        self.grow_and_insert(len, value)
    }

    /// Find the element equal to `probe`, building it with `make` only
    /// when absent.
    #[inline]
    pub fn emplace<Q, F>(&mut self, probe: &Q, make: F) -> (&T, bool)
    where
        T: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
        F: FnOnce(&Q) -> T,
    {
        let len = self.inner.len();
        if !self.threshold.predicts_growth(len) {
            return self.inner.emplace(probe, make);
        }
        self.grow_and_emplace(len, probe, make)
    }

    #[cold]
    #[inline(never)]
    fn grow_and_insert(&mut self, observed_len: usize, value: T) -> (&T, bool) {
        verify_snapshot(observed_len, self.inner.len());
        let buckets_before = self.inner.bucket_count();
        let Placed {
            item,
            inserted,
            geometry,
        } = self.inner.place_insert(value);
        settle(
            &mut self.threshold,
            self.hook,
            ContainerKind::Set,
            GrowthSite::Insert,
            observed_len,
            buckets_before,
            &geometry,
        );
        (&*item, inserted)
    }

    #[cold]
    #[inline(never)]
    fn grow_and_emplace<Q, F>(&mut self, observed_len: usize, probe: &Q, make: F) -> (&T, bool)
    where
        T: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
        F: FnOnce(&Q) -> T,
    {
        verify_snapshot(observed_len, self.inner.len());
        let buckets_before = self.inner.bucket_count();
        let Placed {
            item,
            inserted,
            geometry,
        } = self.inner.place_emplace(probe, make);
        settle(
            &mut self.threshold,
            self.hook,
            ContainerKind::Set,
            GrowthSite::Emplace,
            observed_len,
            buckets_before,
            &geometry,
        );
        (&*item, inserted)
    }

    fn refresh_threshold(&mut self, op: &'static str) {
        let geometry = self.inner.geometry();
        self.threshold = GrowthThreshold::from_geometry(&geometry);
        tracing::debug!(
            target: SET_TARGET,
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

    pub fn get<Q>(&self, q: &Q) -> Option<&T>
    where
        T: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.inner.get(q)
    }

    pub fn contains<Q>(&self, q: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.inner.contains(q)
    }

    pub fn remove<Q>(&mut self, q: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.inner.remove(q)
    }

    pub fn take<Q>(&mut self, q: &Q) -> Option<T>
    where
        T: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.inner.take(q)
    }

    pub fn retain<F>(&mut self, keep: F)
    where
        F: FnMut(&T) -> bool,
    {
        self.inner.retain(keep);
    }

    pub fn clear(&mut self) {
        self.inner.clear();
    }

    pub fn iter(&self) -> Iter<'_, T> {
        self.inner.iter()
    }

    pub fn as_inner(&self) -> &BucketSet<T, S> {
        &self.inner
    }

    pub fn into_inner(self) -> BucketSet<T, S> {
        self.inner
    }
}

impl<T, S> Clone for GrowthSet<T, S>
where
    T: Clone,
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

impl<T, S> fmt::Debug for GrowthSet<T, S>
where
    T: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.inner.fmt(f)
    }
}

impl<T, S> Extend<T> for GrowthSet<T, S>
where
    T: Eq + Hash,
    S: BuildHasher,
{
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for v in iter {
            self.insert(v);
        }
    }
}

impl<T, S> FromIterator<T> for GrowthSet<T, S>
where
    T: Eq + Hash,
    S: BuildHasher + Default,
{
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut s = Self::with_hasher(S::default());
        s.extend(iter);
        s
    }
}

impl<T, S> IntoIterator for GrowthSet<T, S> {
    type Item = T;
    type IntoIter = crate::bucket_set::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.into_iter()
    }
}

impl<'a, T, S> IntoIterator for &'a GrowthSet<T, S>
where
    T: Eq + Hash,
    S: BuildHasher,
{
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.iter()
    }
}
