//! BucketMap: unique-key hash map with observable bucket geometry.
//!
//! This is the delegate the map adapter wraps. Insert-style operations
//! keep the existing entry when the key is already present and report
//! whether an entry was added.

use crate::bucket_table::{self, BucketTable, Placed};
use crate::config::HashConfig;
use crate::error::GrowthError;
use crate::threshold::Geometry;
use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use std::collections::hash_map::RandomState;

#[derive(Clone)]
pub struct BucketMap<K, V, S = RandomState> {
    hasher: S,
    table: BucketTable<(K, V)>,
}

impl<K, V> BucketMap<K, V>
where
    K: Eq + Hash,
{
    pub fn new() -> Self {
        Self::with_hasher(Default::default())
    }

    pub fn with_config(config: HashConfig) -> Result<Self, GrowthError> {
        Self::with_config_and_hasher(config, Default::default())
    }
}

impl<K, V> Default for BucketMap<K, V>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, S> BucketMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    pub fn with_hasher(hasher: S) -> Self {
        Self {
            hasher,
            table: BucketTable::with_config(&HashConfig::default())
                .expect("default hash configuration is valid"),
        }
    }

    pub fn with_config_and_hasher(config: HashConfig, hasher: S) -> Result<Self, GrowthError> {
        Ok(Self {
            hasher,
            table: BucketTable::with_config(&config)?,
        })
    }

    fn make_hash<Q>(&self, q: &Q) -> u64
    where
        Q: ?Sized + Hash,
    {
        self.hasher.hash_one(q)
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }
    pub fn is_empty(&self) -> bool {
        self.table.len() == 0
    }
    pub fn bucket_count(&self) -> usize {
        self.table.bucket_count()
    }
    pub fn max_load_factor(&self) -> f32 {
        self.table.max_load_factor()
    }
    pub fn load_factor(&self) -> f32 {
        self.table.load_factor()
    }
    /// Entries the current buckets hold before the next rehash.
    pub fn capacity(&self) -> usize {
        self.table.capacity()
    }
    pub fn geometry(&self) -> Geometry {
        self.table.geometry()
    }
    pub fn hasher(&self) -> &S {
        &self.hasher
    }

    /// Insert `value` under `key` unless `key` is already present, in which
    /// case the stored value is kept and `value` is dropped.
    ///
    /// Returns the stored value and whether an entry was added.
    pub fn insert(&mut self, key: K, value: V) -> (&mut V, bool) {
        let Placed { item, inserted, .. } = self.place_insert(key, value);
        (&mut item.1, inserted)
    }

    /// Like [`insert`](Self::insert) but only builds the value when the
    /// key is absent.
    pub fn emplace<F>(&mut self, key: K, make: F) -> (&mut V, bool)
    where
        F: FnOnce() -> V,
    {
        let Placed { item, inserted, .. } = self.place_emplace(key, make);
        (&mut item.1, inserted)
    }

    /// Index-style access: the value for `key`, default-inserted if absent.
    pub fn get_or_insert_default(&mut self, key: K) -> &mut V
    where
        V: Default,
    {
        let Placed { item, .. } = self.place_default(key);
        &mut item.1
    }

    pub(crate) fn place_insert(&mut self, key: K, value: V) -> Placed<'_, (K, V)> {
        let hash = self.make_hash(&key);
        self.table
            .place(hash, (key, value), |(k, _), (sk, _)| sk == k, |entry| entry)
    }

    pub(crate) fn place_emplace<F>(&mut self, key: K, make: F) -> Placed<'_, (K, V)>
    where
        F: FnOnce() -> V,
    {
        let hash = self.make_hash(&key);
        self.table
            .place(hash, (key, make), |(k, _), (sk, _)| sk == k, |(k, make)| {
                (k, make())
            })
    }

    pub(crate) fn place_default(&mut self, key: K) -> Placed<'_, (K, V)>
    where
        V: Default,
    {
        let hash = self.make_hash(&key);
        self.table
            .place(hash, key, |k, (sk, _)| sk == k, |k| (k, V::default()))
    }

    pub fn get<Q>(&self, q: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.get_key_value(q).map(|(_, v)| v)
    }

    pub fn get_key_value<Q>(&self, q: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let hash = self.make_hash(q);
        self.table
            .find(hash, |(k, _)| k.borrow() == q)
            .map(|(k, v)| (k, v))
    }

    pub fn get_mut<Q>(&mut self, q: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let hash = self.make_hash(q);
        self.table
            .find_mut(hash, |(k, _)| k.borrow() == q)
            .map(|(_, v)| v)
    }

    pub fn contains_key<Q>(&self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.get_key_value(q).is_some()
    }

    pub fn remove<Q>(&mut self, q: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.remove_entry(q).map(|(_, v)| v)
    }

    /// Removing never shrinks the buckets.
    pub fn remove_entry<Q>(&mut self, q: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let hash = self.make_hash(q);
        self.table.remove(hash, |(k, _)| k.borrow() == q)
    }

    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(&K, &mut V) -> bool,
    {
        self.table.retain(|(k, v)| keep(k, v));
    }

    pub fn clear(&mut self) {
        self.table.clear();
    }

    /// Buckets become at least `n` (power of two) and at least enough for
    /// the current entries.
    pub fn rehash(&mut self, n: usize) {
        self.table.rehash(n);
    }

    /// Make room for `n` entries without another rehash.
    pub fn reserve(&mut self, n: usize) {
        self.table.reserve(n);
    }

    pub fn try_reserve(&mut self, n: usize) -> Result<(), GrowthError> {
        self.table.try_reserve(n)
    }

    /// Change the max load factor; rehashes when the current entries no
    /// longer fit.
    pub fn set_max_load_factor(&mut self, z: f32) -> Result<(), GrowthError> {
        self.table.set_max_load_factor(z)
    }

    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            it: self.table.iter(),
        }
    }

    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        IterMut {
            it: self.table.iter_mut(),
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.iter().map(|(k, _)| k)
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.iter().map(|(_, v)| v)
    }

    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut V> {
        self.iter_mut().map(|(_, v)| v)
    }
}

impl<K, V, S> fmt::Debug for BucketMap<K, V, S>
where
    K: fmt::Debug,
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.table.iter().map(|(k, v)| (k, v)))
            .finish()
    }
}

impl<K, V, S> Extend<(K, V)> for BucketMap<K, V, S>
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

impl<K, V, S> FromIterator<(K, V)> for BucketMap<K, V, S>
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

impl<K, V, S> IntoIterator for BucketMap<K, V, S> {
    type Item = (K, V);
    type IntoIter = IntoIter<K, V>;

    fn into_iter(self) -> IntoIter<K, V> {
        IntoIter {
            it: self.table.into_iter(),
        }
    }
}

impl<'a, K, V, S> IntoIterator for &'a BucketMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Iter<'a, K, V> {
        self.iter()
    }
}

/// Iterator over immutable entries.
pub struct Iter<'a, K, V> {
    it: bucket_table::Iter<'a, (K, V)>,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);
    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.it.next().map(|(k, v)| (k, v))
    }
    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.it.size_hint()
    }
}

/// Iterator over entries with mutable values.
pub struct IterMut<'a, K, V> {
    it: bucket_table::IterMut<'a, (K, V)>,
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);
    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.it.next().map(|(k, v)| (&*k, v))
    }
    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.it.size_hint()
    }
}

/// Owning iterator.
pub struct IntoIter<K, V> {
    it: bucket_table::IntoIter<(K, V)>,
}

impl<K, V> Iterator for IntoIter<K, V> {
    type Item = (K, V);
    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.it.next()
    }
    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.it.size_hint()
    }
}
