//! BucketSet: unique-element hash set with observable bucket geometry.
//!
//! The delegate the set adapter wraps. Elements are immutable once stored.

use crate::bucket_table::{self, BucketTable, Placed};
use crate::config::HashConfig;
use crate::error::GrowthError;
use crate::threshold::Geometry;
use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use std::collections::hash_map::RandomState;

#[derive(Clone)]
pub struct BucketSet<T, S = RandomState> {
    hasher: S,
    table: BucketTable<T>,
}

impl<T> BucketSet<T>
where
    T: Eq + Hash,
{
    pub fn new() -> Self {
        Self::with_hasher(Default::default())
    }

    pub fn with_config(config: HashConfig) -> Result<Self, GrowthError> {
        Self::with_config_and_hasher(config, Default::default())
    }
}

impl<T> Default for BucketSet<T>
where
    T: Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T, S> BucketSet<T, S>
where
    T: Eq + Hash,
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
    pub fn capacity(&self) -> usize {
        self.table.capacity()
    }
    pub fn geometry(&self) -> Geometry {
        self.table.geometry()
    }
    pub fn hasher(&self) -> &S {
        &self.hasher
    }

    /// Add `value` unless an equal element is present. Returns the stored
    /// element and whether `value` was added.
    pub fn insert(&mut self, value: T) -> (&T, bool) {
        let Placed { item, inserted, .. } = self.place_insert(value);
        (&*item, inserted)
    }

    /// Find the element equal to `probe`, building it from `probe` only when
    /// absent.
    pub fn emplace<Q, F>(&mut self, probe: &Q, make: F) -> (&T, bool)
    where
        T: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
        F: FnOnce(&Q) -> T,
    {
        let Placed { item, inserted, .. } = self.place_emplace(probe, make);
        (&*item, inserted)
    }

    pub(crate) fn place_insert(&mut self, value: T) -> Placed<'_, T> {
        let hash = self.make_hash(&value);
        self.table.place(hash, value, |v, e| e == v, |v| v)
    }

    pub(crate) fn place_emplace<Q, F>(&mut self, probe: &Q, make: F) -> Placed<'_, T>
    where
        T: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
        F: FnOnce(&Q) -> T,
    {
        let hash = self.make_hash(probe);
        self.table
            .place(hash, probe, |q, e| e.borrow() == *q, |q| make(q))
    }

    pub fn get<Q>(&self, q: &Q) -> Option<&T>
    where
        T: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let hash = self.make_hash(q);
        self.table.find(hash, |e| e.borrow() == q)
    }

    pub fn contains<Q>(&self, q: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.get(q).is_some()
    }

    pub fn remove<Q>(&mut self, q: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.take(q).is_some()
    }

    /// Remove and return the element equal to `q`. Buckets are kept.
    pub fn take<Q>(&mut self, q: &Q) -> Option<T>
    where
        T: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let hash = self.make_hash(q);
        self.table.remove(hash, |e| e.borrow() == q)
    }

    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(&T) -> bool,
    {
        self.table.retain(|e| keep(e));
    }

    pub fn clear(&mut self) {
        self.table.clear();
    }

    pub fn rehash(&mut self, n: usize) {
        self.table.rehash(n);
    }

    pub fn reserve(&mut self, n: usize) {
        self.table.reserve(n);
    }

    pub fn try_reserve(&mut self, n: usize) -> Result<(), GrowthError> {
        self.table.try_reserve(n)
    }

    pub fn set_max_load_factor(&mut self, z: f32) -> Result<(), GrowthError> {
        self.table.set_max_load_factor(z)
    }

    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            it: self.table.iter(),
        }
    }
}

impl<T, S> fmt::Debug for BucketSet<T, S>
where
    T: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.table.iter()).finish()
    }
}

impl<T, S> Extend<T> for BucketSet<T, S>
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

impl<T, S> FromIterator<T> for BucketSet<T, S>
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

impl<T, S> IntoIterator for BucketSet<T, S> {
    type Item = T;
    type IntoIter = IntoIter<T>;

    fn into_iter(self) -> IntoIter<T> {
        IntoIter {
            it: self.table.into_iter(),
        }
    }
}

impl<'a, T, S> IntoIterator for &'a BucketSet<T, S>
where
    T: Eq + Hash,
    S: BuildHasher,
{
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Iter<'a, T> {
        self.iter()
    }
}

pub struct Iter<'a, T> {
    it: bucket_table::Iter<'a, T>,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;
    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.it.next()
    }
    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.it.size_hint()
    }
}

pub struct IntoIter<T> {
    it: bucket_table::IntoIter<T>,
}

impl<T> Iterator for IntoIter<T> {
    type Item = T;
    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.it.next()
    }
    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.it.size_hint()
    }
}
