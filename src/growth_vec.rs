//! GrowthVec: `Vec<T>` whose reallocating insertions run through dedicated
//! growth paths.
//!
//! `Vec` publishes its capacity, so the prediction is exact: an insertion
//! reallocates iff `len == capacity` (or `len + n > capacity` for a slice).
//! The common case forwards straight to `Vec`; the reallocating case calls
//! one of the `grow_and_*` methods, which are never inlined and emit a
//! [`GrowthEvent`].

use crate::error::GrowthError;
use crate::hook::{
    emit, ContainerKind, Detection, GrowthEvent, GrowthHook, GrowthSite, VEC_TARGET,
};
use crate::threshold::verify_snapshot;
use core::fmt;
use core::ops::{Deref, DerefMut};

pub struct GrowthVec<T> {
    inner: Vec<T>,
    hook: Option<GrowthHook>,
}

impl<T> GrowthVec<T> {
    pub const fn new() -> Self {
        Self {
            inner: Vec::new(),
            hook: None,
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Vec::with_capacity(capacity),
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

    #[inline]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.inner.capacity()
    }

    #[inline]
    pub fn push(&mut self, value: T) {
        let len = self.inner.len();
        if len != self.inner.capacity() {
            self.inner.push(value);
            return;
        }
        self.grow_and_push(len, value);
    }

    /// Push `value` and return a reference to it in place.
    #[inline]
    pub fn emplace(&mut self, value: T) -> &mut T {
        let len = self.inner.len();
        if len != self.inner.capacity() {
            self.inner.push(value);
            return &mut self.inner[len];
        }
        self.grow_and_emplace(len, value)
    }

    /// Insert `value` at `index`, shifting later elements right.
    ///
    /// # Panics
    /// If `index > len`.
    #[inline]
    pub fn insert(&mut self, index: usize, value: T) {
        let len = self.inner.len();
        if len != self.inner.capacity() {
            self.inner.insert(index, value);
            return;
        }
        self.grow_and_insert(len, index, value);
    }

    pub fn extend_from_slice(&mut self, other: &[T])
    where
        T: Clone,
    {
        let len = self.inner.len();
        if len.saturating_add(other.len()) <= self.inner.capacity() {
            self.inner.extend_from_slice(other);
            return;
        }
        self.grow_and_extend(len, other);
    }

    pub fn reserve(&mut self, additional: usize) {
        self.inner.reserve(additional);
        tracing::debug!(
            target: VEC_TARGET,
            additional,
            capacity = self.inner.capacity(),
            "reserve"
        );
    }

    pub fn reserve_exact(&mut self, additional: usize) {
        self.inner.reserve_exact(additional);
        tracing::debug!(
            target: VEC_TARGET,
            additional,
            capacity = self.inner.capacity(),
            "reserve_exact"
        );
    }

    pub fn try_reserve(&mut self, additional: usize) -> Result<(), GrowthError> {
        self.inner.try_reserve(additional)?;
        Ok(())
    }

    pub fn pop(&mut self) -> Option<T> {
        self.inner.pop()
    }

    pub fn truncate(&mut self, len: usize) {
        self.inner.truncate(len);
    }

    pub fn clear(&mut self) {
        self.inner.clear();
    }

    pub fn remove(&mut self, index: usize) -> T {
        self.inner.remove(index)
    }

    pub fn swap_remove(&mut self, index: usize) -> T {
        self.inner.swap_remove(index)
    }

    pub fn retain<F>(&mut self, keep: F)
    where
        F: FnMut(&T) -> bool,
    {
        self.inner.retain(keep);
    }

    pub fn as_slice(&self) -> &[T] {
        &self.inner
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.inner
    }

    /// Read-only view of the delegate.
    pub fn as_vec(&self) -> &Vec<T> {
        &self.inner
    }

    pub fn into_inner(self) -> Vec<T> {
        self.inner
    }

    #[cold]
    #[inline(never)]
    fn grow_and_push(&mut self, observed_len: usize, value: T) {
        verify_snapshot(observed_len, self.inner.len());
        let capacity_before = self.inner.capacity();
        self.inner.push(value);
        self.report(GrowthSite::Push, observed_len, capacity_before);
    }

    #[cold]
    #[inline(never)]
    fn grow_and_emplace(&mut self, observed_len: usize, value: T) -> &mut T {
        verify_snapshot(observed_len, self.inner.len());
        let capacity_before = self.inner.capacity();
        self.inner.push(value);
        self.report(GrowthSite::Emplace, observed_len, capacity_before);
        &mut self.inner[observed_len]
    }

    #[cold]
    #[inline(never)]
    fn grow_and_insert(&mut self, observed_len: usize, index: usize, value: T) {
        verify_snapshot(observed_len, self.inner.len());
        let capacity_before = self.inner.capacity();
        self.inner.insert(index, value);
        self.report(GrowthSite::Insert, observed_len, capacity_before);
    }

    #[cold]
    #[inline(never)]
    fn grow_and_extend(&mut self, observed_len: usize, other: &[T])
    where
        T: Clone,
    {
        verify_snapshot(observed_len, self.inner.len());
        let capacity_before = self.inner.capacity();
        self.inner.extend_from_slice(other);
        self.report(GrowthSite::Extend, observed_len, capacity_before);
    }

    fn report(&self, site: GrowthSite, len_before: usize, capacity_before: usize) {
        emit(
            self.hook,
            GrowthEvent {
                container: ContainerKind::Sequence,
                site,
                detection: Detection::Predicted,
                len_before,
                capacity_before,
                capacity_after: self.inner.capacity(),
            },
        );
    }
}

impl<T> Default for GrowthVec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> From<Vec<T>> for GrowthVec<T> {
    fn from(inner: Vec<T>) -> Self {
        Self { inner, hook: None }
    }
}

impl<T> From<GrowthVec<T>> for Vec<T> {
    fn from(v: GrowthVec<T>) -> Self {
        v.inner
    }
}

impl<T: Clone> Clone for GrowthVec<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            hook: self.hook,
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for GrowthVec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.inner.fmt(f)
    }
}

impl<T: PartialEq> PartialEq for GrowthVec<T> {
    fn eq(&self, other: &Self) -> bool {
        self.inner == other.inner
    }
}

impl<T: Eq> Eq for GrowthVec<T> {}

impl<T: PartialEq> PartialEq<Vec<T>> for GrowthVec<T> {
    fn eq(&self, other: &Vec<T>) -> bool {
        &self.inner == other
    }
}

impl<T> Deref for GrowthVec<T> {
    type Target = [T];
    fn deref(&self) -> &[T] {
        &self.inner
    }
}

impl<T> DerefMut for GrowthVec<T> {
    fn deref_mut(&mut self) -> &mut [T] {
        &mut self.inner
    }
}

/// Element-wise, so each reallocation takes the growth path.
impl<T> Extend<T> for GrowthVec<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for v in iter {
            self.push(v);
        }
    }
}

impl<T> FromIterator<T> for GrowthVec<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut v = Self::new();
        v.extend(iter);
        v
    }
}

impl<T> IntoIterator for GrowthVec<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;
    fn into_iter(self) -> Self::IntoIter {
        self.inner.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a GrowthVec<T> {
    type Item = &'a T;
    type IntoIter = core::slice::Iter<'a, T>;
    fn into_iter(self) -> Self::IntoIter {
        self.inner.iter()
    }
}

impl<'a, T> IntoIterator for &'a mut GrowthVec<T> {
    type Item = &'a mut T;
    type IntoIter = core::slice::IterMut<'a, T>;
    fn into_iter(self) -> Self::IntoIter {
        self.inner.iter_mut()
    }
}
