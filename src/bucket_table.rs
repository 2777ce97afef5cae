//! BucketTable: hashbrown `HashTable` with explicit bucket accounting.
//!
//! hashbrown hides its bucket array and fixes its load factor. This layer
//! keeps a logical bucket count (a power of two) and a configurable max
//! load factor on top of it. Each time the geometry changes, physical
//! storage is reserved for twice `floor(bucket_count * max_load_factor) + 1`
//! elements. hashbrown resizes only when a reservation finds the table more
//! than half full, so tombstones left by remove/insert churn are cleared by
//! an in-place rehash. An insertion therefore reallocates only when it
//! changes `bucket_count()`.
//!
//! Each slot stores the element's precomputed hash; resizing never calls
//! back into `Hash`.

use crate::config::{validate_load_factor, HashConfig};
use crate::error::GrowthError;
use crate::threshold::{scaled_capacity, Geometry};
use hashbrown::hash_table::{self, HashTable};

#[derive(Clone, Debug)]
pub(crate) struct Slot<T> {
    hash: u64,
    item: T,
}

/// Result of a lookup-or-insert.
///
/// `geometry` is measured after the operation, so callers can refresh
/// derived state while still holding `item`.
pub(crate) struct Placed<'a, T> {
    pub item: &'a mut T,
    pub inserted: bool,
    pub geometry: Geometry,
}

#[derive(Clone, Debug)]
pub(crate) struct BucketTable<T> {
    table: HashTable<Slot<T>>,
    buckets: usize,
    max_load_factor: f32,
}

#[inline]
fn slot_hash<T>(slot: &Slot<T>) -> u64 {
    slot.hash
}

/// Physical slots kept for `capacity` logical elements. A lookup-or-insert
/// reserves one slot even for a duplicate, so at most `capacity + 1` items
/// are ever requested, and that stays within half of the allocation.
#[inline]
fn physical_slots(capacity: usize) -> usize {
    capacity.saturating_add(1).saturating_mul(2)
}

/// Smallest power-of-two bucket count holding `n` elements at load `z`.
fn min_buckets(n: usize, z: f32) -> Option<usize> {
    let raw = (n as f64 / z as f64).ceil();
    if raw >= usize::MAX as f64 {
        return None;
    }
    (raw as usize).max(1).checked_next_power_of_two()
}

impl<T> BucketTable<T> {
    pub(crate) fn with_config(config: &HashConfig) -> Result<Self, GrowthError> {
        validate_load_factor(config.max_load_factor)?;
        let buckets = config.bucket_count()?;
        let mut t = Self {
            table: HashTable::new(),
            buckets,
            max_load_factor: config.max_load_factor,
        };
        t.reserve_slots(buckets, config.max_load_factor)?;
        Ok(t)
    }

    /// Top physical storage up for `buckets` at load `z`. Never shrinks.
    fn reserve_slots(&mut self, buckets: usize, z: f32) -> Result<(), GrowthError> {
        let additional =
            physical_slots(scaled_capacity(buckets, z)).saturating_sub(self.table.len());
        self.table.try_reserve(additional, slot_hash)?;
        Ok(())
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.table.len()
    }

    #[inline]
    pub(crate) fn bucket_count(&self) -> usize {
        self.buckets
    }

    #[inline]
    pub(crate) fn max_load_factor(&self) -> f32 {
        self.max_load_factor
    }

    #[inline]
    pub(crate) fn capacity(&self) -> usize {
        scaled_capacity(self.buckets, self.max_load_factor)
    }

    pub(crate) fn load_factor(&self) -> f32 {
        self.table.len() as f32 / self.buckets as f32
    }

    pub(crate) fn geometry(&self) -> Geometry {
        Geometry {
            len: self.table.len(),
            bucket_count: self.buckets,
            max_load_factor: self.max_load_factor,
        }
    }

    pub(crate) fn find(&self, hash: u64, mut eq: impl FnMut(&T) -> bool) -> Option<&T> {
        self.table
            .find(hash, |slot| eq(&slot.item))
            .map(|slot| &slot.item)
    }

    pub(crate) fn find_mut(&mut self, hash: u64, mut eq: impl FnMut(&T) -> bool) -> Option<&mut T> {
        self.table
            .find_mut(hash, |slot| eq(&slot.item))
            .map(|slot| &mut slot.item)
    }

    /// Look up the element matching `probe`; build it with `make` when absent.
    ///
    /// Grows the buckets first when the new element would not fit. An
    /// existing element is returned untouched and `make` is not called.
    pub(crate) fn place<P>(
        &mut self,
        hash: u64,
        probe: P,
        eq: impl Fn(&P, &T) -> bool,
        make: impl FnOnce(P) -> T,
    ) -> Placed<'_, T> {
        let len = self.table.len();
        if len + 1 > self.capacity()
            && self.table.find(hash, |slot| eq(&probe, &slot.item)).is_none()
        {
            self.grow_for(len + 1);
        }
        let bucket_count = self.buckets;
        let max_load_factor = self.max_load_factor;
        match self
            .table
            .entry(hash, |slot| eq(&probe, &slot.item), slot_hash)
        {
            hash_table::Entry::Occupied(o) => Placed {
                item: &mut o.into_mut().item,
                inserted: false,
                geometry: Geometry {
                    len,
                    bucket_count,
                    max_load_factor,
                },
            },
            hash_table::Entry::Vacant(v) => {
                let item = make(probe);
                let slot = v.insert(Slot { hash, item }).into_mut();
                Placed {
                    item: &mut slot.item,
                    inserted: true,
                    geometry: Geometry {
                        len: len + 1,
                        bucket_count,
                        max_load_factor,
                    },
                }
            }
        }
    }

    pub(crate) fn remove(&mut self, hash: u64, mut eq: impl FnMut(&T) -> bool) -> Option<T> {
        match self.table.find_entry(hash, |slot| eq(&slot.item)) {
            Ok(o) => {
                let (slot, _) = o.remove();
                Some(slot.item)
            }
            Err(_) => None,
        }
    }

    pub(crate) fn retain(&mut self, mut keep: impl FnMut(&mut T) -> bool) {
        self.table.retain(|slot| keep(&mut slot.item));
    }

    /// Drops every element; buckets and storage are kept.
    pub(crate) fn clear(&mut self) {
        self.table.clear();
    }

    /// Bucket count becomes at least `n`, and at least enough for the
    /// current elements. Never shrinks.
    pub(crate) fn rehash(&mut self, n: usize) {
        if let Err(e) = self.try_rehash(n) {
            panic!("bucket table rehash({n}) failed: {e}");
        }
    }

    pub(crate) fn try_rehash(&mut self, n: usize) -> Result<(), GrowthError> {
        let needed = min_buckets(self.table.len(), self.max_load_factor)
            .ok_or(GrowthError::CapacityOverflow)?;
        let requested = n
            .max(needed)
            .checked_next_power_of_two()
            .ok_or(GrowthError::CapacityOverflow)?;
        self.try_resize(requested.max(self.buckets))
    }

    /// Make room for `n` elements without further growth.
    pub(crate) fn reserve(&mut self, n: usize) {
        if let Err(e) = self.try_reserve(n) {
            panic!("bucket table reserve({n}) failed: {e}");
        }
    }

    pub(crate) fn try_reserve(&mut self, n: usize) -> Result<(), GrowthError> {
        let buckets = min_buckets(n, self.max_load_factor).ok_or(GrowthError::CapacityOverflow)?;
        self.try_rehash(buckets)
    }

    pub(crate) fn set_max_load_factor(&mut self, z: f32) -> Result<(), GrowthError> {
        validate_load_factor(z)?;
        let needed =
            min_buckets(self.table.len(), z).ok_or(GrowthError::CapacityOverflow)?;
        let buckets = needed.max(self.buckets);
        self.reserve_slots(buckets, z)?;
        self.buckets = buckets;
        self.max_load_factor = z;
        Ok(())
    }

    fn grow_for(&mut self, needed: usize) {
        let target = min_buckets(needed, self.max_load_factor)
            .map(|b| b.max(self.buckets.saturating_mul(2)));
        match target {
            Some(buckets) => {
                if let Err(e) = self.try_resize(buckets) {
                    panic!("bucket table growth to {buckets} buckets failed: {e}");
                }
            }
            None => panic!("bucket table capacity overflow"),
        }
    }

    fn try_resize(&mut self, buckets: usize) -> Result<(), GrowthError> {
        if buckets == self.buckets {
            return Ok(());
        }
        self.reserve_slots(buckets, self.max_load_factor)?;
        self.buckets = buckets;
        Ok(())
    }

    /// Elements hashbrown can hold before it must reallocate.
    #[cfg(test)]
    pub(crate) fn allocated(&self) -> usize {
        self.table.capacity()
    }

    pub(crate) fn iter(&self) -> Iter<'_, T> {
        Iter {
            it: self.table.iter(),
        }
    }

    pub(crate) fn iter_mut(&mut self) -> IterMut<'_, T> {
        IterMut {
            it: self.table.iter_mut(),
        }
    }
}

impl<T> IntoIterator for BucketTable<T> {
    type Item = T;
    type IntoIter = IntoIter<T>;

    fn into_iter(self) -> IntoIter<T> {
        IntoIter {
            it: self.table.into_iter(),
        }
    }
}

pub(crate) struct Iter<'a, T> {
    it: hash_table::Iter<'a, Slot<T>>,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;
    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.it.next().map(|slot| &slot.item)
    }
    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.it.size_hint()
    }
}

pub(crate) struct IterMut<'a, T> {
    it: hash_table::IterMut<'a, Slot<T>>,
}

impl<'a, T> Iterator for IterMut<'a, T> {
    type Item = &'a mut T;
    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.it.next().map(|slot| &mut slot.item)
    }
    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.it.size_hint()
    }
}

pub(crate) struct IntoIter<T> {
    it: hash_table::IntoIter<Slot<T>>,
}

impl<T> Iterator for IntoIter<T> {
    type Item = T;
    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.it.next().map(|slot| slot.item)
    }
    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.it.size_hint()
    }
}
