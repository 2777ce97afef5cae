//! Construction-time configuration for the hash delegates and adapters.

use crate::error::GrowthError;

/// Load factor used when none is configured.
pub const DEFAULT_MAX_LOAD_FACTOR: f32 = 1.0;

/// Largest accepted max load factor. Physical storage is reserved up to
/// `bucket_count * max_load_factor` elements, so this bounds over-allocation.
pub const MAX_LOAD_FACTOR: f32 = 16.0;

/// Bucket count of a freshly constructed table.
pub const DEFAULT_INITIAL_BUCKETS: usize = 1;

/// Geometry a hash table starts with.
///
/// ```
/// use growth_containers::HashConfig;
///
/// let cfg = HashConfig::new()
///     .with_initial_buckets(64)
///     .with_max_load_factor(0.75);
/// assert!(cfg.validate().is_ok());
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HashConfig {
    /// Requested bucket count; rounded up to a power of two.
    pub initial_buckets: usize,
    pub max_load_factor: f32,
}

impl HashConfig {
    pub const fn new() -> Self {
        Self {
            initial_buckets: DEFAULT_INITIAL_BUCKETS,
            max_load_factor: DEFAULT_MAX_LOAD_FACTOR,
        }
    }

    pub fn with_initial_buckets(mut self, buckets: usize) -> Self {
        self.initial_buckets = buckets;
        self
    }

    pub fn with_max_load_factor(mut self, z: f32) -> Self {
        self.max_load_factor = z;
        self
    }

    /// Check the configuration without building a table.
    pub fn validate(&self) -> Result<(), GrowthError> {
        validate_load_factor(self.max_load_factor)?;
        self.bucket_count().map(|_| ())
    }

    /// The power-of-two bucket count this configuration resolves to.
    pub(crate) fn bucket_count(&self) -> Result<usize, GrowthError> {
        if self.initial_buckets == 0 {
            return Err(GrowthError::ZeroBuckets);
        }
        self.initial_buckets
            .checked_next_power_of_two()
            .ok_or(GrowthError::CapacityOverflow)
    }
}

impl Default for HashConfig {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) fn validate_load_factor(z: f32) -> Result<(), GrowthError> {
    if z.is_finite() && z > 0.0 && z <= MAX_LOAD_FACTOR {
        Ok(())
    } else {
        Err(GrowthError::InvalidLoadFactor(z))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_single_bucket_unit_load() {
        let cfg = HashConfig::default();
        assert_eq!(cfg.initial_buckets, 1);
        assert_eq!(cfg.max_load_factor, 1.0);
        assert_eq!(cfg.bucket_count(), Ok(1));
    }

    #[test]
    fn buckets_round_up_to_power_of_two() {
        let cfg = HashConfig::new().with_initial_buckets(100);
        assert_eq!(cfg.bucket_count(), Ok(128));
    }

    #[test]
    fn zero_buckets_rejected() {
        let cfg = HashConfig::new().with_initial_buckets(0);
        assert_eq!(cfg.validate(), Err(GrowthError::ZeroBuckets));
    }

    #[test]
    fn oversized_bucket_request_overflows() {
        let cfg = HashConfig::new().with_initial_buckets(usize::MAX);
        assert_eq!(cfg.validate(), Err(GrowthError::CapacityOverflow));
    }

    #[test]
    fn load_factor_bounds() {
        for bad in [0.0, -1.0, f32::NAN, f32::INFINITY, MAX_LOAD_FACTOR * 2.0] {
            assert!(validate_load_factor(bad).is_err(), "{bad} accepted");
        }
        for good in [0.1, 0.5, 1.0, MAX_LOAD_FACTOR] {
            assert!(validate_load_factor(good).is_ok(), "{good} rejected");
        }
    }
}
