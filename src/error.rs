//! Recoverable failures surfaced by the delegates and adapters.
//!
//! Invariant violations (a stale size snapshot on a growth path) are not
//! represented here; those panic.

use crate::config::MAX_LOAD_FACTOR;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GrowthError {
    #[error("max load factor must be finite and in (0, {max}], got {0}", max = MAX_LOAD_FACTOR)]
    InvalidLoadFactor(f32),
    #[error("bucket count must be at least 1")]
    ZeroBuckets,
    #[error("requested capacity overflows the table size limit")]
    CapacityOverflow,
    #[error("allocator failed to provide {size} bytes (align {align})")]
    AllocFailed { size: usize, align: usize },
    #[error("vector reservation failed: {0}")]
    Reserve(#[from] std::collections::TryReserveError),
}

impl From<hashbrown::TryReserveError> for GrowthError {
    fn from(e: hashbrown::TryReserveError) -> Self {
        match e {
            hashbrown::TryReserveError::CapacityOverflow => GrowthError::CapacityOverflow,
            hashbrown::TryReserveError::AllocError { layout } => GrowthError::AllocFailed {
                size: layout.size(),
                align: layout.align(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hashbrown_overflow_maps_to_capacity_overflow() {
        let e: GrowthError = hashbrown::TryReserveError::CapacityOverflow.into();
        assert_eq!(e, GrowthError::CapacityOverflow);
    }

    #[test]
    fn hashbrown_alloc_error_keeps_layout() {
        let layout = std::alloc::Layout::from_size_align(64, 8).unwrap();
        let e: GrowthError = hashbrown::TryReserveError::AllocError { layout }.into();
        assert_eq!(e, GrowthError::AllocFailed { size: 64, align: 8 });
    }

    #[test]
    fn vec_reserve_error_converts() {
        let mut v: Vec<u64> = Vec::new();
        let err = v.try_reserve(usize::MAX).unwrap_err();
        let e: GrowthError = err.into();
        assert!(matches!(e, GrowthError::Reserve(_)));
        assert!(e.to_string().starts_with("vector reservation failed"));
    }

    #[test]
    fn invalid_load_factor_message_names_value() {
        let msg = GrowthError::InvalidLoadFactor(-1.5).to_string();
        assert!(msg.contains("-1.5"), "{msg}");
    }
}
