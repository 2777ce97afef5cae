//! Growth events and the per-instance instrumentation hook.
//!
//! Every traversal of a growth path produces one [`GrowthEvent`]. It is
//! emitted as a `tracing` TRACE event on [`GROWTH_TARGET`] and handed to the
//! container's [`GrowthHook`] if one is installed. Tooling that prefers
//! symbol breakpoints can instead break on the `grow_and_*` methods, which
//! are never inlined.

/// `tracing` target used for growth-path events.
pub const GROWTH_TARGET: &str = "growth_containers::growth";

/// `tracing` targets for DEBUG logs of geometry-changing calls.
pub const VEC_TARGET: &str = "growth_containers::vec";
pub const MAP_TARGET: &str = "growth_containers::map";
pub const SET_TARGET: &str = "growth_containers::set";

/// Instrumentation callback invoked on each growth-path traversal.
pub type GrowthHook = fn(&GrowthEvent);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ContainerKind {
    Sequence,
    Map,
    Set,
}

/// Operation that led into the growth path.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GrowthSite {
    Push,
    Emplace,
    Insert,
    Extend,
    IndexAccess,
}

/// How the growth was recognized.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Detection {
    /// The predicate fired before the mutation.
    Predicted,
    /// The fast path was taken and the delegate was found to have grown
    /// afterwards.
    Reactive,
}

/// One traversal of a growth path.
///
/// `capacity_*` is `Vec::capacity` for the sequence and `bucket_count`
/// for the hash containers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GrowthEvent {
    pub container: ContainerKind,
    pub site: GrowthSite,
    pub detection: Detection,
    pub len_before: usize,
    pub capacity_before: usize,
    pub capacity_after: usize,
}

impl GrowthEvent {
    /// Whether the delegate grew: `capacity()` for the sequence,
    /// `bucket_count()` for the hash containers. Hash adapters predict
    /// conservatively, so a predicted traversal may not grow anything.
    pub fn reallocated(&self) -> bool {
        self.capacity_before != self.capacity_after
    }
}

pub(crate) fn emit(hook: Option<GrowthHook>, event: GrowthEvent) {
    tracing::trace!(
        target: GROWTH_TARGET,
        container = ?event.container,
        site = ?event.site,
        detection = ?event.detection,
        len_before = event.len_before,
        capacity_before = event.capacity_before,
        capacity_after = event.capacity_after,
        reallocated = event.reallocated(),
        "growth path"
    );
    if let Some(hook) = hook {
        hook(&event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    thread_local! {
        static SEEN: RefCell<Vec<GrowthEvent>> = const { RefCell::new(Vec::new()) };
    }

    fn record(e: &GrowthEvent) {
        SEEN.with(|s| s.borrow_mut().push(*e));
    }

    fn event(before: usize, after: usize) -> GrowthEvent {
        GrowthEvent {
            container: ContainerKind::Sequence,
            site: GrowthSite::Push,
            detection: Detection::Predicted,
            len_before: before,
            capacity_before: before,
            capacity_after: after,
        }
    }

    #[test]
    fn reallocated_compares_capacities() {
        assert!(event(4, 8).reallocated());
        assert!(!event(4, 4).reallocated());
    }

    #[test]
    fn emit_calls_hook_once() {
        emit(Some(record), event(0, 4));
        emit(None, event(4, 8));
        SEEN.with(|s| {
            let seen = s.borrow();
            assert_eq!(seen.len(), 1);
            assert_eq!(seen[0].capacity_after, 4);
        });
    }
}
