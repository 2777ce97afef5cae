// Growth paths and threshold refreshes are visible to a tracing subscriber.
use growth_containers::{
    GrowthMap, GrowthSet, GrowthVec, GROWTH_TARGET, MAP_TARGET, SET_TARGET, VEC_TARGET,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::Layer;

#[derive(Clone)]
struct CountLayer {
    target: &'static str,
    hits: Arc<AtomicUsize>,
}

impl<S: Subscriber> Layer<S> for CountLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        if event.metadata().target() == self.target {
            self.hits.fetch_add(1, Ordering::Relaxed);
        }
    }
}

fn counting(target: &'static str, f: impl FnOnce()) -> usize {
    let hits = Arc::new(AtomicUsize::new(0));
    let layer = CountLayer {
        target,
        hits: Arc::clone(&hits),
    };
    let subscriber = tracing_subscriber::registry().with(layer);
    tracing::subscriber::with_default(subscriber, f);
    hits.load(Ordering::Relaxed)
}

#[test]
fn vec_growth_is_traced() {
    let hits = counting(GROWTH_TARGET, || {
        let mut v = GrowthVec::new();
        for i in 0..4 {
            v.push(i);
        }
    });
    assert!(hits >= 1);
}

#[test]
fn map_growth_is_traced_once_per_traversal() {
    let mut traversals = 0;
    let hits = counting(GROWTH_TARGET, || {
        let mut m: GrowthMap<u32, u32> = GrowthMap::new();
        for i in 0..100 {
            if m.len() + 1 >= m.growth_threshold() {
                traversals += 1;
            }
            m.insert(i, i);
        }
    });
    assert!(traversals > 0);
    assert_eq!(hits, traversals);
}

#[test]
fn threshold_refresh_is_logged() {
    let hits = counting(SET_TARGET, || {
        let mut s: GrowthSet<u8> = GrowthSet::new();
        s.reserve(10);
        s.rehash(64);
        let _ = s.set_max_load_factor(0.5);
    });
    assert_eq!(hits, 3);
}

#[test]
fn fast_path_is_silent() {
    let hits = counting(GROWTH_TARGET, || {
        let mut v: GrowthVec<u8> = GrowthVec::with_capacity(64);
        for i in 0..64 {
            v.push(i);
        }
    });
    assert_eq!(hits, 0);
}

#[test]
fn each_container_logs_on_its_own_target() {
    let vec_hits = counting(VEC_TARGET, || {
        let mut v: GrowthVec<u8> = GrowthVec::new();
        v.reserve(16);
        v.reserve_exact(64);
    });
    assert_eq!(vec_hits, 2);

    let map_hits = counting(MAP_TARGET, || {
        let mut m: GrowthMap<u8, u8> = GrowthMap::new();
        m.reserve(10);
        m.rehash(32);
        let _ = m.try_reserve(100);
        let _ = m.set_max_load_factor(2.0);
    });
    assert_eq!(map_hits, 4);

    let cross = counting(SET_TARGET, || {
        let mut m: GrowthMap<u8, u8> = GrowthMap::new();
        m.reserve(10);
    });
    assert_eq!(cross, 0);
}

// Targets share the crate prefix and never collide.
#[test]
fn distinct_target_names() {
    let all = [GROWTH_TARGET, VEC_TARGET, MAP_TARGET, SET_TARGET];
    for (i, a) in all.iter().enumerate() {
        assert!(a.starts_with("growth_containers::"));
        for b in &all[i + 1..] {
            assert_ne!(a, b);
        }
    }
}
