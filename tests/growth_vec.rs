// GrowthVec integration tests.
//
// Core invariants exercised:
// - Prediction is exact: `len == capacity` before a push iff that push
//   reallocates, and the growth path runs iff it reallocates.
// - Behavior matches a plain Vec fed the same operations.
use growth_containers::{ContainerKind, Detection, GrowthEvent, GrowthSite, GrowthVec};
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

// Test: push 1..=4 into an empty adapter.
// Verifies: final size 4; at least one push went through the growth path
// and that traversal changed capacity.
#[test]
fn scenario_push_four_from_empty() {
    let mut v = GrowthVec::new();
    v.set_growth_hook(record);
    assert_eq!(v.capacity(), 0);
    for x in 1..=4 {
        v.push(x);
    }
    assert_eq!(v.len(), 4);
    assert_eq!(&v[..], &[1, 2, 3, 4]);

    let events = take_events();
    assert!(!events.is_empty());
    assert!(events.iter().any(|e| e.reallocated()));
    let first = events[0];
    assert_eq!(first.container, ContainerKind::Sequence);
    assert_eq!(first.site, GrowthSite::Push);
    assert_eq!(first.detection, Detection::Predicted);
    assert_eq!(first.len_before, 0);
    assert_eq!(first.capacity_before, 0);
}

// Test: after each push, `len == capacity` predicts whether the next push
// grows capacity. Checked by performing that next push.
#[test]
fn full_predicate_is_exact() {
    let mut v: GrowthVec<u16> = GrowthVec::new();
    for i in 0..2000u16 {
        let full = v.len() == v.capacity();
        let before = v.capacity();
        v.push(i);
        assert_eq!(full, v.capacity() != before, "mismatch at push {}", i);
    }
}

// Test: emplace and push interleaved with a plain Vec model.
#[test]
fn matches_plain_vec() {
    let mut v = GrowthVec::new();
    let mut model = Vec::new();
    for i in 0..300u32 {
        match i % 4 {
            0 => {
                v.push(i);
                model.push(i);
            }
            1 => {
                *v.emplace(i) += 1;
                model.push(i + 1);
            }
            2 => {
                let at = v.len() / 2;
                v.insert(at, i);
                model.insert(at, i);
            }
            _ => {
                v.extend_from_slice(&[i, i]);
                model.extend_from_slice(&[i, i]);
            }
        }
        assert_eq!(v.as_vec(), &model);
    }
    assert_eq!(v.into_inner(), model);
}

// Test: element-wise Extend reports one event per reallocation.
#[test]
fn extend_routes_each_reallocation() {
    let mut v: GrowthVec<u8> = GrowthVec::new();
    v.set_growth_hook(record);
    let mut caps = vec![v.capacity()];
    for x in 0..200u8 {
        v.extend(std::iter::once(x));
        if *caps.last().unwrap() != v.capacity() {
            caps.push(v.capacity());
        }
    }
    let events = take_events();
    assert_eq!(events.len(), caps.len() - 1);
    for (e, w) in events.iter().zip(caps.windows(2)) {
        assert_eq!((e.capacity_before, e.capacity_after), (w[0], w[1]));
    }
}

#[test]
fn collect_and_iterate() {
    let v: GrowthVec<i32> = (1..=5).collect();
    let doubled: Vec<i32> = (&v).into_iter().map(|x| x * 2).collect();
    assert_eq!(doubled, vec![2, 4, 6, 8, 10]);
    let mut w = v.clone();
    for x in &mut w {
        *x = -*x;
    }
    assert_eq!(w.iter().sum::<i32>(), -15);
    assert_eq!(v.into_iter().sum::<i32>(), 15);
}
