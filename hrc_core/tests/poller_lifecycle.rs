//! Timer thread lifecycle: threads stop when their slot is cleared and
//! never outlive the controller.

use hrc_core::{Poller, PollingController, Stream};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

fn counter() -> (Arc<AtomicUsize>, impl FnMut() -> bool + Send + 'static) {
    let n = Arc::new(AtomicUsize::new(0));
    let c = Arc::clone(&n);
    (n, move || {
        c.fetch_add(1, Ordering::SeqCst);
        true
    })
}

#[test]
fn poller_ticks_until_dropped() {
    let (n, tick) = counter();
    let p = Poller::spawn(Stream::Baseline, Duration::from_millis(5), tick);
    std::thread::sleep(Duration::from_millis(60));
    assert!(p.is_running());
    drop(p);
    let after_drop = n.load(Ordering::SeqCst);
    assert!(after_drop > 0);
    std::thread::sleep(Duration::from_millis(30));
    assert_eq!(n.load(Ordering::SeqCst), after_drop, "ticked after drop");
}

#[test]
fn poller_exits_when_consumer_is_gone() {
    let p = Poller::spawn(Stream::Challenge, Duration::from_millis(2), || false);
    std::thread::sleep(Duration::from_millis(50));
    assert!(!p.is_running());
}

#[test]
fn first_tick_waits_one_period() {
    let (n, tick) = counter();
    let p = Poller::spawn(Stream::Baseline, Duration::from_secs(3600), tick);
    std::thread::sleep(Duration::from_millis(20));
    drop(p);
    assert_eq!(n.load(Ordering::SeqCst), 0);
}

#[test]
fn starting_one_slot_stops_the_other() {
    let mut pc = PollingController::new();
    let (b, tick_b) = counter();
    pc.start_baseline_polling(Duration::from_millis(5), tick_b);
    assert_eq!(pc.active(), Some(Stream::Baseline));

    let (_c, tick_c) = counter();
    pc.start_challenge_polling(Duration::from_millis(5), tick_c);
    assert_eq!(pc.active(), Some(Stream::Challenge));
    assert_eq!(pc.active_count(), 1);

    let frozen = b.load(Ordering::SeqCst);
    std::thread::sleep(Duration::from_millis(30));
    assert_eq!(b.load(Ordering::SeqCst), frozen, "baseline timer still firing");
}

#[test]
fn restart_replaces_rather_than_stacks() {
    let mut pc = PollingController::new();
    for _ in 0..10 {
        let (_n, tick) = counter();
        pc.start_baseline_polling(Duration::from_millis(5), tick);
        assert_eq!(pc.active_count(), 1);
    }
    pc.stop_all();
    pc.stop_all();
    assert_eq!(pc.active(), None);
}

#[test]
fn stop_clears_only_the_named_slot() {
    let mut pc = PollingController::new();
    pc.start_challenge_polling(Duration::from_millis(5), || true);
    pc.stop(Stream::Baseline);
    assert_eq!(pc.active(), Some(Stream::Challenge));
    pc.stop(Stream::Challenge);
    assert_eq!(pc.active_count(), 0);
}
