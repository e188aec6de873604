//! Blocking Tests
//!
//! These tests verify:
//! - rd/in suspend until a matching out
//! - Every waiter is woken by an insert and re-checks its own pattern
//! - At most one in removes a given tuple
//! - Timeouts, cancellation and close release waiters cleanly

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::{Duration, Instant};

use lindaspace::{pattern, tuple, SpaceError, Tuple, TupleSpace};

// =============================================================================
// Helper Functions
// =============================================================================

fn eventually(cond: impl Fn() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !cond() {
        assert!(Instant::now() < deadline, "condition not reached in time");
        thread::sleep(Duration::from_millis(5));
    }
}

fn spawn_taker(space: &Arc<TupleSpace>, p: lindaspace::Pattern) -> thread::JoinHandle<lindaspace::Result<Tuple>> {
    let space = Arc::clone(space);
    thread::spawn(move || space.in_(&p))
}

// =============================================================================
// Blocking then Satisfied
// =============================================================================

#[test]
fn test_rd_blocks_until_out() {
    let space = Arc::new(TupleSpace::new());

    let reader = {
        let space = Arc::clone(&space);
        thread::spawn(move || space.rd(&pattern!["ready", _]))
    };

    eventually(|| space.waiting() == 1);
    thread::sleep(Duration::from_millis(50));
    assert!(!reader.is_finished());

    space.out(tuple!["ready", 1i64]).unwrap();

    assert_eq!(reader.join().unwrap().unwrap(), tuple!["ready", 1i64]);
    assert_eq!(space.len(), 1);
    assert_eq!(space.waiting(), 0);
}

#[test]
fn test_non_matching_out_does_not_release_waiter() {
    let space = Arc::new(TupleSpace::new());
    let taker = spawn_taker(&space, pattern!["want", _]);

    eventually(|| space.waiting() == 1);
    space.out(tuple!["other", 1i64]).unwrap();
    space.out(tuple!["want", 1i64, 2i64]).unwrap();

    // Woken twice, re-checked twice, still waiting
    thread::sleep(Duration::from_millis(50));
    assert!(!taker.is_finished());
    assert_eq!(space.waiting(), 1);

    space.out(tuple!["want", 9i64]).unwrap();
    assert_eq!(taker.join().unwrap().unwrap(), tuple!["want", 9i64]);
    assert_eq!(space.len(), 2);
}

#[test]
fn test_one_out_wakes_all_compatible_readers() {
    let space = Arc::new(TupleSpace::new());

    let readers: Vec<_> = (0..5)
        .map(|_| {
            let space = Arc::clone(&space);
            thread::spawn(move || space.rd(&pattern![_, 1i64]))
        })
        .collect();

    eventually(|| space.waiting() == 5);
    space.out(tuple!["x", 1i64]).unwrap();

    for reader in readers {
        assert_eq!(reader.join().unwrap().unwrap(), tuple!["x", 1i64]);
    }
    assert_eq!(space.len(), 1);
}

#[test]
fn test_waiters_with_different_patterns_each_get_theirs() {
    let space = Arc::new(TupleSpace::new());

    let a = spawn_taker(&space, pattern!["a", _]);
    let b = spawn_taker(&space, pattern![_, 2i64]);
    eventually(|| space.waiting() == 2);

    space.out(tuple!["b", 2i64]).unwrap();
    space.out(tuple!["a", 1i64]).unwrap();

    assert_eq!(a.join().unwrap().unwrap(), tuple!["a", 1i64]);
    assert_eq!(b.join().unwrap().unwrap(), tuple!["b", 2i64]);
    assert!(space.is_empty());
}

// =============================================================================
// At-most-one Removal
// =============================================================================

#[test]
fn test_racing_takers_only_one_wins() {
    let space = Arc::new(TupleSpace::new());
    let takers: Vec<_> = (0..6).map(|_| spawn_taker(&space, pattern!["prize"])).collect();

    eventually(|| space.waiting() == 6);
    space.out(tuple!["prize"]).unwrap();

    eventually(|| space.waiting() == 5);
    thread::sleep(Duration::from_millis(50));
    let finished = takers.iter().filter(|t| t.is_finished()).count();
    assert_eq!(finished, 1);
    assert!(space.is_empty());

    // Feed the rest so every thread can be joined
    for _ in 0..5 {
        space.out(tuple!["prize"]).unwrap();
    }
    for taker in takers {
        assert_eq!(taker.join().unwrap().unwrap(), tuple!["prize"]);
    }
    assert!(space.is_empty());
    assert_eq!(space.stats().takes, 6);
}

#[test]
fn test_concurrent_takers_remove_each_tuple_once() {
    let space = Arc::new(TupleSpace::with_seed(11));
    let total = 500i64;
    for n in 0..total {
        space.out(tuple!["n", n]).unwrap();
    }

    let workers = 8;
    let barrier = Arc::new(Barrier::new(workers));
    let taken = Arc::new(AtomicUsize::new(0));

    let handles: Vec<_> = (0..workers)
        .map(|_| {
            let space = Arc::clone(&space);
            let barrier = Arc::clone(&barrier);
            let taken = Arc::clone(&taken);
            thread::spawn(move || {
                barrier.wait();
                let mut mine = Vec::new();
                while let Some(t) = space.inp(&pattern!["n", _]).unwrap() {
                    taken.fetch_add(1, Ordering::SeqCst);
                    mine.push(t.to_string());
                }
                mine
            })
        })
        .collect();

    let mut all: Vec<String> = handles
        .into_iter()
        .flat_map(|h| h.join().unwrap())
        .collect();
    all.sort();
    let before = all.len();
    all.dedup();

    assert_eq!(before, total as usize);
    assert_eq!(all.len(), total as usize);
    assert_eq!(taken.load(Ordering::SeqCst), total as usize);
    assert!(space.is_empty());
}

// =============================================================================
// Timeouts
// =============================================================================

#[test]
fn test_rd_timeout_expires() {
    let space = TupleSpace::new();
    space.out(tuple!["other"]).unwrap();

    let start = Instant::now();
    let result = space.rd_timeout(&pattern!["missing"], Duration::from_millis(50)).unwrap();

    assert_eq!(result, None);
    assert!(start.elapsed() >= Duration::from_millis(50));
    assert_eq!(space.len(), 1);
    assert_eq!(space.waiting(), 0);
}

#[test]
fn test_in_timeout_satisfied_before_deadline() {
    let space = Arc::new(TupleSpace::new());

    let taker = {
        let space = Arc::clone(&space);
        thread::spawn(move || space.in_timeout(&pattern!["late"], Duration::from_secs(10)))
    };

    eventually(|| space.waiting() == 1);
    space.out(tuple!["late"]).unwrap();

    assert_eq!(taker.join().unwrap().unwrap(), Some(tuple!["late"]));
    assert!(space.is_empty());
}

#[test]
fn test_timeout_with_existing_match_returns_immediately() {
    let space = TupleSpace::new();
    space.out(tuple!["here"]).unwrap();

    let result = space.in_timeout(&pattern!["here"], Duration::from_secs(10)).unwrap();
    assert_eq!(result, Some(tuple!["here"]));
}

#[test]
fn test_unrepresentable_timeout_with_resident_match() {
    let space = TupleSpace::new();
    space.out(tuple!["x"]).unwrap();

    assert_eq!(
        space.rd_timeout(&pattern!["x"], Duration::MAX).unwrap(),
        Some(tuple!["x"])
    );
    assert_eq!(
        space.in_timeout(&pattern!["x"], Duration::MAX).unwrap(),
        Some(tuple!["x"])
    );
    assert!(space.is_empty());
}

#[test]
fn test_unrepresentable_timeout_waits_for_out() {
    let space = Arc::new(TupleSpace::new());

    let taker = {
        let space = Arc::clone(&space);
        thread::spawn(move || space.in_timeout(&pattern!["later"], Duration::MAX))
    };

    eventually(|| space.waiting() == 1);
    space.out(tuple!["later"]).unwrap();

    assert_eq!(taker.join().unwrap().unwrap(), Some(tuple!["later"]));
    assert!(space.is_empty());
}

// =============================================================================
// Cancellation and Close
// =============================================================================

#[test]
fn test_cancel_releases_waiter_without_side_effects() {
    let space = Arc::new(TupleSpace::new());
    space.out(tuple!["unrelated", 1i64]).unwrap();
    let token = space.cancel_token();

    let taker = {
        let space = Arc::clone(&space);
        let token = token.clone();
        thread::spawn(move || space.in_with(&pattern!["never"], &token))
    };

    eventually(|| space.waiting() == 1);
    token.cancel();

    assert!(matches!(taker.join().unwrap(), Err(SpaceError::Cancelled)));
    assert_eq!(space.waiting(), 0);
    assert_eq!(space.snapshot(), vec![tuple!["unrelated", 1i64]]);

    // A later out is not consumed by the cancelled caller
    space.out(tuple!["never"]).unwrap();
    assert_eq!(space.count(&pattern!["never"]), 1);
}

#[test]
fn test_cancel_before_wait_returns_immediately() {
    let space = TupleSpace::new();
    let token = space.cancel_token();
    token.cancel();

    assert!(token.is_cancelled());
    assert!(matches!(
        space.rd_with(&pattern!["x"], &token),
        Err(SpaceError::Cancelled)
    ));
}

#[test]
fn test_cancel_only_affects_its_own_waiter() {
    let space = Arc::new(TupleSpace::new());
    let token = space.cancel_token();

    let cancelled = {
        let space = Arc::clone(&space);
        let token = token.clone();
        thread::spawn(move || space.rd_with(&pattern!["x"], &token))
    };
    let survivor = spawn_taker(&space, pattern!["x"]);

    eventually(|| space.waiting() == 2);
    token.cancel();
    assert!(matches!(cancelled.join().unwrap(), Err(SpaceError::Cancelled)));

    eventually(|| space.waiting() == 1);
    space.out(tuple!["x"]).unwrap();
    assert_eq!(survivor.join().unwrap().unwrap(), tuple!["x"]);
}

#[test]
fn test_close_releases_all_waiters() {
    let space = Arc::new(TupleSpace::new());
    let takers: Vec<_> = (0..3).map(|_| spawn_taker(&space, pattern!["x"])).collect();
    let timed = {
        let space = Arc::clone(&space);
        thread::spawn(move || space.rd_timeout(&pattern!["x"], Duration::from_secs(30)))
    };

    eventually(|| space.waiting() == 4);
    space.close();

    for taker in takers {
        assert!(matches!(taker.join().unwrap(), Err(SpaceError::Closed)));
    }
    assert!(matches!(timed.join().unwrap(), Err(SpaceError::Closed)));
    assert_eq!(space.waiting(), 0);
}
