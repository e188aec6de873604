//! Tuple Space Module
//!
//! The concurrent store behind every `out`, `rd` and `in`.
//!
//! ## Responsibilities
//! - Hold the resident multiset of tuples
//! - Serialize every lookup and mutation through one lock
//! - Suspend `rd`/`in` callers until a matching tuple exists
//! - Wake blocked callers on every insert so each re-checks its own pattern
//!
//! ## Concurrency Model
//! ```text
//!   out ──► lock ─► push ─► notify_all ─► unlock
//!
//!   rd/in ─► lock ─► scan ─┬─ match ─► (remove) ─► unlock ─► return
//!              ▲           └─ none ──► condvar wait (lock released)
//!              └──────────────────────────┘  (woken: re-scan from scratch)
//! ```
//!
//! The condvar wait releases the lock and parks atomically, so an `out`
//! that lands between "no match" and "park" cannot be missed.

mod cancel;
mod store;

pub use cancel::CancelToken;
pub use store::TupleSpace;

/// Point-in-time counters for a tuple space
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SpaceStats {
    /// Tuples inserted since creation
    pub outs: u64,

    /// Successful non-destructive reads (`rd`, `rdp`)
    pub reads: u64,

    /// Successful removals (`in`, `inp`)
    pub takes: u64,

    /// Tuples currently resident
    pub size: usize,

    /// Callers currently parked waiting for a match
    pub waiting: usize,
}
