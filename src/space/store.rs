//! TupleSpace implementation
//!
//! Vec-backed multiset under a parking_lot Mutex, paired with one Condvar
//! that every insert broadcasts on.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::Config;
use crate::error::{Result, SpaceError};
use crate::protocol::Command;
use crate::tuple::{matches, Pattern, Tuple};

use super::{CancelToken, SpaceStats};

/// What a successful scan does with the chosen tuple
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Retrieval {
    /// `rd`: hand back a copy, leave it resident
    Read,
    /// `in`: remove it from the store
    Take,
}

/// Everything guarded by the store lock
pub(crate) struct State {
    /// Resident tuples; duplicates are distinct entries
    tuples: Vec<Tuple>,

    /// Picks uniformly among multiple matches
    rng: StdRng,

    /// Set by `close`; every waiter bails out with `Closed`
    closed: bool,
}

impl State {
    /// One scan (and maybe removal) under the lock
    ///
    /// Indices are collected and consumed within the same lock hold, so a
    /// removed index is always one that was just re-validated.
    fn select(&mut self, pattern: &Pattern, mode: Retrieval) -> Option<Tuple> {
        let candidates: Vec<usize> = self
            .tuples
            .iter()
            .enumerate()
            .filter(|(_, tuple)| matches(tuple, pattern))
            .map(|(index, _)| index)
            .collect();

        if candidates.is_empty() {
            return None;
        }

        let pick = candidates[self.rng.gen_range(0..candidates.len())];
        match mode {
            Retrieval::Read => Some(self.tuples[pick].clone()),
            Retrieval::Take => Some(self.tuples.remove(pick)),
        }
    }
}

/// State shared between a space, its clones and its cancel tokens
pub(crate) struct Shared {
    pub(crate) state: Mutex<State>,

    /// Broadcast on insert, cancel and close
    pub(crate) changed: Condvar,

    outs: AtomicU64,
    reads: AtomicU64,
    takes: AtomicU64,
    waiting: AtomicUsize,
}

/// Counts a caller as waiting for as long as it is alive
struct WaitingGuard<'a> {
    waiting: &'a AtomicUsize,
}

impl<'a> WaitingGuard<'a> {
    fn register(waiting: &'a AtomicUsize) -> Self {
        waiting.fetch_add(1, Ordering::SeqCst);
        Self { waiting }
    }
}

impl Drop for WaitingGuard<'_> {
    fn drop(&mut self) {
        self.waiting.fetch_sub(1, Ordering::SeqCst);
    }
}

/// A Linda tuple space
///
/// ## Concurrency
/// - `state`: one Mutex guards the multiset; every operation is a single
///   scan-and-maybe-mutate pass under it
/// - `changed`: Condvar; blocked `rd`/`in` park on it with the lock released
/// - counters: atomics, read without the lock by `stats`
///
/// Cloning is cheap and yields a handle to the same space.
#[derive(Clone)]
pub struct TupleSpace {
    shared: Arc<Shared>,
}

impl TupleSpace {
    /// Create an empty space seeded from OS entropy
    pub fn new() -> Self {
        Self::with_config(&Config::default())
    }

    /// Create an empty space with a fixed RNG seed (reproducible choices)
    pub fn with_seed(seed: u64) -> Self {
        Self::with_config(&Config::builder().rng_seed(seed).build())
    }

    /// Create an empty space from config
    pub fn with_config(config: &Config) -> Self {
        let rng = match config.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(State {
                    tuples: Vec::with_capacity(config.initial_capacity),
                    rng,
                    closed: false,
                }),
                changed: Condvar::new(),
                outs: AtomicU64::new(0),
                reads: AtomicU64::new(0),
                takes: AtomicU64::new(0),
                waiting: AtomicUsize::new(0),
            }),
        }
    }

    // =========================================================================
    // Linda Operations
    // =========================================================================

    /// Insert a tuple and wake every blocked caller
    ///
    /// The tuple was validated when it was built, so nothing here can
    /// reject it except a closed space.
    pub fn out(&self, tuple: Tuple) -> Result<()> {
        {
            let mut state = self.shared.state.lock();
            if state.closed {
                return Err(SpaceError::Closed);
            }
            tracing::trace!("out {}", tuple);
            state.tuples.push(tuple);
            self.shared.changed.notify_all();
        }

        self.shared.outs.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Blocking read: return a copy of a matching tuple, leave it resident
    pub fn rd(&self, pattern: &Pattern) -> Result<Tuple> {
        self.wait_for(pattern, Retrieval::Read, None, None)
            .map(Self::expect_match)
    }

    /// Blocking take: remove and return a matching tuple
    pub fn in_(&self, pattern: &Pattern) -> Result<Tuple> {
        self.wait_for(pattern, Retrieval::Take, None, None)
            .map(Self::expect_match)
    }

    /// Blocking read that returns `Cancelled` once `token` is cancelled
    pub fn rd_with(&self, pattern: &Pattern, token: &CancelToken) -> Result<Tuple> {
        self.check_token(token)?;
        self.wait_for(pattern, Retrieval::Read, Some(token), None)
            .map(Self::expect_match)
    }

    /// Blocking take that returns `Cancelled` once `token` is cancelled
    pub fn in_with(&self, pattern: &Pattern, token: &CancelToken) -> Result<Tuple> {
        self.check_token(token)?;
        self.wait_for(pattern, Retrieval::Take, Some(token), None)
            .map(Self::expect_match)
    }

    /// Read with a deadline; `Ok(None)` if nothing matched in time
    ///
    /// A timeout too large to represent as an `Instant` waits without limit.
    pub fn rd_timeout(&self, pattern: &Pattern, timeout: Duration) -> Result<Option<Tuple>> {
        self.wait_for(pattern, Retrieval::Read, None, Instant::now().checked_add(timeout))
    }

    /// Take with a deadline; `Ok(None)` if nothing matched in time
    ///
    /// A timeout too large to represent as an `Instant` waits without limit.
    pub fn in_timeout(&self, pattern: &Pattern, timeout: Duration) -> Result<Option<Tuple>> {
        self.wait_for(pattern, Retrieval::Take, None, Instant::now().checked_add(timeout))
    }

    /// Non-blocking read: one scan, `None` if nothing matches
    pub fn rdp(&self, pattern: &Pattern) -> Result<Option<Tuple>> {
        self.try_once(pattern, Retrieval::Read)
    }

    /// Non-blocking take: one scan, `None` if nothing matches
    pub fn inp(&self, pattern: &Pattern) -> Result<Option<Tuple>> {
        self.try_once(pattern, Retrieval::Take)
    }

    /// Execute a decoded command
    ///
    /// Routes commands to the matching operation. Blocking commands honor
    /// `token`, which the connection cancels when its client goes away.
    pub fn execute(&self, command: Command, token: &CancelToken) -> Result<Option<Tuple>> {
        match command {
            Command::Out { tuple } => {
                self.out(tuple)?;
                Ok(None)
            }
            Command::Rd { pattern } => self.rd_with(&pattern, token).map(Some),
            Command::In { pattern } => self.in_with(&pattern, token).map(Some),
            Command::Ping => Ok(None),
        }
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Issue a cancel token bound to this space
    pub fn cancel_token(&self) -> CancelToken {
        CancelToken::new(Arc::downgrade(&self.shared))
    }

    /// Shut the space down
    ///
    /// Every blocked caller wakes with `Closed`; later operations also fail
    /// with `Closed`. Resident tuples are left as they are.
    pub fn close(&self) {
        let mut state = self.shared.state.lock();
        if !state.closed {
            state.closed = true;
            let woken = self.shared.changed.notify_all();
            tracing::debug!("Tuple space closed, released {} waiter(s)", woken);
        }
    }

    /// Whether `close` has been called
    pub fn is_closed(&self) -> bool {
        self.shared.state.lock().closed
    }

    // =========================================================================
    // Accessors (for testing and monitoring)
    // =========================================================================

    /// Number of resident tuples matched by `pattern`
    pub fn count(&self, pattern: &Pattern) -> usize {
        let state = self.shared.state.lock();
        state.tuples.iter().filter(|t| matches(t, pattern)).count()
    }

    /// Number of resident tuples
    pub fn len(&self) -> usize {
        self.shared.state.lock().tuples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy of every resident tuple, in insertion order
    pub fn snapshot(&self) -> Vec<Tuple> {
        self.shared.state.lock().tuples.clone()
    }

    /// Number of callers currently parked in `rd`/`in`
    pub fn waiting(&self) -> usize {
        self.shared.waiting.load(Ordering::SeqCst)
    }

    /// Operation counters and current size
    pub fn stats(&self) -> SpaceStats {
        SpaceStats {
            outs: self.shared.outs.load(Ordering::Relaxed),
            reads: self.shared.reads.load(Ordering::Relaxed),
            takes: self.shared.takes.load(Ordering::Relaxed),
            size: self.len(),
            waiting: self.waiting(),
        }
    }

    // =========================================================================
    // Internals
    // =========================================================================

    /// The retrieval loop shared by every blocking form
    ///
    /// Each iteration re-checks shutdown and cancellation, then re-scans
    /// the full store. Nothing computed in an earlier iteration is trusted.
    fn wait_for(
        &self,
        pattern: &Pattern,
        mode: Retrieval,
        token: Option<&CancelToken>,
        deadline: Option<Instant>,
    ) -> Result<Option<Tuple>> {
        let mut state = self.shared.state.lock();
        let mut registration: Option<WaitingGuard<'_>> = None;

        loop {
            if state.closed {
                return Err(SpaceError::Closed);
            }
            if token.map_or(false, CancelToken::is_cancelled) {
                tracing::trace!("wait for {} cancelled", pattern);
                return Err(SpaceError::Cancelled);
            }

            if let Some(tuple) = state.select(pattern, mode) {
                drop(state);
                self.record(mode);
                return Ok(Some(tuple));
            }

            if registration.is_none() {
                registration = Some(WaitingGuard::register(&self.shared.waiting));
            }

            match deadline {
                Some(deadline) => {
                    if self.shared.changed.wait_until(&mut state, deadline).timed_out() {
                        if state.closed {
                            return Err(SpaceError::Closed);
                        }
                        let last = state.select(pattern, mode);
                        drop(state);
                        if last.is_some() {
                            self.record(mode);
                        }
                        return Ok(last);
                    }
                }
                None => self.shared.changed.wait(&mut state),
            }
        }
    }

    fn try_once(&self, pattern: &Pattern, mode: Retrieval) -> Result<Option<Tuple>> {
        let found = {
            let mut state = self.shared.state.lock();
            if state.closed {
                return Err(SpaceError::Closed);
            }
            state.select(pattern, mode)
        };

        if found.is_some() {
            self.record(mode);
        }
        Ok(found)
    }

    fn record(&self, mode: Retrieval) {
        let counter = match mode {
            Retrieval::Read => &self.shared.reads,
            Retrieval::Take => &self.shared.takes,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn check_token(&self, token: &CancelToken) -> Result<()> {
        if token.belongs_to(&self.shared) {
            Ok(())
        } else {
            Err(SpaceError::Validation(
                "cancel token was issued by a different tuple space".to_string(),
            ))
        }
    }

    /// Unbounded waits only return once they found something
    fn expect_match(found: Option<Tuple>) -> Tuple {
        match found {
            Some(tuple) => tuple,
            None => unreachable!("unbounded wait returned without a match"),
        }
    }
}

impl Default for TupleSpace {
    fn default() -> Self {
        Self::new()
    }
}
