//! # lindaspace
//!
//! A Linda-style tuple space served over TCP:
//! - `out` inserts a tuple
//! - `rd` blocks until a tuple matches a pattern and returns a copy
//! - `in` blocks until a tuple matches a pattern and removes it
//! - Patterns match by arity and per-position equality, with wildcards
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      TCP Server                              │
//! │              (one thread per connection)                     │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │  framed Command / Response
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                   Command Router                             │
//! │         (TupleSpace::execute + cancel on hang-up)            │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!                       ▼
//!               ┌───────────────┐
//!               │  TupleSpace   │
//!               │ Mutex<Vec> +  │
//!               │   Condvar     │
//!               └───────┬───────┘
//!                       │
//!                       ▼
//!               ┌───────────────┐
//!               │    Matcher    │
//!               │ (pure, arity  │
//!               │  + wildcards) │
//!               └───────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod tuple;
pub mod space;
pub mod protocol;
pub mod network;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{SpaceError, Result};
pub use config::Config;
pub use space::{CancelToken, SpaceStats, TupleSpace};
pub use tuple::{matches, Pattern, PatternField, Tuple, Value};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of lindaspace
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
