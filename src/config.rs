//! Configuration for lindaspace
//!
//! Centralized configuration with sensible defaults.

use crate::error::{Result, SpaceError};

/// Main configuration for a lindaspace instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Tuple Space Configuration
    // -------------------------------------------------------------------------
    /// Seed for the RNG that picks among multiple matching tuples.
    /// `None` seeds from OS entropy.
    pub rng_seed: Option<u64>,

    /// Initial capacity of the resident tuple vector
    pub initial_capacity: usize,

    // -------------------------------------------------------------------------
    // Network Configuration
    // -------------------------------------------------------------------------
    /// TCP listen address
    pub listen_addr: String,

    /// Max concurrent client connections
    pub max_connections: usize,

    /// Connection read timeout between requests (milliseconds, 0 = none)
    ///
    /// Clients may legitimately idle between requests, so this defaults to 0.
    pub read_timeout_ms: u64,

    /// Connection write timeout (milliseconds, 0 = none)
    pub write_timeout_ms: u64,

    /// How often a blocked request checks whether its client went away
    /// (milliseconds). Bounds how long a dead client's waiter lingers.
    pub disconnect_poll_ms: u64,

    /// Sleep between accept attempts when no connection is pending
    /// (milliseconds). Bounds shutdown latency of the accept loop.
    pub accept_poll_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rng_seed: None,
            initial_capacity: 1024,
            listen_addr: "127.0.0.1:8080".to_string(),
            max_connections: 1024,
            read_timeout_ms: 0,
            write_timeout_ms: 5000,
            disconnect_poll_ms: 200,
            accept_poll_ms: 50,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Check settings the server cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.listen_addr.is_empty() {
            return Err(SpaceError::Config("listen address is empty".to_string()));
        }
        if self.max_connections == 0 {
            return Err(SpaceError::Config(
                "max_connections must be at least 1".to_string(),
            ));
        }
        if self.disconnect_poll_ms == 0 || self.accept_poll_ms == 0 {
            return Err(SpaceError::Config(
                "polling intervals must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Seed the match-selection RNG (deterministic choice order)
    pub fn rng_seed(mut self, seed: u64) -> Self {
        self.config.rng_seed = Some(seed);
        self
    }

    /// Set the initial capacity of the tuple store
    pub fn initial_capacity(mut self, capacity: usize) -> Self {
        self.config.initial_capacity = capacity;
        self
    }

    /// Set the TCP listen address
    pub fn listen_addr(mut self, addr: impl Into<String>) -> Self {
        self.config.listen_addr = addr.into();
        self
    }

    /// Set the maximum number of concurrent connections
    pub fn max_connections(mut self, count: usize) -> Self {
        self.config.max_connections = count;
        self
    }

    /// Set the read timeout (in milliseconds)
    pub fn read_timeout_ms(mut self, ms: u64) -> Self {
        self.config.read_timeout_ms = ms;
        self
    }

    /// Set the write timeout (in milliseconds)
    pub fn write_timeout_ms(mut self, ms: u64) -> Self {
        self.config.write_timeout_ms = ms;
        self
    }

    /// Set the disconnect polling interval for blocked requests (in milliseconds)
    pub fn disconnect_poll_ms(mut self, ms: u64) -> Self {
        self.config.disconnect_poll_ms = ms;
        self
    }

    /// Set the accept loop polling interval (in milliseconds)
    pub fn accept_poll_ms(mut self, ms: u64) -> Self {
        self.config.accept_poll_ms = ms;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
