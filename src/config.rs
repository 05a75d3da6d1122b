//! Configuration for blockio
//!
//! Centralized sizing for the decorator stack with sensible defaults.

use crate::error::{Result, StoreError};

/// Default read-ahead window (one classic disk sector)
pub const DEFAULT_WINDOW_SIZE: usize = 512;

/// Default write-coalescing buffer capacity
pub const DEFAULT_BUFFER_CAPACITY: usize = 4096;

/// Default block size for the block overlay
pub const DEFAULT_BLOCK_SIZE: usize = 512;

/// Sizing for a layered store
///
/// All values are fixed at construction of the layer they configure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreConfig {
    // -------------------------------------------------------------------------
    // ReadCache Configuration
    // -------------------------------------------------------------------------
    /// Maximum bytes fetched by a single read-ahead miss
    pub window_size: usize,

    // -------------------------------------------------------------------------
    // WriteCoalescer Configuration
    // -------------------------------------------------------------------------
    /// Maximum bytes held back before a write is pushed down
    pub buffer_capacity: usize,

    // -------------------------------------------------------------------------
    // BlockStore Configuration
    // -------------------------------------------------------------------------
    /// Size of one logical block in bytes
    pub block_size: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            window_size: DEFAULT_WINDOW_SIZE,
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
            block_size: DEFAULT_BLOCK_SIZE,
        }
    }
}

impl StoreConfig {
    /// Create a new config builder
    pub fn builder() -> StoreConfigBuilder {
        StoreConfigBuilder::default()
    }

    /// Check that every size is positive
    pub fn validate(&self) -> Result<()> {
        if self.window_size == 0 {
            return Err(StoreError::invalid("window_size must be positive"));
        }
        if self.buffer_capacity == 0 {
            return Err(StoreError::invalid("buffer_capacity must be positive"));
        }
        if self.block_size == 0 {
            return Err(StoreError::invalid("block_size must be positive"));
        }
        Ok(())
    }
}

/// Builder for StoreConfig
#[derive(Default)]
pub struct StoreConfigBuilder {
    config: StoreConfig,
}

impl StoreConfigBuilder {
    /// Set the read-ahead window size (in bytes)
    pub fn window_size(mut self, size: usize) -> Self {
        self.config.window_size = size;
        self
    }

    /// Set the write-coalescing buffer capacity (in bytes)
    pub fn buffer_capacity(mut self, size: usize) -> Self {
        self.config.buffer_capacity = size;
        self
    }

    /// Set the block size (in bytes)
    pub fn block_size(mut self, size: usize) -> Self {
        self.config.block_size = size;
        self
    }

    pub fn build(self) -> StoreConfig {
        self.config
    }
}
