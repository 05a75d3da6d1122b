//! # blockio
//!
//! Layered random-access byte storage with:
//! - One `ByteStore` contract shared by every medium and decorator
//! - Read-ahead caching and write coalescing as transparent decorators
//! - A fixed-size block overlay with in-place insertion and deletion
//! - Ordered change notification for block-index dependents
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        BlockStore                            │
//! │          (block I/O, insert/delete shift, listeners)         │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ ByteStore
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                        ReadCache                             │
//! │                 (read-ahead window, coherent)                │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ ByteStore
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                     WriteCoalescer                           │
//! │              (write-behind buffer, read-your-write)          │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ ByteStore
//!          ┌────────────┴────────────┐
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │ MemoryStore │          │  FileStore  │
//!   └─────────────┘          └─────────────┘
//! ```
//!
//! Every layer is optional; [`stack::layer`] builds the full stack.

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod store;
pub mod cache;
pub mod block;
pub mod stack;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{Result, StoreError};
pub use config::StoreConfig;
pub use store::{ByteStore, FileStore, MemoryStore, ReadOutcome, SharedStore};
pub use cache::{ReadCache, WriteCoalescer};
pub use block::{BlockListener, BlockStore, ListenerId};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of blockio
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
