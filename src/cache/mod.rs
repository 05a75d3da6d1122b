//! Cache Module
//!
//! Performance decorators over a [`ByteStore`](crate::store::ByteStore).
//!
//! ## Responsibilities
//! - Read-ahead: serve small sequential reads from one prefetched window
//! - Write-behind: merge contiguous small writes into one underlying write
//! - Coherence: reads through a decorator always observe writes made through it
//!
//! ## Composition
//! ```text
//! ReadCache ──▶ WriteCoalescer ──▶ MemoryStore | FileStore
//!  (window)       (buffer)            (medium)
//! ```
//! Both decorators implement `ByteStore`, so either order works.

mod region;
mod read_cache;
mod write_coalescer;

pub use region::Region;
pub use read_cache::{CacheStats, ReadCache};
pub use write_coalescer::WriteCoalescer;
