//! Stack assembly
//!
//! Composes a leaf store into the standard layered stack:
//!
//! ```text
//! BlockStore ──▶ ReadCache ──▶ WriteCoalescer ──▶ leaf
//! ```

use std::path::Path;

use tracing::debug;

use crate::block::BlockStore;
use crate::cache::{ReadCache, WriteCoalescer};
use crate::config::StoreConfig;
use crate::error::Result;
use crate::store::{ByteStore, FileStore};

/// Read-ahead over write-behind over `S`
pub type LayeredStore<S> = ReadCache<WriteCoalescer<S>>;

/// Wrap `leaf` in both decorators and a block overlay sized by `config`
pub fn layer<S: ByteStore>(leaf: S, config: &StoreConfig) -> Result<BlockStore<LayeredStore<S>>> {
    config.validate()?;
    let coalescer = WriteCoalescer::new(leaf, config.buffer_capacity)?;
    let cache = ReadCache::new(coalescer, config.window_size)?;
    let blocks = BlockStore::new(cache, config.block_size)?;
    debug!(
        window_size = config.window_size,
        buffer_capacity = config.buffer_capacity,
        block_size = config.block_size,
        "assembled layered store"
    );
    Ok(blocks)
}

/// Open (or create) a file and layer it per `config`
pub fn open_file(
    path: impl AsRef<Path>,
    config: &StoreConfig,
) -> Result<BlockStore<LayeredStore<FileStore>>> {
    // Before the file is created
    config.validate()?;
    layer(FileStore::open(path)?, config)
}
