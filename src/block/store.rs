//! Block store
//!
//! Fixed-size block view over a byte store, with insertion and deletion that
//! shift the following blocks in place.

use std::sync::Arc;

use tracing::debug;

use crate::error::{Result, StoreError};
use crate::store::{check_slice, ByteStore, ReadOutcome, MAX_POSITION};

use super::{BlockListener, ListenerId, ListenerSet};

/// Bytes moved per read/write pair while shifting
const SHIFT_CHUNK: usize = 64 * 1024;

/// Block-addressed overlay on a [`ByteStore`].
///
/// Block `i` occupies bytes `[i * block_size, (i + 1) * block_size)`; a
/// trailing partial block is not counted. Blocks are a view computed from
/// offsets, so inserting or deleting blocks moves every byte after the
/// affected index.
pub struct BlockStore<S> {
    inner: S,
    block_size: usize,
    listeners: ListenerSet,

    /// Staging buffer for shifts
    scratch: Vec<u8>,
}

impl<S: ByteStore> BlockStore<S> {
    /// Wrap `inner` with blocks of `block_size` bytes
    pub fn new(inner: S, block_size: usize) -> Result<Self> {
        if block_size == 0 {
            return Err(StoreError::invalid("block_size must be positive"));
        }
        Ok(Self {
            inner,
            block_size,
            listeners: ListenerSet::new(),
            scratch: Vec::new(),
        })
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Number of complete blocks
    pub fn block_count(&self) -> Result<u64> {
        Ok(self.inner.len()? / self.block_size as u64)
    }

    /// Largest block count the store can address
    pub fn max_block_count(&self) -> u64 {
        MAX_POSITION / self.block_size as u64
    }

    /// The wrapped store
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Unwrap, dropping the listeners
    pub fn into_inner(self) -> S {
        self.inner
    }

    // =========================================================================
    // Block I/O
    // =========================================================================

    /// Fill `buf` from block `block` starting `offset` bytes into it
    pub fn read_block(&mut self, block: u64, offset: usize, buf: &mut [u8]) -> Result<()> {
        let start = self.locate(block, offset, buf.len())?;
        self.inner.set_position(start)?;
        self.inner.read_fully(buf)
    }

    /// Read into `buf[index..index + len]`
    pub fn read_block_range(
        &mut self,
        block: u64,
        offset: usize,
        buf: &mut [u8],
        index: usize,
        len: usize,
    ) -> Result<()> {
        check_slice(buf.len(), index, len)?;
        self.read_block(block, offset, &mut buf[index..index + len])
    }

    /// Write `buf` into block `block` starting `offset` bytes into it
    pub fn write_block(&mut self, block: u64, offset: usize, buf: &[u8]) -> Result<()> {
        let start = self.locate(block, offset, buf.len())?;
        self.inner.set_position(start)?;
        self.inner.write(buf)
    }

    /// Write `buf[index..index + len]`
    pub fn write_block_range(
        &mut self,
        block: u64,
        offset: usize,
        buf: &[u8],
        index: usize,
        len: usize,
    ) -> Result<()> {
        check_slice(buf.len(), index, len)?;
        self.write_block(block, offset, &buf[index..index + len])
    }

    /// Absolute offset of a transfer, after bounds checks
    fn locate(&self, block: u64, offset: usize, len: usize) -> Result<u64> {
        let block_count = self.block_count()?;
        if block >= block_count {
            return Err(StoreError::out_of_range(format!(
                "block {} out of range (block count {})",
                block, block_count
            )));
        }
        if offset >= self.block_size {
            return Err(StoreError::out_of_range(format!(
                "offset {} out of range for block size {}",
                offset, self.block_size
            )));
        }
        if len > self.block_size - offset {
            return Err(StoreError::out_of_range(format!(
                "transfer of {} bytes at offset {} crosses the end of a {}-byte block",
                len, offset, self.block_size
            )));
        }
        Ok(block * self.block_size as u64 + offset as u64)
    }

    // =========================================================================
    // Structural Changes
    // =========================================================================

    /// Insert `count` blocks before block `index`.
    ///
    /// Blocks from `index` on move up by `count`; the new blocks hold
    /// unspecified bytes. Listeners are notified after the shift.
    pub fn insert_blocks(&mut self, index: u64, count: u64) -> Result<()> {
        let block_count = self.block_count()?;
        if count == 0 {
            return Err(StoreError::invalid("block count to insert must be positive"));
        }
        if index > block_count {
            return Err(StoreError::out_of_range(format!(
                "insert index {} exceeds block count {}",
                index, block_count
            )));
        }
        if count > self.max_block_count() - block_count {
            return Err(StoreError::invalid(format!(
                "inserting {} blocks into {} exceeds the maximum of {}",
                count,
                block_count,
                self.max_block_count()
            )));
        }

        let block_size = self.block_size as u64;
        let old_len = self.inner.len()?;
        let distance = count * block_size;
        let start = index * block_size;

        self.inner.set_len(old_len + distance)?;
        self.shift_up(start, old_len, distance)?;
        debug!(index, count, block_size, moved = old_len - start, "inserted blocks");

        self.listeners.notify_inserted(index, count)
    }

    /// Remove `count` blocks starting at block `index`.
    ///
    /// Blocks after the removed range move down by `count`. Listeners are
    /// notified after the store has been truncated.
    pub fn delete_blocks(&mut self, index: u64, count: u64) -> Result<()> {
        let block_count = self.block_count()?;
        if count == 0 {
            return Err(StoreError::invalid("block count to delete must be positive"));
        }
        match index.checked_add(count) {
            Some(end) if end <= block_count => {}
            _ => {
                return Err(StoreError::out_of_range(format!(
                    "deleting {} blocks at {} exceeds block count {}",
                    count, index, block_count
                )))
            }
        }

        let block_size = self.block_size as u64;
        let old_len = self.inner.len()?;
        let distance = count * block_size;
        let start = (index + count) * block_size;

        self.shift_down(start, old_len, distance)?;
        self.inner.set_len(old_len - distance)?;
        debug!(index, count, block_size, moved = old_len - start, "deleted blocks");

        self.listeners.notify_deleted(index, count)
    }

    /// Move `[start, end)` up by `distance`, highest chunk first so no source
    /// byte is overwritten before it is copied
    fn shift_up(&mut self, start: u64, end: u64, distance: u64) -> Result<()> {
        let mut chunk_end = end;
        while chunk_end > start {
            let chunk_start = chunk_end.saturating_sub(SHIFT_CHUNK as u64).max(start);
            self.copy_chunk(chunk_start, chunk_end, chunk_start + distance)?;
            chunk_end = chunk_start;
        }
        Ok(())
    }

    /// Move `[start, end)` down by `distance`, lowest chunk first
    fn shift_down(&mut self, start: u64, end: u64, distance: u64) -> Result<()> {
        let mut chunk_start = start;
        while chunk_start < end {
            let chunk_end = (chunk_start + SHIFT_CHUNK as u64).min(end);
            self.copy_chunk(chunk_start, chunk_end, chunk_start - distance)?;
            chunk_start = chunk_end;
        }
        Ok(())
    }

    fn copy_chunk(&mut self, from: u64, to_end: u64, dest: u64) -> Result<()> {
        let n = (to_end - from) as usize;
        self.scratch.resize(n, 0);
        self.inner.set_position(from)?;
        self.inner.read_fully(&mut self.scratch[..n])?;
        self.inner.set_position(dest)?;
        self.inner.write(&self.scratch[..n])
    }

    // =========================================================================
    // Listener Registry
    // =========================================================================

    /// Register a listener, notified after all earlier registrations
    pub fn add_listener(&mut self, listener: Arc<dyn BlockListener>) -> ListenerId {
        self.listeners.add(listener)
    }

    /// Unregister; returns false if `id` was not registered
    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }

    /// Registered listeners, in notification order
    pub fn listeners(&self) -> Vec<Arc<dyn BlockListener>> {
        self.listeners.listeners()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

impl<S: ByteStore> ByteStore for BlockStore<S> {
    fn len(&self) -> Result<u64> {
        self.inner.len()
    }

    fn set_len(&mut self, len: u64) -> Result<()> {
        self.inner.set_len(len)
    }

    fn position(&self) -> Result<u64> {
        self.inner.position()
    }

    fn set_position(&mut self, pos: u64) -> Result<()> {
        self.inner.set_position(pos)
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<ReadOutcome> {
        self.inner.read(buf)
    }

    fn write(&mut self, buf: &[u8]) -> Result<()> {
        self.inner.write(buf)
    }

    fn flush(&mut self) -> Result<()> {
        self.inner.flush()
    }

    fn close(&mut self) -> Result<()> {
        self.inner.close()
    }

    fn is_closed(&self) -> bool {
        self.inner.is_closed()
    }
}
