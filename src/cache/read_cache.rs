//! Read-ahead cache
//!
//! Decorator that prefetches a window of bytes on each miss and serves
//! following reads from memory while they stay inside it.

use std::io;

use tracing::trace;

use crate::config::DEFAULT_WINDOW_SIZE;
use crate::error::{Result, StoreError};
use crate::store::{check_position, end_of, ensure_open, ByteStore, ReadOutcome};

use super::Region;

/// The materialized prefetch buffer
#[derive(Debug, Default)]
struct CacheWindow {
    /// Store offset of `bytes[0]`
    offset: u64,

    bytes: Vec<u8>,

    /// Number of leading `bytes` that mirror the store
    valid: usize,
}

impl CacheWindow {
    fn region(&self) -> Region {
        Region::new(self.offset, self.valid as u64)
    }

    fn invalidate(&mut self) {
        self.valid = 0;
    }
}

/// Hit and miss counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Reads served entirely from the window
    pub hits: u64,

    /// Reads that refilled the window from the wrapped store
    pub misses: u64,
}

/// Read-ahead decorator over any [`ByteStore`].
///
/// A read fully covered by the window is served from memory. Otherwise one
/// underlying read of at most `window_size` bytes, anchored at the cursor,
/// replaces the window. Writes go straight through and patch the window
/// where they overlap it, so reads never observe stale bytes.
pub struct ReadCache<S> {
    inner: S,
    window_size: usize,
    window: CacheWindow,

    /// Fill target for misses; swapped with the window on success
    spare: Vec<u8>,

    position: u64,
    closed: bool,
    stats: CacheStats,
}

impl<S: ByteStore> ReadCache<S> {
    /// Wrap `inner` with a window of `window_size` bytes
    pub fn new(inner: S, window_size: usize) -> Result<Self> {
        if window_size == 0 {
            return Err(StoreError::invalid("window_size must be positive"));
        }
        let position = inner.position()?;
        Ok(Self {
            inner,
            window_size,
            window: CacheWindow::default(),
            spare: Vec::with_capacity(window_size),
            position,
            closed: false,
            stats: CacheStats::default(),
        })
    }

    /// Wrap `inner` with the default window size
    pub fn with_default_window(inner: S) -> Result<Self> {
        Self::new(inner, DEFAULT_WINDOW_SIZE)
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    /// Region currently held in memory, if any
    pub fn cached_region(&self) -> Option<Region> {
        let region = self.window.region();
        (!region.is_empty()).then_some(region)
    }

    /// Drop the window; the next read refills it
    pub fn invalidate(&mut self) {
        self.window.invalidate();
    }

    /// The wrapped store
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Unwrap, discarding the window
    pub fn into_inner(self) -> S {
        self.inner
    }

    /// Refill the window from `at`, leaving it untouched on failure
    fn fill_window(&mut self, at: u64, length: u64) -> Result<()> {
        let fetch = (self.window_size as u64).min(length - at) as usize;
        self.spare.resize(fetch, 0);

        self.inner.set_position(at)?;
        let n = match self.inner.read(&mut self.spare[..fetch])? {
            ReadOutcome::Read(n) if n > 0 => n,
            _ => {
                return Err(StoreError::io(
                    io::ErrorKind::UnexpectedEof,
                    format!("wrapped store returned no data at {} before length {}", at, length),
                ))
            }
        };

        std::mem::swap(&mut self.window.bytes, &mut self.spare);
        self.window.offset = at;
        self.window.valid = n;
        self.stats.misses += 1;
        trace!(offset = at, bytes = n, "read cache miss");
        Ok(())
    }

    /// Copy the part of a write that lands inside the window
    fn patch_window(&mut self, written: Region, data: &[u8]) {
        if let Some(overlap) = self.window.region().overlap(&written) {
            let src = (overlap.offset - written.offset) as usize;
            let dst = (overlap.offset - self.window.offset) as usize;
            let n = overlap.len as usize;
            self.window.bytes[dst..dst + n].copy_from_slice(&data[src..src + n]);
        }
    }
}

impl<S: ByteStore> ByteStore for ReadCache<S> {
    fn len(&self) -> Result<u64> {
        ensure_open(self.closed)?;
        self.inner.len()
    }

    fn set_len(&mut self, len: u64) -> Result<()> {
        ensure_open(self.closed)?;
        self.inner.set_len(len)?;
        if len < self.window.region().end() {
            self.window.invalidate();
        }
        self.position = self.position.min(len);
        Ok(())
    }

    fn position(&self) -> Result<u64> {
        ensure_open(self.closed)?;
        Ok(self.position)
    }

    fn set_position(&mut self, pos: u64) -> Result<()> {
        ensure_open(self.closed)?;
        check_position(pos)?;
        self.position = pos;
        Ok(())
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<ReadOutcome> {
        ensure_open(self.closed)?;
        let length = self.inner.len()?;
        if self.position >= length {
            return Ok(ReadOutcome::Eof);
        }
        if buf.is_empty() {
            return Ok(ReadOutcome::Read(0));
        }

        let want = (buf.len() as u64).min(length - self.position) as usize;
        let request = Region::new(self.position, want as u64);
        if self.window.region().covers(&request) {
            self.stats.hits += 1;
            trace!(offset = self.position, bytes = want, "read cache hit");
        } else {
            self.fill_window(self.position, length)?;
        }

        let start = (self.position - self.window.offset) as usize;
        let n = want.min(self.window.valid - start);
        buf[..n].copy_from_slice(&self.window.bytes[start..start + n]);
        self.position += n as u64;
        Ok(ReadOutcome::Read(n))
    }

    fn write(&mut self, buf: &[u8]) -> Result<()> {
        ensure_open(self.closed)?;
        if buf.is_empty() {
            return Ok(());
        }

        let end = end_of(self.position, buf.len())?;
        self.inner.set_position(self.position)?;
        if let Err(e) = self.inner.write(buf) {
            // The wrapped store may hold part of the write
            self.window.invalidate();
            return Err(e);
        }

        self.patch_window(Region::new(self.position, buf.len() as u64), buf);
        self.position = end;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        ensure_open(self.closed)?;
        self.inner.flush()
    }

    fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.inner.close()?;
        self.closed = true;
        self.window = CacheWindow::default();
        self.spare = Vec::new();
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closed
    }
}
