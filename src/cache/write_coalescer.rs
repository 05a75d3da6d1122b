//! Write coalescer
//!
//! Write-behind decorator that merges contiguous small writes into one
//! buffer and pushes it down as a single write.

use bytes::BytesMut;
use tracing::{debug, trace, warn};

use crate::config::DEFAULT_BUFFER_CAPACITY;
use crate::error::{Result, StoreError};
use crate::store::{check_position, end_of, ensure_open, ByteStore, ReadOutcome};

use super::Region;

/// Bytes accepted but not yet written to the wrapped store
#[derive(Debug, Default)]
struct CoalesceBuffer {
    offset: u64,
    bytes: BytesMut,
    dirty: bool,
}

impl CoalesceBuffer {
    /// Buffered range; empty when clean
    fn region(&self) -> Region {
        if self.dirty {
            Region::new(self.offset, self.bytes.len() as u64)
        } else {
            Region::new(self.offset, 0)
        }
    }

    /// A write at `at` starts inside the buffer or exactly at its end
    fn is_contiguous(&self, at: u64) -> bool {
        self.dirty && at >= self.offset && at <= self.region().end()
    }

    fn start(&mut self, at: u64, data: &[u8]) {
        self.offset = at;
        self.bytes.clear();
        self.bytes.extend_from_slice(data);
        self.dirty = true;
    }

    fn merge(&mut self, at: u64, data: &[u8]) {
        let start = (at - self.offset) as usize;
        let end = start + data.len();
        if end > self.bytes.len() {
            self.bytes.resize(end, 0);
        }
        self.bytes[start..end].copy_from_slice(data);
    }

    fn clear(&mut self) {
        self.bytes.clear();
        self.dirty = false;
    }
}

/// Write-behind decorator over any [`ByteStore`].
///
/// ## Buffering rules
/// - A write starting inside the dirty buffer (or at its end) that keeps it at
///   or under `capacity` bytes is merged without touching the wrapped store
/// - Any other write flushes the buffer first, then starts a new buffer, or
///   goes straight through when it alone exceeds `capacity`
/// - Reads see buffered bytes before they are flushed
///
/// A failed flush leaves the buffer dirty; nothing is retried implicitly.
pub struct WriteCoalescer<S: ByteStore> {
    inner: S,
    capacity: usize,
    buffer: CoalesceBuffer,
    position: u64,
    closed: bool,
}

impl<S: ByteStore> WriteCoalescer<S> {
    /// Wrap `inner` with a buffer of `capacity` bytes
    pub fn new(inner: S, capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(StoreError::invalid("buffer_capacity must be positive"));
        }
        let position = inner.position()?;
        Ok(Self {
            inner,
            capacity,
            buffer: CoalesceBuffer {
                offset: 0,
                bytes: BytesMut::with_capacity(capacity),
                dirty: false,
            },
            position,
            closed: false,
        })
    }

    /// Wrap `inner` with the default buffer capacity
    pub fn with_default_capacity(inner: S) -> Result<Self> {
        Self::new(inner, DEFAULT_BUFFER_CAPACITY)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Whether buffered bytes are waiting for a flush
    pub fn is_dirty(&self) -> bool {
        self.buffer.dirty
    }

    /// Range waiting for a flush, if any
    pub fn pending_region(&self) -> Option<Region> {
        self.buffer.dirty.then(|| self.buffer.region())
    }

    /// The wrapped store. Buffered bytes are not visible through it.
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Write the buffer to the wrapped store and mark it clean
    fn flush_buffer(&mut self) -> Result<()> {
        if !self.buffer.dirty {
            return Ok(());
        }
        self.inner.set_position(self.buffer.offset)?;
        self.inner.write(&self.buffer.bytes)?;
        debug!(
            offset = self.buffer.offset,
            bytes = self.buffer.bytes.len(),
            "flushed coalesce buffer"
        );
        self.buffer.clear();
        Ok(())
    }

    /// Length including buffered bytes past the wrapped store's end
    fn combined_len(&self) -> Result<u64> {
        let inner_len = self.inner.len()?;
        Ok(match self.pending_region() {
            Some(pending) => inner_len.max(pending.end()),
            None => inner_len,
        })
    }

    /// Fill a prefix of `out` with the bytes at `at`.
    ///
    /// Returns the bytes produced and whether the wrapped store came up short.
    fn read_segment(&mut self, at: u64, out: &mut [u8]) -> Result<(usize, bool)> {
        let buffered = self.buffer.region();
        if buffered.contains(at) {
            let start = (at - buffered.offset) as usize;
            let n = out.len().min(self.buffer.bytes.len() - start);
            out[..n].copy_from_slice(&self.buffer.bytes[start..start + n]);
            return Ok((n, false));
        }

        // Stop short of the buffer so its bytes take precedence
        let limit = if self.buffer.dirty && at < buffered.offset {
            (out.len() as u64).min(buffered.offset - at) as usize
        } else {
            out.len()
        };
        let out = &mut out[..limit];

        let inner_len = self.inner.len()?;
        if at >= inner_len {
            // Gap between the wrapped store's end and a buffer placed beyond it
            out.fill(0);
            return Ok((limit, false));
        }

        self.inner.set_position(at)?;
        let n = self.inner.read(out)?.bytes();
        Ok((n, n < limit))
    }
}

impl<S: ByteStore> ByteStore for WriteCoalescer<S> {
    fn len(&self) -> Result<u64> {
        ensure_open(self.closed)?;
        self.combined_len()
    }

    fn set_len(&mut self, len: u64) -> Result<()> {
        ensure_open(self.closed)?;
        check_position(len)?;
        self.flush_buffer()?;
        self.inner.set_len(len)?;
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
        let length = self.combined_len()?;
        if self.position >= length {
            return Ok(ReadOutcome::Eof);
        }

        let want = (buf.len() as u64).min(length - self.position) as usize;
        let mut done = 0;
        while done < want {
            let at = self.position + done as u64;
            let (n, short) = self.read_segment(at, &mut buf[done..want])?;
            done += n;
            if short || n == 0 {
                break;
            }
        }

        self.position += done as u64;
        Ok(ReadOutcome::Read(done))
    }

    fn write(&mut self, buf: &[u8]) -> Result<()> {
        ensure_open(self.closed)?;
        if buf.is_empty() {
            return Ok(());
        }

        let end = end_of(self.position, buf.len())?;
        if self.buffer.is_contiguous(self.position) {
            let merged_end = end.max(self.buffer.region().end());
            if merged_end - self.buffer.offset <= self.capacity as u64 {
                self.buffer.merge(self.position, buf);
                trace!(offset = self.position, bytes = buf.len(), "coalesced write");
                self.position = end;
                return Ok(());
            }
        }

        self.flush_buffer()?;
        if buf.len() > self.capacity {
            self.inner.set_position(self.position)?;
            self.inner.write(buf)?;
            trace!(offset = self.position, bytes = buf.len(), "write passed through");
        } else {
            self.buffer.start(self.position, buf);
        }
        self.position = end;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        ensure_open(self.closed)?;
        self.flush_buffer()?;
        self.inner.flush()
    }

    /// Flush, then close the wrapped store.
    ///
    /// If the flush fails the error is returned and the coalescer stays open
    /// with its buffer dirty.
    fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.flush_buffer()?;
        self.inner.close()?;
        self.closed = true;
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closed
    }
}

impl<S: ByteStore> Drop for WriteCoalescer<S> {
    fn drop(&mut self) {
        if self.closed || !self.buffer.dirty {
            return;
        }
        if let Err(e) = self.flush_buffer() {
            warn!(
                offset = self.buffer.offset,
                bytes = self.buffer.bytes.len(),
                "dropping unflushed coalesce buffer: {}",
                e
            );
        }
    }
}
