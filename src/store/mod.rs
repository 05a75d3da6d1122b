//! Store Module
//!
//! The random-access byte contract shared by every leaf and decorator.
//!
//! ## Responsibilities
//! - Cursor-based reads and writes over a resizable byte medium
//! - Partial-read contract: `read` may return fewer bytes than asked
//! - Bulk transfer to and from generic `std::io` streams
//! - Terminal `close()`: every later call fails with `StoreError::Closed`
//!
//! ## Leaves
//! ```text
//! ┌──────────────┐   ┌──────────────┐
//! │ MemoryStore  │   │  FileStore   │
//! │  (Vec<u8>)   │   │ (fs::File)   │
//! └──────────────┘   └──────────────┘
//! ```

mod memory;
mod file;
mod shared;

pub use memory::MemoryStore;
pub use file::FileStore;
pub use shared::SharedStore;

use std::io::{self, Read, Write};

use crate::error::{Result, StoreError};

/// Largest legal position or length (the OS file-offset limit)
pub const MAX_POSITION: u64 = i64::MAX as u64;

/// Chunk size used by the bulk stream transfers
const TRANSFER_CHUNK: usize = 8 * 1024;

/// Outcome of a single `read` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadOutcome {
    /// This many bytes were transferred and the cursor advanced by as much
    Read(usize),

    /// The cursor was at or past the end; nothing was transferred
    Eof,
}

impl ReadOutcome {
    /// Bytes transferred (zero for `Eof`)
    pub fn bytes(self) -> usize {
        match self {
            ReadOutcome::Read(n) => n,
            ReadOutcome::Eof => 0,
        }
    }

    pub fn is_eof(self) -> bool {
        matches!(self, ReadOutcome::Eof)
    }
}

/// Random-access byte storage with a per-instance cursor.
///
/// Implemented by the leaves in this module and by every decorator, so stores
/// compose by wrapping. All mutating calls take `&mut self`: an instance has
/// exactly one logical owner at a time.
pub trait ByteStore {
    /// Current length in bytes
    fn len(&self) -> Result<u64>;

    /// Truncate or extend to `len` bytes.
    ///
    /// Extension fills with unspecified bytes. A cursor beyond the new length
    /// is clamped to it.
    fn set_len(&mut self, len: u64) -> Result<()>;

    /// Current cursor
    fn position(&self) -> Result<u64>;

    /// Move the cursor. Positions past the end are allowed and do not change
    /// the length.
    fn set_position(&mut self, pos: u64) -> Result<()>;

    /// Read up to `buf.len()` bytes at the cursor.
    ///
    /// Returns `Eof` without moving the cursor when it is at or beyond the
    /// end. May transfer fewer bytes than requested before the end; callers
    /// that need a full buffer loop (see [`ByteStore::read_fully`]).
    fn read(&mut self, buf: &mut [u8]) -> Result<ReadOutcome>;

    /// Write all of `buf` at the cursor, extending the length if needed.
    fn write(&mut self, buf: &[u8]) -> Result<()>;

    /// Push any buffered state down to the medium
    fn flush(&mut self) -> Result<()>;

    /// Release the medium. Terminal.
    fn close(&mut self) -> Result<()>;

    fn is_closed(&self) -> bool;

    fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Read into `buf[off..off + len]`
    fn read_range(&mut self, buf: &mut [u8], off: usize, len: usize) -> Result<ReadOutcome> {
        check_slice(buf.len(), off, len)?;
        self.read(&mut buf[off..off + len])
    }

    /// Write `buf[off..off + len]`
    fn write_range(&mut self, buf: &[u8], off: usize, len: usize) -> Result<()> {
        check_slice(buf.len(), off, len)?;
        self.write(&buf[off..off + len])
    }

    /// Move the cursor to `pos`, then read
    fn read_at(&mut self, pos: u64, buf: &mut [u8]) -> Result<ReadOutcome> {
        self.set_position(pos)?;
        self.read(buf)
    }

    /// Move the cursor to `pos`, then write
    fn write_at(&mut self, pos: u64, buf: &[u8]) -> Result<()> {
        self.set_position(pos)?;
        self.write(buf)
    }

    /// Read until `buf` is full, looping over partial reads.
    ///
    /// Fails with `UnexpectedEof` if the end is reached first.
    fn read_fully(&mut self, buf: &mut [u8]) -> Result<()> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.read(&mut buf[filled..])? {
                ReadOutcome::Read(n) if n > 0 => filled += n,
                _ => {
                    return Err(StoreError::io(
                        io::ErrorKind::UnexpectedEof,
                        format!("store ended after {} of {} bytes", filled, buf.len()),
                    ))
                }
            }
        }
        Ok(())
    }

    /// Copy everything from the cursor to the end into `sink`.
    ///
    /// The sink is flushed but not closed. Returns the number of bytes copied.
    fn read_into(&mut self, sink: &mut dyn Write) -> Result<u64> {
        let mut chunk = vec![0u8; TRANSFER_CHUNK];
        let mut total = 0u64;
        loop {
            match self.read(&mut chunk)? {
                ReadOutcome::Eof => break,
                ReadOutcome::Read(0) => break,
                ReadOutcome::Read(n) => {
                    sink.write_all(&chunk[..n])?;
                    total += n as u64;
                }
            }
        }
        sink.flush()?;
        Ok(total)
    }

    /// Write everything `source` yields at the cursor.
    ///
    /// The source is consumed to its end but not closed. Returns the number
    /// of bytes written.
    fn write_from(&mut self, source: &mut dyn Read) -> Result<u64> {
        let mut chunk = vec![0u8; TRANSFER_CHUNK];
        let mut total = 0u64;
        loop {
            let n = match source.read(&mut chunk) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            };
            self.write(&chunk[..n])?;
            total += n as u64;
        }
        Ok(total)
    }
}

impl<S: ByteStore + ?Sized> ByteStore for Box<S> {
    fn len(&self) -> Result<u64> {
        (**self).len()
    }

    fn set_len(&mut self, len: u64) -> Result<()> {
        (**self).set_len(len)
    }

    fn position(&self) -> Result<u64> {
        (**self).position()
    }

    fn set_position(&mut self, pos: u64) -> Result<()> {
        (**self).set_position(pos)
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<ReadOutcome> {
        (**self).read(buf)
    }

    fn write(&mut self, buf: &[u8]) -> Result<()> {
        (**self).write(buf)
    }

    fn flush(&mut self) -> Result<()> {
        (**self).flush()
    }

    fn close(&mut self) -> Result<()> {
        (**self).close()
    }

    fn is_closed(&self) -> bool {
        (**self).is_closed()
    }
}

// =============================================================================
// Shared Argument Checks
// =============================================================================

/// Reject positions and lengths above `MAX_POSITION`
pub(crate) fn check_position(pos: u64) -> Result<()> {
    if pos > MAX_POSITION {
        return Err(StoreError::invalid(format!(
            "position {} exceeds maximum {}",
            pos, MAX_POSITION
        )));
    }
    Ok(())
}

/// End offset of a transfer of `len` bytes at `pos`
pub(crate) fn end_of(pos: u64, len: usize) -> Result<u64> {
    match pos.checked_add(len as u64) {
        Some(end) if end <= MAX_POSITION => Ok(end),
        _ => Err(StoreError::invalid(format!(
            "transfer of {} bytes at {} exceeds maximum position {}",
            len, pos, MAX_POSITION
        ))),
    }
}

/// Reject `off..off + len` windows that fall outside a buffer of `buf_len`
pub(crate) fn check_slice(buf_len: usize, off: usize, len: usize) -> Result<()> {
    match off.checked_add(len) {
        Some(end) if end <= buf_len => Ok(()),
        _ => Err(StoreError::out_of_range(format!(
            "range {}+{} exceeds buffer of {} bytes",
            off, len, buf_len
        ))),
    }
}

pub(crate) fn ensure_open(closed: bool) -> Result<()> {
    if closed {
        return Err(StoreError::Closed);
    }
    Ok(())
}
