//! In-memory store
//!
//! `Vec<u8>`-backed leaf. Never blocks and always fills reads up to the end.

use crate::error::{Result, StoreError};

use super::{check_position, end_of, ensure_open, ByteStore, ReadOutcome};

/// Byte store held entirely in memory
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    data: Vec<u8>,
    position: u64,
    closed: bool,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding `data`, cursor at 0
    pub fn with_contents(data: Vec<u8>) -> Self {
        Self {
            data,
            position: 0,
            closed: false,
        }
    }

    /// Current contents. Still available after `close()`.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Consume the store, returning its contents
    pub fn into_inner(self) -> Vec<u8> {
        self.data
    }
}

/// Convert a store offset into a vector index
fn to_index(value: u64) -> Result<usize> {
    usize::try_from(value).map_err(|_| {
        StoreError::invalid(format!("offset {} is not addressable in memory", value))
    })
}

impl ByteStore for MemoryStore {
    fn len(&self) -> Result<u64> {
        ensure_open(self.closed)?;
        Ok(self.data.len() as u64)
    }

    fn set_len(&mut self, len: u64) -> Result<()> {
        ensure_open(self.closed)?;
        check_position(len)?;
        self.data.resize(to_index(len)?, 0);
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
        let len = self.data.len() as u64;
        if self.position >= len {
            return Ok(ReadOutcome::Eof);
        }

        let start = self.position as usize;
        let n = buf.len().min(self.data.len() - start);
        buf[..n].copy_from_slice(&self.data[start..start + n]);
        self.position += n as u64;
        Ok(ReadOutcome::Read(n))
    }

    fn write(&mut self, buf: &[u8]) -> Result<()> {
        ensure_open(self.closed)?;
        if buf.is_empty() {
            return Ok(());
        }

        let end = end_of(self.position, buf.len())?;
        let start = to_index(self.position)?;
        let end_index = to_index(end)?;
        if end_index > self.data.len() {
            // Bytes between the old end and `start` read back as zero
            self.data.resize(end_index, 0);
        }
        self.data[start..end_index].copy_from_slice(buf);
        self.position = end;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        ensure_open(self.closed)
    }

    fn close(&mut self) -> Result<()> {
        self.closed = true;
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closed
    }
}
