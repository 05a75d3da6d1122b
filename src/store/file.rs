//! File-backed store
//!
//! Leaf over an OS file handle with random-access reads and writes.

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Result, StoreError};

use super::{check_position, end_of, ByteStore, ReadOutcome};

/// Byte store over a single file on disk.
///
/// The file length is cached at open time and kept current by this
/// instance's own writes and resizes; the file must not be resized by anyone
/// else while the store is open.
pub struct FileStore {
    /// `None` once closed
    file: Option<File>,

    path: PathBuf,

    /// Cached file length
    length: u64,

    position: u64,
}

impl FileStore {
    /// Create (or truncate) a file for reading and writing
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path.as_ref())?;
        Self::from_file(file, path.as_ref())
    }

    /// Open a file for reading and writing, creating it if absent
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path.as_ref())?;
        Self::from_file(file, path.as_ref())
    }

    /// Open an existing file for reading only. Writes fail with the OS error.
    pub fn open_read_only(path: impl AsRef<Path>) -> Result<Self> {
        let file = OpenOptions::new().read(true).open(path.as_ref())?;
        Self::from_file(file, path.as_ref())
    }

    fn from_file(file: File, path: &Path) -> Result<Self> {
        let length = file.metadata()?.len();
        debug!(path = %path.display(), length, "opened file store");
        Ok(Self {
            file: Some(file),
            path: path.to_path_buf(),
            length,
            position: 0,
        })
    }

    /// Path this store was opened from
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn ensure_open(&self) -> Result<()> {
        if self.file.is_none() {
            return Err(StoreError::Closed);
        }
        Ok(())
    }
}

impl ByteStore for FileStore {
    fn len(&self) -> Result<u64> {
        self.ensure_open()?;
        Ok(self.length)
    }

    fn set_len(&mut self, len: u64) -> Result<()> {
        check_position(len)?;
        let file = self.file.as_mut().ok_or(StoreError::Closed)?;
        file.set_len(len)?;
        self.length = len;
        self.position = self.position.min(len);
        Ok(())
    }

    fn position(&self) -> Result<u64> {
        self.ensure_open()?;
        Ok(self.position)
    }

    fn set_position(&mut self, pos: u64) -> Result<()> {
        self.ensure_open()?;
        check_position(pos)?;
        self.position = pos;
        Ok(())
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<ReadOutcome> {
        let file = self.file.as_mut().ok_or(StoreError::Closed)?;
        if self.position >= self.length {
            return Ok(ReadOutcome::Eof);
        }

        let want = (buf.len() as u64).min(self.length - self.position) as usize;
        file.seek(SeekFrom::Start(self.position))?;
        let n = loop {
            match file.read(&mut buf[..want]) {
                Ok(n) => break n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        };

        // File shorter than the cached length: nothing left to give
        if n == 0 && want > 0 {
            return Ok(ReadOutcome::Eof);
        }
        self.position += n as u64;
        Ok(ReadOutcome::Read(n))
    }

    fn write(&mut self, buf: &[u8]) -> Result<()> {
        let file = self.file.as_mut().ok_or(StoreError::Closed)?;
        if buf.is_empty() {
            return Ok(());
        }

        let end = end_of(self.position, buf.len())?;
        file.seek(SeekFrom::Start(self.position))?;
        file.write_all(buf)?;
        self.position = end;
        self.length = self.length.max(end);
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        let file = self.file.as_mut().ok_or(StoreError::Closed)?;
        file.flush()?;
        file.sync_data()?;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        if self.file.take().is_some() {
            debug!(path = %self.path.display(), length = self.length, "closed file store");
        }
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.file.is_none()
    }
}
