//! Tests for WriteCoalescer
//!
//! These tests verify:
//! - Contiguous writes merge without underlying I/O
//! - Non-contiguous or oversized writes flush first
//! - Read-your-write before any flush
//! - Flush / close / drop push buffered bytes down
//! - Failed flushes keep the buffer dirty

use std::fs;

use blockio::cache::Region;
use blockio::{ByteStore, FileStore, MemoryStore, ReadOutcome, StoreError, WriteCoalescer};
use tempfile::TempDir;

use crate::common::{pattern, read_back, ProbeStore};

// =============================================================================
// Merge Tests
// =============================================================================

#[test]
fn test_contiguous_writes_merge_into_one_flush() {
    let (inner, probe) = ProbeStore::new(Vec::new());
    let mut coalescer = WriteCoalescer::new(inner, 100).unwrap();
    let data = pattern(100);

    for chunk in data.chunks(10) {
        coalescer.write(chunk).unwrap();
    }
    assert_eq!(probe.writes(), 0);
    assert!(coalescer.is_dirty());
    assert_eq!(coalescer.pending_region(), Some(Region::new(0, 100)));

    coalescer.flush().unwrap();
    assert_eq!(probe.writes(), 1);
    assert!(!coalescer.is_dirty());
    assert_eq!(coalescer.inner().as_bytes(), &data[..]);
}

#[test]
fn test_overwrite_inside_buffer_merges() {
    let (inner, probe) = ProbeStore::new(Vec::new());
    let mut coalescer = WriteCoalescer::new(inner, 64).unwrap();

    coalescer.write(b"0123456789").unwrap();
    coalescer.write_at(3, b"ab").unwrap();

    assert_eq!(probe.writes(), 0);
    assert_eq!(read_back(&mut coalescer, 0, 10), b"012ab56789");
}

#[test]
fn test_non_contiguous_write_flushes_previous_buffer() {
    let (inner, probe) = ProbeStore::new(Vec::new());
    let mut coalescer = WriteCoalescer::new(inner, 64).unwrap();

    coalescer.write_at(0, &[1; 10]).unwrap();
    coalescer.write_at(500, &[2; 10]).unwrap();

    assert_eq!(probe.writes(), 1);
    assert_eq!(coalescer.inner().as_bytes(), &[1u8; 10]);
    assert_eq!(coalescer.pending_region(), Some(Region::new(500, 10)));
    assert_eq!(coalescer.len().unwrap(), 510);

    // Gap between the flushed bytes and the pending buffer reads as zero
    assert_eq!(read_back(&mut coalescer, 8, 4), vec![1u8, 1, 0, 0]);
    assert_eq!(read_back(&mut coalescer, 498, 4), vec![0u8, 0, 2, 2]);
}

#[test]
fn test_merge_exceeding_capacity_flushes_then_restarts() {
    let (inner, probe) = ProbeStore::new(Vec::new());
    let mut coalescer = WriteCoalescer::new(inner, 16).unwrap();

    coalescer.write(&[1; 10]).unwrap();
    coalescer.write(&[2; 10]).unwrap();

    assert_eq!(probe.writes(), 1);
    assert_eq!(coalescer.pending_region(), Some(Region::new(10, 10)));
    assert_eq!(read_back(&mut coalescer, 0, 20), [[1u8; 10], [2u8; 10]].concat());
}

#[test]
fn test_oversized_write_passes_through() {
    let (inner, probe) = ProbeStore::new(Vec::new());
    let mut coalescer = WriteCoalescer::new(inner, 16).unwrap();

    coalescer.write(&pattern(40)).unwrap();

    assert_eq!(probe.writes(), 1);
    assert!(!coalescer.is_dirty());
    assert_eq!(coalescer.inner().as_bytes(), &pattern(40)[..]);
    assert_eq!(coalescer.position().unwrap(), 40);
}

#[test]
fn test_round_trip_across_capacities() {
    let data = pattern(1000);
    for capacity in [1, 37, 5000] {
        let mut coalescer = WriteCoalescer::new(MemoryStore::new(), capacity).unwrap();
        for chunk in data.chunks(7) {
            coalescer.write(chunk).unwrap();
        }
        assert_eq!(read_back(&mut coalescer, 0, data.len()), data, "capacity {}", capacity);
    }
}

// =============================================================================
// Read-Your-Write Tests
// =============================================================================

#[test]
fn test_read_sees_unflushed_write() {
    let (inner, probe) = ProbeStore::new(pattern(100));
    let mut coalescer = WriteCoalescer::new(inner, 64).unwrap();

    coalescer.write_at(40, b"fresh").unwrap();
    assert_eq!(read_back(&mut coalescer, 40, 5), b"fresh");
    assert_eq!(probe.writes(), 0);
}

#[test]
fn test_read_spanning_buffer_and_store() {
    let (inner, _probe) = ProbeStore::new(pattern(100));
    let mut coalescer = WriteCoalescer::new(inner, 64).unwrap();

    coalescer.write_at(40, &[0xAA; 10]).unwrap();

    let mut expected = pattern(100);
    expected[40..50].copy_from_slice(&[0xAA; 10]);
    assert_eq!(read_back(&mut coalescer, 0, 100), expected);
}

#[test]
fn test_length_includes_buffer_past_end() {
    let (inner, _probe) = ProbeStore::new(pattern(10));
    let mut coalescer = WriteCoalescer::new(inner, 64).unwrap();

    coalescer.write_at(10, &[7; 20]).unwrap();
    assert_eq!(coalescer.len().unwrap(), 30);
    assert_eq!(coalescer.inner().len().unwrap(), 10);
    assert_eq!(coalescer.position().unwrap(), 30);
}

#[test]
fn test_eof_past_buffered_end() {
    let mut coalescer = WriteCoalescer::new(MemoryStore::new(), 64).unwrap();
    let mut buf = [0u8; 4];

    coalescer.write(b"abcd").unwrap();
    assert_eq!(coalescer.read(&mut buf).unwrap(), ReadOutcome::Eof);
    assert_eq!(coalescer.read_at(100, &mut buf).unwrap(), ReadOutcome::Eof);
}

#[test]
fn test_set_len_flushes_then_truncates() {
    let (inner, probe) = ProbeStore::new(Vec::new());
    let mut coalescer = WriteCoalescer::new(inner, 64).unwrap();

    coalescer.write(&pattern(20)).unwrap();
    coalescer.set_len(5).unwrap();

    assert_eq!(probe.writes(), 1);
    assert!(!coalescer.is_dirty());
    assert_eq!(coalescer.len().unwrap(), 5);
    assert_eq!(coalescer.position().unwrap(), 5);
    assert_eq!(coalescer.inner().as_bytes(), &pattern(20)[..5]);
}

// =============================================================================
// Flush / Close Tests
// =============================================================================

#[test]
fn test_failed_flush_keeps_buffer_dirty() {
    let (inner, probe) = ProbeStore::new(Vec::new());
    let mut coalescer = WriteCoalescer::new(inner, 64).unwrap();

    coalescer.write(b"pending").unwrap();
    probe.set_fail_writes(true);

    assert!(matches!(coalescer.flush(), Err(StoreError::Io(_))));
    assert!(coalescer.is_dirty());
    assert_eq!(read_back(&mut coalescer, 0, 7), b"pending");

    probe.set_fail_writes(false);
    coalescer.flush().unwrap();
    assert!(!coalescer.is_dirty());
    assert_eq!(coalescer.inner().as_bytes(), b"pending");
}

#[test]
fn test_close_flushes_and_closes_inner() {
    let (inner, _probe) = ProbeStore::new(Vec::new());
    let mut coalescer = WriteCoalescer::new(inner, 64).unwrap();

    coalescer.write(b"closing").unwrap();
    coalescer.close().unwrap();

    assert!(coalescer.is_closed());
    assert!(coalescer.inner().is_closed());
    assert_eq!(coalescer.inner().as_bytes(), b"closing");
    assert!(matches!(coalescer.write(b"x"), Err(StoreError::Closed)));
}

#[test]
fn test_close_with_failing_flush_stays_open() {
    let (inner, probe) = ProbeStore::new(Vec::new());
    let mut coalescer = WriteCoalescer::new(inner, 64).unwrap();

    coalescer.write(b"stuck").unwrap();
    probe.set_fail_writes(true);

    assert!(coalescer.close().is_err());
    assert!(!coalescer.is_closed());
    assert!(coalescer.is_dirty());

    probe.set_fail_writes(false);
    coalescer.close().unwrap();
    assert_eq!(coalescer.inner().as_bytes(), b"stuck");
}

#[test]
fn test_drop_flushes_pending_bytes() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("dropped.bin");
    {
        let mut coalescer = WriteCoalescer::new(FileStore::create(&path).unwrap(), 64).unwrap();
        coalescer.write(b"written on drop").unwrap();
    }
    assert_eq!(fs::read(&path).unwrap(), b"written on drop");
}

#[test]
fn test_zero_capacity_is_invalid() {
    let result = WriteCoalescer::new(MemoryStore::new(), 0);
    assert!(matches!(result, Err(StoreError::InvalidArgument(_))));
}
