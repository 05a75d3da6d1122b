//! Tests for bounds-checked block reads and writes

use blockio::{BlockStore, ByteStore, MemoryStore, StoreError};

use crate::common::{block_fill, pattern};

// =============================================================================
// Helper Functions
// =============================================================================

fn store_with_blocks(block_size: usize, blocks: u64) -> BlockStore<MemoryStore> {
    let mut contents = Vec::new();
    for block in 0..blocks {
        contents.extend(block_fill(block, block_size));
    }
    BlockStore::new(MemoryStore::with_contents(contents), block_size).unwrap()
}

// =============================================================================
// Geometry Tests
// =============================================================================

#[test]
fn test_block_count_ignores_partial_tail() {
    let store = BlockStore::new(MemoryStore::with_contents(pattern(50)), 16).unwrap();
    assert_eq!(store.block_size(), 16);
    assert_eq!(store.block_count().unwrap(), 3);
    assert_eq!(store.len().unwrap(), 50);
}

#[test]
fn test_zero_block_size_is_invalid() {
    let result = BlockStore::new(MemoryStore::new(), 0);
    assert!(matches!(result, Err(StoreError::InvalidArgument(_))));
}

#[test]
fn test_max_block_count() {
    let store = BlockStore::new(MemoryStore::new(), 512).unwrap();
    assert_eq!(store.max_block_count(), (i64::MAX as u64) / 512);
}

// =============================================================================
// Block I/O Tests
// =============================================================================

#[test]
fn test_read_whole_block() {
    let mut store = store_with_blocks(16, 4);
    let mut buf = [0u8; 16];

    store.read_block(2, 0, &mut buf).unwrap();
    assert_eq!(&buf[..], &block_fill(2, 16)[..]);
}

#[test]
fn test_write_then_read_inside_block() {
    let mut store = store_with_blocks(16, 4);
    let mut buf = [0u8; 4];

    store.write_block(1, 10, b"wxyz").unwrap();
    store.read_block(1, 10, &mut buf).unwrap();
    assert_eq!(&buf, b"wxyz");

    // Neighbours untouched
    let mut whole = [0u8; 16];
    store.read_block(2, 0, &mut whole).unwrap();
    assert_eq!(&whole[..], &block_fill(2, 16)[..]);
}

#[test]
fn test_range_variants_use_buffer_window() {
    let mut store = store_with_blocks(16, 2);
    let source = *b"..abcd..";

    store.write_block_range(0, 4, &source, 2, 4).unwrap();

    let mut target = [0u8; 8];
    store.read_block_range(0, 4, &mut target, 1, 4).unwrap();
    assert_eq!(&target, b"\0abcd\0\0\0");

    let result = store.read_block_range(0, 0, &mut target, 6, 4);
    assert!(matches!(result, Err(StoreError::OutOfRange(_))));
}

// =============================================================================
// Bounds Tests
// =============================================================================

#[test]
fn test_block_index_out_of_range() {
    let mut store = store_with_blocks(16, 4);
    let mut buf = [0u8; 1];

    assert!(matches!(store.read_block(4, 0, &mut buf), Err(StoreError::OutOfRange(_))));
    assert!(matches!(store.write_block(u64::MAX, 0, &buf), Err(StoreError::OutOfRange(_))));
}

#[test]
fn test_offset_out_of_range() {
    let mut store = store_with_blocks(16, 4);
    let mut buf = [0u8; 1];
    assert!(matches!(store.read_block(0, 16, &mut buf), Err(StoreError::OutOfRange(_))));
}

#[test]
fn test_transfer_crossing_block_end_is_rejected() {
    let mut store = store_with_blocks(16, 4);
    let buf = [0u8; 8];

    let result = store.write_block(0, 10, &buf);
    assert!(matches!(result, Err(StoreError::OutOfRange(_))));

    // Nothing written
    let mut check = [0u8; 16];
    store.read_block(1, 0, &mut check).unwrap();
    assert_eq!(&check[..], &block_fill(1, 16)[..]);
}

#[test]
fn test_partial_tail_is_not_addressable() {
    let mut store = BlockStore::new(MemoryStore::with_contents(pattern(24)), 16).unwrap();
    let mut buf = [0u8; 4];
    assert!(matches!(store.read_block(1, 0, &mut buf), Err(StoreError::OutOfRange(_))));
}
