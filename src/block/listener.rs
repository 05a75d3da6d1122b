//! Structural-change observers
//!
//! Ordered registry of listeners notified after blocks are inserted or
//! deleted.

use std::fmt;
use std::sync::Arc;

use crate::error::Result;

/// Observer of block insertions and deletions.
///
/// Called synchronously after the bytes have been shifted. A returned error
/// is propagated to the caller of `insert_blocks` / `delete_blocks`.
pub trait BlockListener: Send + Sync {
    /// `count` blocks were inserted at `index`; former block `index + k` is
    /// now block `index + count + k`
    fn blocks_inserted(&self, index: u64, count: u64) -> Result<()>;

    /// `count` blocks were removed at `index`; former block
    /// `index + count + k` is now block `index + k`
    fn blocks_deleted(&self, index: u64, count: u64) -> Result<()>;
}

/// Handle returned by registration, used to unregister
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

/// Listeners in registration order
#[derive(Default)]
pub struct ListenerSet {
    entries: Vec<(ListenerId, Arc<dyn BlockListener>)>,
    next_id: u64,
}

impl ListenerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a listener; it is notified after every listener added before it
    pub fn add(&mut self, listener: Arc<dyn BlockListener>) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.entries.push((id, listener));
        id
    }

    /// Unregister; returns false if `id` was not registered
    pub fn remove(&mut self, id: ListenerId) -> bool {
        match self.entries.iter().position(|(entry_id, _)| *entry_id == id) {
            Some(at) => {
                self.entries.remove(at);
                true
            }
            None => false,
        }
    }

    /// Registered listeners, in notification order
    pub fn listeners(&self) -> Vec<Arc<dyn BlockListener>> {
        self.entries.iter().map(|(_, l)| Arc::clone(l)).collect()
    }

    pub fn ids(&self) -> Vec<ListenerId> {
        self.entries.iter().map(|(id, _)| *id).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    // Notification borrows the set, so membership cannot change mid-flight.

    /// Notify every listener in order, stopping at the first failure
    pub fn notify_inserted(&self, index: u64, count: u64) -> Result<()> {
        for (_, listener) in &self.entries {
            listener.blocks_inserted(index, count)?;
        }
        Ok(())
    }

    /// Notify every listener in order, stopping at the first failure
    pub fn notify_deleted(&self, index: u64, count: u64) -> Result<()> {
        for (_, listener) in &self.entries {
            listener.blocks_deleted(index, count)?;
        }
        Ok(())
    }
}

impl fmt::Debug for ListenerSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerSet")
            .field("ids", &self.ids())
            .finish()
    }
}
