//! Block Module
//!
//! Fixed-size block overlay on a byte store.
//!
//! ## Responsibilities
//! - Bounds-checked block reads and writes
//! - Block insertion and deletion by in-place shifting
//! - Ordered, synchronous notification of structural changes
//!
//! ## Shifting
//! ```text
//! insert(1, 2):  [A][B][C]        ──▶  [A][?][?][B][C]
//!                    └──┴── copied high → low
//! delete(1, 2):  [A][?][?][B][C]  ──▶  [A][B][C]
//!                          └──┴── copied low → high
//! ```

mod listener;
mod store;

pub use listener::{BlockListener, ListenerId, ListenerSet};
pub use store::BlockStore;
