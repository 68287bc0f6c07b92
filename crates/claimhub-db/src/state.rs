//! The follower's published snapshot of the writer state.

use crate::rows::DbStateValue;
use parking_lot::RwLock;
use std::sync::Arc;

/// Single-writer, multi-reader cell holding the last consistent
/// [`DbStateValue`] the follower observed.
///
/// The follower replaces the snapshot wholesale after each successful
/// catch-up; readers clone an `Arc` and never see a partially updated state.
#[derive(Default)]
pub struct StateCell {
    slot: RwLock<Option<Arc<DbStateValue>>>,
}

impl StateCell {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publishes a new snapshot, replacing the previous one.
    pub fn publish(&self, state: DbStateValue) {
        *self.slot.write() = Some(Arc::new(state));
    }

    /// The latest snapshot, if the follower has observed one yet.
    pub fn load(&self) -> Option<Arc<DbStateValue>> {
        self.slot.read().clone()
    }
}
