//! Take-once slot carrying an opportunity selection across a navigation.

use std::sync::Mutex;

use super::OpportunityId;

/// Holds at most one pending selection; reading it empties the slot.
#[derive(Debug, Default)]
pub struct SelectionHandoff(Mutex<Option<OpportunityId>>);

impl SelectionHandoff {
    /// Record `id`, replacing any earlier unread selection.
    pub fn put(&self, id: OpportunityId) {
        match self.0.lock() {
            Ok(mut slot) => *slot = Some(id),
            Err(poisoned) => *poisoned.into_inner() = Some(id),
        }
    }

    /// Take the pending selection, leaving the slot empty.
    pub fn take(&self) -> Option<OpportunityId> {
        match self.0.lock() {
            Ok(mut slot) => slot.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        }
    }
}
