use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use uuid::Uuid;

// ============================================================================
// Assignment Arbiter
// ============================================================================
//
// Two races meet at READY → ASSIGNED:
// - two partners claiming the same order: closed by the event store's
//   expected-version check on the order stream
// - one partner claiming two orders at once: the busy check spans several
//   streams, so claims by the same partner are serialized here
//
// Holding the partner's guard across "is this partner busy?" and the order
// commit makes the pair atomic per partner. Different partners never wait on
// each other.
//
// ============================================================================

#[derive(Default)]
pub struct AssignmentArbiter {
    partner_locks: Mutex<HashMap<Uuid, Arc<AsyncMutex<()>>>>,
}

/// Exclusive claim rights for one partner. The partner's lock entry is
/// dropped once nobody holds or awaits it, so the map only ever holds
/// partners with a claim in flight.
pub struct PartnerClaim<'a> {
    guard: Option<OwnedMutexGuard<()>>,
    partner_id: Uuid,
    arbiter: &'a AssignmentArbiter,
}

impl Drop for PartnerClaim<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());

        let mut locks = self.arbiter.locks();
        // Clones are only handed out under the map lock, so a count of one
        // means no other claim holds or is waiting on this entry
        if locks.get(&self.partner_id).is_some_and(|lock| Arc::strong_count(lock) == 1) {
            locks.remove(&self.partner_id);
        }
    }
}

impl AssignmentArbiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive claim rights for one partner
    pub async fn lock_partner(&self, partner_id: Uuid) -> PartnerClaim<'_> {
        let lock = self.locks().entry(partner_id).or_default().clone();
        let guard = lock.lock_owned().await;

        PartnerClaim {
            guard: Some(guard),
            partner_id,
            arbiter: self,
        }
    }

    fn locks(&self) -> MutexGuard<'_, HashMap<Uuid, Arc<AsyncMutex<()>>>> {
        self.partner_locks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    #[cfg(test)]
    fn tracked_partners(&self) -> usize {
        self.locks().len()
    }
}
