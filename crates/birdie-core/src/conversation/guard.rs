//! Per-user ingestion exclusion.
//!
//! `IngestionGuard` tracks which users have a video pipeline in flight in
//! this process. A permit is held for the whole run and released on drop,
//! so a panic or early return never leaves a user locked out.

use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

#[derive(Debug, Clone, Default)]
pub struct IngestionGuard {
    in_flight: Arc<DashMap<String, ()>>,
}

impl IngestionGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the user's slot. `None` if an ingestion is already running.
    pub fn try_acquire(&self, user_id: &str) -> Option<IngestionPermit> {
        match self.in_flight.entry(user_id.to_string()) {
            Entry::Occupied(_) => None,
            Entry::Vacant(slot) => {
                slot.insert(());
                Some(IngestionPermit {
                    in_flight: Arc::clone(&self.in_flight),
                    user_id: user_id.to_string(),
                })
            }
        }
    }

    pub fn is_busy(&self, user_id: &str) -> bool {
        self.in_flight.contains_key(user_id)
    }

    pub fn len(&self) -> usize {
        self.in_flight.len()
    }

    pub fn is_empty(&self) -> bool {
        self.in_flight.is_empty()
    }
}

/// Held while a user's ingestion runs.
#[derive(Debug)]
pub struct IngestionPermit {
    in_flight: Arc<DashMap<String, ()>>,
    user_id: String,
}

impl IngestionPermit {
    pub fn user_id(&self) -> &str {
        &self.user_id
    }
}

impl Drop for IngestionPermit {
    fn drop(&mut self) {
        self.in_flight.remove(&self.user_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_acquire_for_same_user_is_rejected() {
        let guard = IngestionGuard::new();
        let permit = guard.try_acquire("U1").unwrap();
        assert_eq!(permit.user_id(), "U1");
        assert!(guard.try_acquire("U1").is_none());
        assert!(guard.is_busy("U1"));
    }

    #[test]
    fn different_users_do_not_block_each_other() {
        let guard = IngestionGuard::new();
        let _a = guard.try_acquire("U1").unwrap();
        let _b = guard.try_acquire("U2").unwrap();
        assert_eq!(guard.len(), 2);
    }

    #[test]
    fn dropping_permit_frees_the_slot() {
        let guard = IngestionGuard::new();
        drop(guard.try_acquire("U1").unwrap());
        assert!(!guard.is_busy("U1"));
        assert!(guard.try_acquire("U1").is_some());
    }

    #[test]
    fn clones_share_state() {
        let guard = IngestionGuard::new();
        let other = guard.clone();
        let _permit = guard.try_acquire("U1").unwrap();
        assert!(other.try_acquire("U1").is_none());
    }
}
