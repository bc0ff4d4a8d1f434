//! Persisted subscription flags.
//!
//! The room-wide subscription flag, the suspended-subscription snapshot
//! and the per-machine individual flags survive page reloads. They are
//! read and written through an injected [`SubscriptionStore`] rather than
//! queried from ambient storage at arbitrary call sites, so there is a
//! single read-modify-write path.
//!
//! Storage is crash-tolerant in the degraded-read sense: a corrupt or
//! missing value yields the default (inactive / empty / unsubscribed),
//! never an error.

use std::collections::{BTreeSet, HashMap};

use washboard_proto::MachineId;

const ROOM_ACTIVE_KEY: &str = "room_active";
const SUSPENDED_KEY: &str = "suspended_subs";

/// Synchronous key/value persistence.
///
/// Implementations must make `set` durable before returning, to the extent
/// the platform allows. Keys and values are plain strings; callers own the
/// encoding.
pub trait KvStore {
    /// Read a value. `None` when absent.
    fn get(&self, key: &str) -> Option<String>;
    /// Write a value synchronously.
    fn set(&mut self, key: &str, value: &str);
    /// Remove a value. Removing an absent key is a no-op.
    fn remove(&mut self, key: &str);
}

impl KvStore for Box<dyn KvStore + Send> {
    fn get(&self, key: &str) -> Option<String> {
        self.as_ref().get(key)
    }

    fn set(&mut self, key: &str, value: &str) {
        self.as_mut().set(key, value);
    }

    fn remove(&mut self, key: &str) {
        self.as_mut().remove(key);
    }
}

/// In-memory [`KvStore`] for tests and ephemeral sessions.
#[derive(Debug, Default, Clone)]
pub struct MemoryKv {
    values: HashMap<String, String>,
}

impl MemoryKv {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl KvStore for MemoryKv {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.values.insert(key.to_owned(), value.to_owned());
    }

    fn remove(&mut self, key: &str) {
        self.values.remove(key);
    }
}

/// Subscription persistence over a [`KvStore`].
#[derive(Debug)]
pub struct SubscriptionStore<K> {
    kv: K,
}

impl<K: KvStore> SubscriptionStore<K> {
    /// Wrap a key/value store.
    pub fn new(kv: K) -> Self {
        Self { kv }
    }

    /// Unwrap the underlying key/value store.
    pub fn into_inner(self) -> K {
        self.kv
    }

    /// Whether the room-wide subscription is active.
    pub fn is_room_active(&self) -> bool {
        match self.kv.get(ROOM_ACTIVE_KEY).as_deref() {
            Some("true") => true,
            Some("false") | None => false,
            Some(other) => {
                tracing::warn!(value = other, "corrupt room flag, treating as inactive");
                false
            }
        }
    }

    /// Persist the room-wide subscription flag synchronously.
    pub fn set_room_active(&mut self, active: bool) {
        self.kv.set(ROOM_ACTIVE_KEY, if active { "true" } else { "false" });
    }

    /// Save the set of machine ids holding an individual subscription at
    /// the moment room mode turns on.
    pub fn save_snapshot(&mut self, machine_ids: &BTreeSet<MachineId>) {
        match serde_json::to_string(machine_ids) {
            Ok(encoded) => self.kv.set(SUSPENDED_KEY, &encoded),
            Err(err) => tracing::warn!(%err, "failed to encode suspended subscription set"),
        }
    }

    /// Consume and clear the suspended-subscription snapshot.
    ///
    /// A missing or corrupt snapshot yields the empty set.
    pub fn take_snapshot(&mut self) -> BTreeSet<MachineId> {
        let snapshot = self
            .kv
            .get(SUSPENDED_KEY)
            .and_then(|raw| match serde_json::from_str(&raw) {
                Ok(ids) => Some(ids),
                Err(err) => {
                    tracing::warn!(%err, "corrupt suspended subscription set, dropping");
                    None
                }
            })
            .unwrap_or_default();
        self.clear_snapshot();
        snapshot
    }

    /// Drop the suspended-subscription snapshot without reading it.
    pub fn clear_snapshot(&mut self) {
        self.kv.remove(SUSPENDED_KEY);
    }

    /// Whether an individual subscription is recorded for a machine.
    pub fn individual(&self, id: MachineId) -> bool {
        self.kv.get(&individual_key(id)).as_deref() == Some("true")
    }

    /// Persist an individual subscription flag synchronously.
    pub fn set_individual(&mut self, id: MachineId, subscribed: bool) {
        if subscribed {
            self.kv.set(&individual_key(id), "true");
        } else {
            self.kv.remove(&individual_key(id));
        }
    }
}

fn individual_key(id: MachineId) -> String {
    format!("individual/{id}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> SubscriptionStore<MemoryKv> {
        SubscriptionStore::new(MemoryKv::new())
    }

    #[test]
    fn room_flag_defaults_to_inactive() {
        assert!(!store().is_room_active());
    }

    #[test]
    fn room_flag_round_trips() {
        let mut s = store();
        s.set_room_active(true);
        assert!(s.is_room_active());
        s.set_room_active(false);
        assert!(!s.is_room_active());
    }

    #[test]
    fn corrupt_room_flag_degrades_to_inactive() {
        let mut kv = MemoryKv::new();
        kv.set(ROOM_ACTIVE_KEY, "maybe");
        assert!(!SubscriptionStore::new(kv).is_room_active());
    }

    #[test]
    fn snapshot_round_trips_as_a_set() {
        let mut s = store();
        let ids: BTreeSet<MachineId> = [3, 1, 7].into_iter().collect();
        s.save_snapshot(&ids);
        assert_eq!(s.take_snapshot(), ids);
        // Consumed: a second take yields the empty set.
        assert!(s.take_snapshot().is_empty());
    }

    #[test]
    fn corrupt_snapshot_degrades_to_empty() {
        let mut kv = MemoryKv::new();
        kv.set(SUSPENDED_KEY, "{not json");
        let mut s = SubscriptionStore::new(kv);
        assert!(s.take_snapshot().is_empty());
    }

    #[test]
    fn individual_flags_are_per_machine() {
        let mut s = store();
        s.set_individual(2, true);
        assert!(s.individual(2));
        assert!(!s.individual(3));
        s.set_individual(2, false);
        assert!(!s.individual(2));
    }
}
