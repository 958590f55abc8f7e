use std::collections::BTreeSet;

use chrono::Utc;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::error::{StorageError, StoreError};
use crate::models::event::{Event, EventId, NewEvent};
use crate::storage::KeyValueStore;

pub const EVENTS_KEY: &str = "calendar-events";
pub const ACKNOWLEDGED_KEY: &str = "acknowledged-events";

/// In-memory events and acknowledgments, mirrored to durable storage.
///
/// Every mutation rewrites the full collection it touched before returning.
/// Acknowledgments whose write failed are kept and retried on `refresh`.
pub struct EventStore<S: KeyValueStore> {
    storage: S,
    events: Vec<Event>,
    acknowledged: BTreeSet<EventId>,
    unsaved_acks: BTreeSet<EventId>,
}

impl<S: KeyValueStore> EventStore<S> {
    /// Never fails: absent or unreadable payloads load as empty collections.
    pub fn load(storage: S) -> Self {
        let events = read_or_empty(&storage, EVENTS_KEY);
        let acknowledged = read_or_empty(&storage, ACKNOWLEDGED_KEY);
        Self {
            storage,
            events,
            acknowledged,
            unsaved_acks: BTreeSet::new(),
        }
    }

    /// Re-reads both keys so changes written by another process become visible.
    pub fn refresh(&mut self) {
        self.events = read_or_empty(&self.storage, EVENTS_KEY);
        self.acknowledged = read_or_empty(&self.storage, ACKNOWLEDGED_KEY);
        if self.unsaved_acks.is_empty() {
            return;
        }
        self.acknowledged.extend(self.unsaved_acks.iter().copied());
        match self.save_acknowledged() {
            Ok(()) => {
                debug!(count = self.unsaved_acks.len(), "Saved pending acknowledgments");
                self.unsaved_acks.clear();
            }
            Err(err) => warn!(error = %err, "Acknowledgments still not saved"),
        }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn get(&self, id: EventId) -> Option<&Event> {
        self.events.iter().find(|event| event.id == id)
    }

    pub fn acknowledged(&self) -> &BTreeSet<EventId> {
        &self.acknowledged
    }

    pub fn is_acknowledged(&self, id: EventId) -> bool {
        self.acknowledged.contains(&id)
    }

    pub fn add(&mut self, new_event: NewEvent) -> Result<Event, StoreError> {
        new_event.validate()?;
        let event = new_event.with_id(self.next_id());
        self.events.push(event.clone());
        self.save_events()?;
        debug!(id = event.id, title = %event.title, "Event added");
        Ok(event)
    }

    /// Returns whether an event was removed. Absent ids are not an error.
    pub fn remove(&mut self, id: EventId) -> Result<bool, StorageError> {
        let before = self.events.len();
        self.events.retain(|event| event.id != id);
        let removed = self.events.len() != before;
        self.save_events()?;
        if removed {
            debug!(id, "Event removed");
        }
        Ok(removed)
    }

    /// The id stays acknowledged in memory even when the write fails.
    pub fn acknowledge(&mut self, id: EventId) -> Result<(), StorageError> {
        self.acknowledged.insert(id);
        self.save_acknowledged().inspect_err(|_| {
            self.unsaved_acks.insert(id);
        })
    }

    pub fn reset_acknowledgments(&mut self) -> Result<(), StorageError> {
        self.acknowledged.clear();
        self.unsaved_acks.clear();
        self.save_acknowledged()
    }

    // Millisecond timestamps, bumped when two adds share a millisecond.
    fn next_id(&self) -> EventId {
        let now = Utc::now().timestamp_millis();
        match self.events.iter().map(|event| event.id).max() {
            Some(max) if max >= now => max
                .checked_add(1)
                .unwrap_or_else(|| self.first_free_id(now)),
            _ => now,
        }
    }

    fn first_free_id(&self, from: EventId) -> EventId {
        (from..=EventId::MAX)
            .find(|id| self.get(*id).is_none())
            .unwrap_or(from)
    }

    fn save_events(&mut self) -> Result<(), StorageError> {
        let payload = serde_json::to_string(&self.events).map_err(|source| StorageError::Json {
            key: EVENTS_KEY.to_string(),
            source,
        })?;
        self.storage.set(EVENTS_KEY, &payload)
    }

    fn save_acknowledged(&mut self) -> Result<(), StorageError> {
        let payload =
            serde_json::to_string(&self.acknowledged).map_err(|source| StorageError::Json {
                key: ACKNOWLEDGED_KEY.to_string(),
                source,
            })?;
        self.storage.set(ACKNOWLEDGED_KEY, &payload)
    }
}

fn read_or_empty<S, T>(storage: &S, key: &str) -> T
where
    S: KeyValueStore + ?Sized,
    T: DeserializeOwned + Default,
{
    let raw = match storage.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return T::default(),
        Err(err) => {
            warn!(key, error = %err, "Failed to read stored value, starting empty");
            return T::default();
        }
    };
    serde_json::from_str(&raw).unwrap_or_else(|err| {
        warn!(key, error = %err, "Stored value is malformed, starting empty");
        T::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use std::path::PathBuf;

    #[derive(Default)]
    struct FlakyStore {
        inner: MemoryStore,
        fail_acks: bool,
    }

    impl KeyValueStore for FlakyStore {
        fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
            self.inner.get(key)
        }

        fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
            if self.fail_acks && key == ACKNOWLEDGED_KEY {
                return Err(StorageError::Io {
                    path: PathBuf::from(key),
                    source: std::io::Error::other("disk full"),
                });
            }
            self.inner.set(key, value)
        }
    }

    fn new_event(title: &str, start: &str, day: u8) -> NewEvent {
        NewEvent {
            title: title.to_string(),
            start_time: start.to_string(),
            end_time: "23:00".to_string(),
            color: "bg-blue-500".to_string(),
            day,
            description: "notes".to_string(),
            location: "Room 1".to_string(),
            attendees: vec!["Ann".to_string(), "Bob".to_string()],
            organizer: "Ann".to_string(),
            date: None,
        }
    }

    #[test]
    fn load_empty_storage_yields_empty_store() {
        let store = EventStore::load(MemoryStore::new());
        assert!(store.events().is_empty());
        assert!(store.acknowledged().is_empty());
    }

    #[test]
    fn load_tolerates_malformed_payloads() {
        let mut storage = MemoryStore::new();
        storage.set(EVENTS_KEY, "{not json").unwrap();
        storage.set(ACKNOWLEDGED_KEY, "\"nope\"").unwrap();

        let store = EventStore::load(storage);
        assert!(store.events().is_empty());
        assert!(store.acknowledged().is_empty());
    }

    #[test]
    fn add_persists_and_assigns_unique_ids() {
        let mut store = EventStore::load(MemoryStore::new());
        let first = store.add(new_event("Standup", "09:00", 2)).unwrap();
        let second = store.add(new_event("Retro", "15:00", 6)).unwrap();

        assert_ne!(first.id, second.id);
        assert!(second.id > first.id);
        assert_eq!(store.events().len(), 2);

        let reloaded = EventStore::load(store.storage.clone());
        assert_eq!(reloaded.events(), store.events());
    }

    #[test]
    fn add_rejects_missing_fields_without_touching_storage() {
        let mut store = EventStore::load(MemoryStore::new());
        let mut event = new_event("Standup", "09:00", 2);
        event.location = String::new();

        assert!(matches!(store.add(event), Err(StoreError::Invalid(_))));
        assert!(store.events().is_empty());
        assert!(store.storage.get(EVENTS_KEY).unwrap().is_none());
    }

    #[test]
    fn remove_missing_id_is_a_noop() {
        let mut store = EventStore::load(MemoryStore::new());
        let event = store.add(new_event("Standup", "09:00", 2)).unwrap();

        assert!(!store.remove(event.id + 1000).unwrap());
        assert_eq!(store.events().len(), 1);
        assert!(store.remove(event.id).unwrap());
        assert!(store.events().is_empty());
    }

    #[test]
    fn acknowledge_is_idempotent_and_reset_clears() {
        let mut store = EventStore::load(MemoryStore::new());
        store.acknowledge(7).unwrap();
        store.acknowledge(7).unwrap();
        assert_eq!(store.acknowledged().len(), 1);
        assert_eq!(store.storage.get(ACKNOWLEDGED_KEY).unwrap().as_deref(), Some("[7]"));

        store.reset_acknowledgments().unwrap();
        assert!(!store.is_acknowledged(7));
        assert_eq!(store.storage.get(ACKNOWLEDGED_KEY).unwrap().as_deref(), Some("[]"));
    }

    #[test]
    fn refresh_picks_up_external_writes() {
        let mut store = EventStore::load(MemoryStore::new());
        store.storage.set(ACKNOWLEDGED_KEY, "[1,2,3]").unwrap();
        assert!(store.acknowledged().is_empty());

        store.refresh();
        assert!(store.is_acknowledged(2));
    }

    #[test]
    fn failed_acknowledgment_survives_refresh_and_is_retried() {
        let mut store = EventStore::load(FlakyStore {
            fail_acks: true,
            ..FlakyStore::default()
        });
        assert!(store.acknowledge(7).is_err());
        assert!(store.is_acknowledged(7));

        store.refresh();
        assert!(store.is_acknowledged(7));
        assert!(store.storage.inner.get(ACKNOWLEDGED_KEY).unwrap().is_none());

        store.storage.fail_acks = false;
        store.refresh();
        assert_eq!(store.storage.inner.get(ACKNOWLEDGED_KEY).unwrap().as_deref(), Some("[7]"));
        assert!(store.unsaved_acks.is_empty());
    }

    #[test]
    fn reset_drops_unsaved_acknowledgments() {
        let mut store = EventStore::load(FlakyStore {
            fail_acks: true,
            ..FlakyStore::default()
        });
        let _ = store.acknowledge(7);
        store.storage.fail_acks = false;

        store.reset_acknowledgments().unwrap();
        store.refresh();
        assert!(!store.is_acknowledged(7));
    }

    #[test]
    fn next_id_does_not_overflow_at_max() {
        let mut storage = MemoryStore::new();
        let stored = vec![new_event("Hand edited", "08:00", 2).with_id(EventId::MAX)];
        storage.set(EVENTS_KEY, &serde_json::to_string(&stored).unwrap()).unwrap();
        let mut store = EventStore::load(storage);

        let added = store.add(new_event("Standup", "09:00", 2)).unwrap();
        assert_ne!(added.id, EventId::MAX);
        assert_eq!(store.events().len(), 2);
    }
}
