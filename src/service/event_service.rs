use chrono::{Datelike, Duration, NaiveDateTime};
use tracing::{debug, info};

use crate::error::{StorageError, StoreError};
use crate::models::event::{
    day_from_weekday_index, Event, NewEvent, DEFAULT_COLOR, DEFAULT_PARTICIPANT, WEEKDAY_LABELS,
};
use crate::service::event_store::EventStore;
use crate::storage::KeyValueStore;

pub const TEST_EVENT_ID: i64 = 999;

/// Raw create-form input before validation.
#[derive(Debug, Clone, Default)]
pub struct EventForm {
    pub title: String,
    pub start_time: String,
    pub end_time: String,
    pub day: String,
    pub location: String,
    pub description: String,
    pub attendees: String,
    pub organizer: String,
    pub color: String,
}

impl EventForm {
    pub fn into_new_event(self) -> NewEvent {
        let attendees: Vec<String> = self
            .attendees
            .split(',')
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .collect();
        NewEvent {
            title: self.title.trim().to_string(),
            start_time: self.start_time.trim().to_string(),
            end_time: self.end_time.trim().to_string(),
            color: or_default(self.color, DEFAULT_COLOR),
            // Unparseable days become 0 and fail validation.
            day: parse_day(&self.day).unwrap_or(0),
            description: self.description.trim().to_string(),
            location: self.location.trim().to_string(),
            attendees: if attendees.is_empty() {
                vec![DEFAULT_PARTICIPANT.to_string()]
            } else {
                attendees
            },
            organizer: or_default(self.organizer, DEFAULT_PARTICIPANT),
            date: None,
        }
    }
}

fn or_default(value: String, default: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        default.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Accepts 1-7 (1 = Sunday) or a weekday name such as "mon" or "Monday".
pub fn parse_day(value: &str) -> Option<u8> {
    let value = value.trim();
    if let Ok(day) = value.parse::<u8>() {
        return (1..=7).contains(&day).then_some(day);
    }
    let lower = value.to_ascii_lowercase();
    if lower.len() < 3 {
        return None;
    }
    WEEKDAY_LABELS
        .iter()
        .position(|label| lower.starts_with(&label.to_ascii_lowercase()))
        .map(|idx| day_from_weekday_index(idx as u32))
}

pub struct EventService;

impl EventService {
    /// Adds the event, or skips it without error when the form is incomplete.
    pub fn create<S: KeyValueStore>(
        store: &mut EventStore<S>,
        form: EventForm,
    ) -> Result<Option<Event>, StorageError> {
        match store.add(form.into_new_event()) {
            Ok(event) => {
                info!(id = event.id, title = %event.title, day = event.weekday_label(), "Event created");
                Ok(Some(event))
            }
            Err(StoreError::Invalid(reason)) => {
                debug!(reason = %reason, "Event creation skipped");
                Ok(None)
            }
            Err(StoreError::Storage(err)) => Err(err),
        }
    }

    /// A 30 minute event starting one minute after `now`, on `now`'s weekday.
    pub fn test_event_for_now(now: NaiveDateTime) -> NewEvent {
        let start = now + Duration::minutes(1);
        let end = start + Duration::minutes(30);
        NewEvent {
            title: "Test Event for Now".to_string(),
            start_time: start.format("%H:%M").to_string(),
            end_time: end.format("%H:%M").to_string(),
            color: "bg-green-500".to_string(),
            day: day_from_weekday_index(start.weekday().num_days_from_sunday()),
            description: "This event should trigger in 1 minute".to_string(),
            location: "Test Location".to_string(),
            attendees: vec![DEFAULT_PARTICIPANT.to_string()],
            organizer: DEFAULT_PARTICIPANT.to_string(),
            date: None,
        }
    }

    pub fn test_notification_event() -> Event {
        Event {
            id: TEST_EVENT_ID,
            title: "Test Meeting".to_string(),
            start_time: "14:00".to_string(),
            end_time: "15:00".to_string(),
            color: "bg-red-500".to_string(),
            day: 1,
            description: "This is a test notification".to_string(),
            location: "Test Room".to_string(),
            attendees: vec!["Test User".to_string()],
            organizer: "Test Organizer".to_string(),
            date: None,
        }
    }

    /// Week listing, Sunday first, each day sorted by start time.
    pub fn render_week<S: KeyValueStore>(store: &EventStore<S>) -> String {
        let mut lines = vec![format!(
            "Events: {} | Ack: {}",
            store.events().len(),
            store.acknowledged().len()
        )];
        for (idx, label) in WEEKDAY_LABELS.iter().enumerate() {
            let mut events: Vec<&Event> = store
                .events()
                .iter()
                .filter(|event| event.weekday_index() == idx as u32)
                .collect();
            if events.is_empty() {
                continue;
            }
            events.sort_by(|a, b| a.start_time.cmp(&b.start_time));
            lines.push(label.to_string());
            for event in events {
                let mark = if store.is_acknowledged(event.id) { "✓" } else { " " };
                lines.push(format!(
                    "  [{}] {} - {}  {}  @ {}  (id {})",
                    mark, event.start_time, event.end_time, event.title, event.location, event.id
                ));
            }
        }
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use chrono::NaiveDate;

    fn form() -> EventForm {
        EventForm {
            title: " Standup ".to_string(),
            start_time: "09:00".to_string(),
            end_time: "09:30".to_string(),
            day: "mon".to_string(),
            location: "Room 1".to_string(),
            description: "daily".to_string(),
            ..EventForm::default()
        }
    }

    #[test]
    fn parse_day_accepts_numbers_and_names() {
        assert_eq!(parse_day("1"), Some(1));
        assert_eq!(parse_day("Monday"), Some(2));
        assert_eq!(parse_day("sat"), Some(7));
        assert_eq!(parse_day("8"), None);
        assert_eq!(parse_day("mo"), None);
    }

    #[test]
    fn form_fills_participant_defaults() {
        let event = form().into_new_event();
        assert_eq!(event.title, "Standup");
        assert_eq!(event.day, 2);
        assert_eq!(event.attendees, vec!["You".to_string()]);
        assert_eq!(event.organizer, "You");
        assert_eq!(event.color, DEFAULT_COLOR);
    }

    #[test]
    fn create_skips_incomplete_forms() {
        let mut store = EventStore::load(MemoryStore::new());
        let mut incomplete = form();
        incomplete.description = String::new();

        assert!(EventService::create(&mut store, incomplete).unwrap().is_none());
        assert!(store.events().is_empty());
        assert!(EventService::create(&mut store, form()).unwrap().is_some());
        assert_eq!(store.events().len(), 1);
    }

    #[test]
    fn test_event_for_now_rolls_over_the_hour() {
        // 2025-06-07 is a Saturday.
        let now = NaiveDate::from_ymd_opt(2025, 6, 7)
            .unwrap()
            .and_hms_opt(10, 59, 30)
            .unwrap();
        let event = EventService::test_event_for_now(now);
        assert_eq!(event.start_time, "11:00");
        assert_eq!(event.end_time, "11:30");
        assert_eq!(event.day, 7);
        assert!(event.validate().is_ok());
    }

    #[test]
    fn render_week_groups_by_day_and_marks_acknowledged() {
        let mut store = EventStore::load(MemoryStore::new());
        let created = EventService::create(&mut store, form()).unwrap().unwrap();
        store.acknowledge(created.id).unwrap();

        let listing = EventService::render_week(&store);
        assert!(listing.starts_with("Events: 1 | Ack: 1"));
        assert!(listing.contains("MON"));
        assert!(listing.contains("[✓] 09:00 - 09:30  Standup"));
        assert!(!listing.contains("SUN"));
    }
}
