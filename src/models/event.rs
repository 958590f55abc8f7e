use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::error::EventError;

pub type EventId = i64;

pub const DEFAULT_COLOR: &str = "bg-blue-500";
pub const DEFAULT_PARTICIPANT: &str = "You";

/// A calendar entry as persisted under the events key.
///
/// `day` is 1-based with 1 = Sunday. Field names on disk are camelCase so a
/// payload written by the calendar page loads unchanged.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: EventId,
    pub title: String,
    pub start_time: String,
    pub end_time: String,
    pub color: String,
    pub day: u8,
    pub description: String,
    pub location: String,
    pub attendees: Vec<String>,
    pub organizer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

/// An event that has not been assigned an id yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEvent {
    pub title: String,
    pub start_time: String,
    pub end_time: String,
    pub color: String,
    pub day: u8,
    pub description: String,
    pub location: String,
    pub attendees: Vec<String>,
    pub organizer: String,
    pub date: Option<String>,
}

impl NewEvent {
    pub fn validate(&self) -> Result<(), EventError> {
        if self.title.trim().is_empty() {
            return Err(EventError::MissingField("title"));
        }
        if self.start_time.trim().is_empty() {
            return Err(EventError::MissingField("start time"));
        }
        if self.end_time.trim().is_empty() {
            return Err(EventError::MissingField("end time"));
        }
        if self.location.trim().is_empty() {
            return Err(EventError::MissingField("location"));
        }
        if self.description.trim().is_empty() {
            return Err(EventError::MissingField("description"));
        }
        parse_minute_of_day(&self.start_time)?;
        parse_minute_of_day(&self.end_time)?;
        if !(1..=7).contains(&self.day) {
            return Err(EventError::DayOutOfRange(self.day));
        }
        Ok(())
    }

    pub fn with_id(self, id: EventId) -> Event {
        Event {
            id,
            title: self.title,
            start_time: self.start_time,
            end_time: self.end_time,
            color: self.color,
            day: self.day,
            description: self.description,
            location: self.location,
            attendees: self.attendees,
            organizer: self.organizer,
            date: self.date,
        }
    }
}

impl Event {
    pub fn start_minute(&self) -> Result<u32, EventError> {
        parse_minute_of_day(&self.start_time)
    }

    /// Day of week with Sunday = 0, matching `Weekday::num_days_from_sunday`.
    /// Out-of-range stored days map to 7, which matches no weekday.
    pub fn weekday_index(&self) -> u32 {
        match self.day {
            1 => 0,
            2..=7 => u32::from(self.day) - 1,
            _ => 7,
        }
    }

    pub fn weekday_label(&self) -> &'static str {
        WEEKDAY_LABELS
            .get(self.weekday_index() as usize)
            .copied()
            .unwrap_or("???")
    }
}

pub const WEEKDAY_LABELS: [&str; 7] = ["SUN", "MON", "TUE", "WED", "THU", "FRI", "SAT"];

/// Parses a 24-hour "HH:MM" string into minutes since midnight.
pub fn parse_minute_of_day(value: &str) -> Result<u32, EventError> {
    let time = NaiveTime::parse_from_str(value.trim(), "%H:%M")
        .map_err(|_| EventError::InvalidTime(value.to_string()))?;
    Ok(time.hour() * 60 + time.minute())
}

/// Converts a 0-based weekday (Sunday = 0) into the stored 1-based index.
pub fn day_from_weekday_index(index: u32) -> u8 {
    (index % 7 + 1) as u8
}
