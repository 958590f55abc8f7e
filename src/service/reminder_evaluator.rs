use std::collections::BTreeSet;

use chrono::{Datelike, NaiveDateTime, Timelike};
use tracing::{debug, warn};

use crate::models::event::{Event, EventId};

pub const DEFAULT_TOLERANCE_MINUTES: u32 = 1;

pub struct ReminderEvaluator {
    tolerance_minutes: u32,
}

impl Default for ReminderEvaluator {
    fn default() -> Self {
        Self::new(DEFAULT_TOLERANCE_MINUTES)
    }
}

impl ReminderEvaluator {
    pub fn new(tolerance_minutes: u32) -> Self {
        Self { tolerance_minutes }
    }

    /// Events that should alert at `now`, in store order.
    ///
    /// Only the acknowledgment set suppresses a match, so an event keeps
    /// matching on every tick inside its window until it is acknowledged.
    pub fn due<'a>(
        &self,
        events: &'a [Event],
        acknowledged: &BTreeSet<EventId>,
        now: NaiveDateTime,
    ) -> Vec<&'a Event> {
        let current_day = now.weekday().num_days_from_sunday();
        let current_minute = now.hour() * 60 + now.minute();

        events
            .iter()
            .filter(|event| {
                if acknowledged.contains(&event.id) {
                    debug!(id = event.id, title = %event.title, "Already acknowledged, skipping");
                    return false;
                }
                let start = match event.start_minute() {
                    Ok(start) => start,
                    Err(err) => {
                        warn!(id = event.id, error = %err, "Skipping event with unreadable start time");
                        return false;
                    }
                };
                event.weekday_index() == current_day
                    && start.abs_diff(current_minute) <= self.tolerance_minutes
            })
            .collect()
    }
}
