use chrono::{Duration, NaiveDateTime};

use crate::models::event::Event;

pub const DEFAULT_ESCALATION_DELAY_SECS: i64 = 120;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Active,
    Escalated,
}

/// The single reminder currently alerting, if any.
///
/// Pure state: the engine performs the sound and notifier side effects that
/// each transition asks for.
#[derive(Debug, Clone)]
pub struct NotificationSession {
    event: Option<Event>,
    active: bool,
    acknowledged: bool,
    escalation_shown: bool,
    opened_at: Option<NaiveDateTime>,
    escalation_delay: Duration,
}

impl Default for NotificationSession {
    fn default() -> Self {
        Self::new(Duration::seconds(DEFAULT_ESCALATION_DELAY_SECS))
    }
}

impl NotificationSession {
    pub fn new(escalation_delay: Duration) -> Self {
        Self {
            event: None,
            active: false,
            acknowledged: false,
            escalation_shown: false,
            opened_at: None,
            escalation_delay,
        }
    }

    pub fn state(&self) -> SessionState {
        match (self.active, self.escalation_shown) {
            (false, _) => SessionState::Idle,
            (true, false) => SessionState::Active,
            (true, true) => SessionState::Escalated,
        }
    }

    pub fn event(&self) -> Option<&Event> {
        self.event.as_ref()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_acknowledged(&self) -> bool {
        self.acknowledged
    }

    pub fn escalation_shown(&self) -> bool {
        self.escalation_shown
    }

    /// Enters `Active` for `event`, replacing whatever was alerting before.
    /// Returns the replaced event, if there was one.
    ///
    /// Re-opening the event that already holds the session keeps its entry
    /// time and escalation flag, so the bell still fires relative to the
    /// first trigger.
    pub fn open(&mut self, event: Event, now: NaiveDateTime) -> Option<Event> {
        if self.active && self.event.as_ref().map(|live| live.id) == Some(event.id) {
            self.event = Some(event);
            return None;
        }
        let replaced = if self.active { self.event.take() } else { None };
        self.event = Some(event);
        self.active = true;
        self.acknowledged = false;
        self.escalation_shown = false;
        self.opened_at = Some(now);
        replaced
    }

    /// When the escalation timer for the live session fires.
    pub fn escalation_deadline(&self) -> Option<NaiveDateTime> {
        if !self.active || self.escalation_shown {
            return None;
        }
        self.opened_at.map(|opened| opened + self.escalation_delay)
    }

    /// Timer callback. Reads the flags as they are now, so an acknowledgment
    /// that landed during the delay suppresses escalation.
    pub fn escalate_if_due(&mut self, now: NaiveDateTime) -> bool {
        let Some(deadline) = self.escalation_deadline() else {
            return false;
        };
        if self.acknowledged || now < deadline {
            return false;
        }
        self.escalation_shown = true;
        true
    }

    /// Acknowledge and dismiss both end here. Returns the event that was
    /// alerting, or `None` when the session was already idle.
    pub fn close(&mut self) -> Option<Event> {
        if !self.active {
            return None;
        }
        let event = self.event.take();
        self.active = false;
        self.acknowledged = true;
        self.escalation_shown = false;
        self.opened_at = None;
        event
    }
}
