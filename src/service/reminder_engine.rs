use std::sync::Arc;

use chrono::{Duration, NaiveDateTime};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::error::StorageError;
use crate::models::event::{Event, EventId};
use crate::service::audio::{AudioPlayer, Sound};
use crate::service::event_store::EventStore;
use crate::service::notification_session::NotificationSession;
use crate::service::notifier_service::Notifier;
use crate::service::reminder_evaluator::ReminderEvaluator;
use crate::service::reminder_message::ReminderMessageService;
use crate::storage::KeyValueStore;

#[derive(Debug, Clone)]
pub struct ReminderSettings {
    pub tick: std::time::Duration,
    pub escalation_delay: Duration,
    pub tolerance_minutes: u32,
}

impl Default for ReminderSettings {
    fn default() -> Self {
        Self {
            tick: std::time::Duration::from_secs(60),
            escalation_delay: Duration::minutes(2),
            tolerance_minutes: 1,
        }
    }
}

/// What one evaluator pass did. `deliveries` are the detached notifier
/// sends; awaiting them is optional.
#[derive(Debug, Default)]
pub struct TickReport {
    pub triggered: Vec<EventId>,
    pub deliveries: Vec<JoinHandle<()>>,
}

impl TickReport {
    pub async fn delivered(self) {
        for delivery in self.deliveries {
            let _ = delivery.await;
        }
    }
}

/// Owns the event store and the notification session, and performs the
/// side effects each session transition calls for.
pub struct ReminderEngine<S: KeyValueStore> {
    store: EventStore<S>,
    session: NotificationSession,
    evaluator: ReminderEvaluator,
    notifier: Arc<dyn Notifier>,
    audio: Arc<dyn AudioPlayer>,
}

impl<S: KeyValueStore> ReminderEngine<S> {
    pub fn new(
        store: EventStore<S>,
        settings: &ReminderSettings,
        notifier: Arc<dyn Notifier>,
        audio: Arc<dyn AudioPlayer>,
    ) -> Self {
        Self {
            store,
            session: NotificationSession::new(settings.escalation_delay),
            evaluator: ReminderEvaluator::new(settings.tolerance_minutes),
            notifier,
            audio,
        }
    }

    pub fn store(&self) -> &EventStore<S> {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut EventStore<S> {
        &mut self.store
    }

    pub fn session(&self) -> &NotificationSession {
        &self.session
    }

    /// One evaluator pass. Every due event is triggered in store order; with
    /// several matches the last one ends up owning the session.
    pub fn tick(&mut self, now: NaiveDateTime) -> TickReport {
        let due: Vec<Event> = self
            .evaluator
            .due(self.store.events(), self.store.acknowledged(), now)
            .into_iter()
            .cloned()
            .collect();

        let mut report = TickReport::default();
        for event in due {
            report.triggered.push(event.id);
            report.deliveries.push(self.trigger(event, now));
        }
        report
    }

    /// Idle -> Active for `event`. Must be called inside a tokio runtime.
    pub fn trigger(&mut self, event: Event, now: NaiveDateTime) -> JoinHandle<()> {
        let message = ReminderMessageService::build_message(&event);
        let notifier = self.notifier.clone();
        let event_id = event.id;
        let delivery = tokio::spawn(async move {
            if let Err(err) = notifier.notify(&message).await {
                error!(id = event_id, error = %err, "Error sending reminder notification");
            }
        });

        if self.session.is_active() && self.session.event().map(|e| e.id) == Some(event.id) {
            // No per-occurrence marker exists; only acknowledgment stops repeats.
            warn!(id = event.id, "Reminder re-triggered before acknowledgment");
        }
        info!(id = event.id, title = %event.title, start = %event.start_time, "Meeting reminder");
        if let Some(replaced) = self.session.open(event, now) {
            if replaced.id != event_id {
                warn!(replaced = replaced.id, id = event_id, "Unacknowledged reminder replaced");
            }
        }
        self.audio.play(Sound::Call);
        delivery
    }

    /// Escalation timer callback.
    pub fn poll_escalation(&mut self, now: NaiveDateTime) -> bool {
        if !self.session.escalate_if_due(now) {
            return false;
        }
        if let Some(event) = self.session.event() {
            warn!(id = event.id, title = %event.title, "You haven't joined the meeting yet");
        }
        self.audio.play(Sound::Bell);
        true
    }

    pub fn acknowledge(&mut self) -> Result<Option<EventId>, StorageError> {
        self.close("acknowledged")
    }

    /// Same effect as `acknowledge`: the event never alerts again.
    pub fn dismiss(&mut self) -> Result<Option<EventId>, StorageError> {
        self.close("dismissed")
    }

    pub fn shutdown(&self) {
        self.audio.stop_all();
    }

    fn close(&mut self, action: &str) -> Result<Option<EventId>, StorageError> {
        let Some(event) = self.session.close() else {
            return Ok(None);
        };
        self.audio.stop_all();
        self.store.acknowledge(event.id)?;
        info!(id = event.id, title = %event.title, action, "Reminder closed");
        Ok(Some(event.id))
    }
}
