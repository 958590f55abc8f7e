use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{interval_at, sleep, Instant, MissedTickBehavior};
use tracing::{debug, error, info};

use crate::clock::Clock;
use crate::error::StorageError;
use crate::events::queue::ReminderCommand;
use crate::models::event::EventId;
use crate::service::reminder_engine::ReminderEngine;
use crate::storage::KeyValueStore;

/// Drives the engine until a shutdown command arrives or every command
/// sender is gone, then hands the engine back.
///
/// Tick, escalation timer and commands are multiplexed on one task, so each
/// handler runs to completion before the next starts.
pub async fn run_reminder_loop<S: KeyValueStore>(
    mut engine: ReminderEngine<S>,
    clock: Arc<dyn Clock>,
    mut commands: mpsc::Receiver<ReminderCommand>,
    tick_period: Duration,
) -> ReminderEngine<S> {
    let mut ticker = interval_at(Instant::now() + tick_period, tick_period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    info!(period_secs = tick_period.as_secs(), "Reminder loop started");

    loop {
        let escalation_wait = engine
            .session()
            .escalation_deadline()
            .map(|deadline| (deadline - clock.now()).to_std().unwrap_or(Duration::ZERO));

        tokio::select! {
            _ = ticker.tick() => {
                engine.store_mut().refresh();
                let report = engine.tick(clock.now());
                debug!(
                    events = engine.store().events().len(),
                    triggered = report.triggered.len(),
                    "Checked upcoming events"
                );
            }
            _ = sleep(escalation_wait.unwrap_or(Duration::ZERO)), if escalation_wait.is_some() => {
                engine.poll_escalation(clock.now());
            }
            command = commands.recv() => {
                match command {
                    Some(ReminderCommand::Acknowledge) => log_close(engine.acknowledge()),
                    Some(ReminderCommand::Dismiss) => log_close(engine.dismiss()),
                    Some(ReminderCommand::Status) => log_status(&engine),
                    Some(ReminderCommand::Shutdown) | None => break,
                }
            }
        }
    }

    engine.shutdown();
    info!("Reminder loop stopped");
    engine
}

fn log_close(result: Result<Option<EventId>, StorageError>) {
    match result {
        Ok(Some(_)) => {}
        Ok(None) => info!("No active reminder"),
        Err(err) => error!(error = %err, "Failed to persist acknowledgment"),
    }
}

fn log_status<S: KeyValueStore>(engine: &ReminderEngine<S>) {
    let session = engine.session();
    match session.event() {
        Some(event) => info!(
            state = ?session.state(),
            id = event.id,
            title = %event.title,
            "Reminder status"
        ),
        None => info!(
            state = ?session.state(),
            events = engine.store().events().len(),
            acknowledged = engine.store().acknowledged().len(),
            "Reminder status"
        ),
    }
}
