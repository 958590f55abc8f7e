use std::error::Error;
use std::sync::Arc;

use chrono::NaiveDateTime;
use tokio::io::BufReader;
use tracing::{error, info};

use crate::clock::{Clock, SystemClock};
use crate::config::AppConfig;
use crate::error::ConfigError;
use crate::events::queue::{CommandBus, ReminderCommand};
use crate::models::event::EventId;
use crate::service::audio::{AudioPlayer, CommandAudioPlayer};
use crate::service::event_service::EventService;
use crate::service::event_store::EventStore;
use crate::service::notifier_service::{LogNotifier, Notifier, TelegramNotifier};
use crate::service::reminder_engine::ReminderEngine;
use crate::storage::{FileStore, KeyValueStore};
use crate::tasks::command_reader::{run_command_reader, USAGE};
use crate::tasks::reminder_loop::run_reminder_loop;
use crate::tasks::task_runner::TaskRunner;

pub fn open_store(config: &AppConfig) -> EventStore<FileStore> {
    let location = config.db_location();
    info!(location = %location.display(), "Loading event store");
    EventStore::load(FileStore::new(location))
}

pub fn build_clock(config: &AppConfig) -> Result<Arc<dyn Clock>, ConfigError> {
    Ok(Arc::new(SystemClock::new(config.timezone()?)))
}

pub fn build_notifier(config: &AppConfig) -> Result<Arc<dyn Notifier>, ConfigError> {
    Ok(match config.telegram()? {
        Some(telegram) => Arc::new(TelegramNotifier::with_api_base(
            telegram.api_base,
            telegram.bot_token,
            telegram.chat_id,
        )),
        None => {
            info!("TELEGRAM_BOT_TOKEN not set, reminders will only be logged");
            Arc::new(LogNotifier)
        }
    })
}

pub fn build_audio(config: &AppConfig) -> Arc<dyn AudioPlayer> {
    let audio = config.audio();
    Arc::new(CommandAudioPlayer::new(audio.player, audio.call, audio.bell))
}

/// Runs the reminder daemon until `quit` or Ctrl-C.
pub async fn run_daemon(config: &AppConfig) -> Result<(), Box<dyn Error>> {
    let settings = config.reminder_settings()?;
    let clock = build_clock(config)?;
    let engine = ReminderEngine::new(
        open_store(config),
        &settings,
        build_notifier(config)?,
        build_audio(config),
    );

    let (bus, rx) = CommandBus::new(16);
    let mut task_runner = TaskRunner::new();
    task_runner.add_task("command-reader", {
        let bus = bus.clone();
        async move {
            run_command_reader(BufReader::new(tokio::io::stdin()), bus).await;
        }
    });
    task_runner.add_task("ctrl-c", async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            bus.emit(ReminderCommand::Shutdown).await;
        }
    });
    task_runner.start_all();

    println!("{}", USAGE);
    run_reminder_loop(engine, clock, rx, settings.tick).await;
    Ok(())
}

/// Triggers the built-in test reminder once and returns after the chat
/// delivery has finished. The `call` sound is left playing.
pub async fn run_test_notification(config: &AppConfig) -> Result<EventId, Box<dyn Error>> {
    let settings = config.reminder_settings()?;
    let now = build_clock(config)?.now();
    let mut engine = ReminderEngine::new(
        open_store(config),
        &settings,
        build_notifier(config)?,
        build_audio(config),
    );
    Ok(send_test_notification(&mut engine, now).await)
}

pub async fn send_test_notification<S: KeyValueStore>(
    engine: &mut ReminderEngine<S>,
    now: NaiveDateTime,
) -> EventId {
    let event = EventService::test_notification_event();
    let id = event.id;
    if let Err(err) = engine.trigger(event, now).await {
        error!(id, error = %err, "Test notification delivery task failed");
    }
    id
}
