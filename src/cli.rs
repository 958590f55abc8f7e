use std::error::Error;

use clap::{Parser, Subcommand};
use inquire::{Select, Text};

use crate::clock::Clock;
use crate::config::AppConfig;
use crate::models::event::{EventId, WEEKDAY_LABELS};
use crate::runtime;
use crate::service::event_service::{EventForm, EventService};

#[derive(Parser)]
#[command(about = "Weekly calendar with meeting reminders")]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Watch the calendar and raise reminders.
    Run,
    /// Create an event. Incomplete events are skipped.
    Add {
        #[arg(long, default_value = "")]
        title: String,
        #[arg(long, default_value = "")]
        start: String,
        #[arg(long, default_value = "")]
        end: String,
        /// 1-7 with 1 = Sunday, or a weekday name.
        #[arg(long, default_value = "1")]
        day: String,
        #[arg(long, default_value = "")]
        location: String,
        #[arg(long, default_value = "")]
        description: String,
        /// Comma separated.
        #[arg(long, default_value = "")]
        attendees: String,
        #[arg(long, default_value = "")]
        organizer: String,
        #[arg(long, default_value = "")]
        color: String,
    },
    /// Create an event interactively.
    Create,
    Remove {
        id: EventId,
    },
    List,
    /// Forget every acknowledgment so events alert again.
    ResetAcks,
    /// Send the built-in test reminder once, then exit.
    TestNotification,
    /// Create an event starting one minute from now.
    AddTestEvent,
}

pub async fn cli(config: AppConfig) -> Result<(), Box<dyn Error>> {
    // Fine to exit on bad arguments here
    let cli = Cli::parse();
    match cli.command {
        Commands::Run => runtime::run_daemon(&config).await,
        Commands::TestNotification => {
            let id = runtime::run_test_notification(&config).await?;
            println!("Sent test notification for event {}", id);
            Ok(())
        }
        Commands::Add {
            title,
            start,
            end,
            day,
            location,
            description,
            attendees,
            organizer,
            color,
        } => {
            let form = EventForm {
                title,
                start_time: start,
                end_time: end,
                day,
                location,
                description,
                attendees,
                organizer,
                color,
            };
            create(&config, form)
        }
        Commands::Create => {
            let form = prompt_event_form()?;
            create(&config, form)
        }
        Commands::Remove { id } => {
            let mut store = runtime::open_store(&config);
            let title = store.get(id).map(|event| event.title.clone());
            if store.remove(id)? {
                println!("Removed event {} ({})", id, title.unwrap_or_default());
            } else {
                println!("No event with id {}", id);
            }
            Ok(())
        }
        Commands::List => {
            let store = runtime::open_store(&config);
            println!("{}", EventService::render_week(&store));
            Ok(())
        }
        Commands::ResetAcks => {
            let mut store = runtime::open_store(&config);
            store.reset_acknowledgments()?;
            println!("Cleared all acknowledged events");
            Ok(())
        }
        Commands::AddTestEvent => {
            let now = runtime::build_clock(&config)?.now();
            let mut store = runtime::open_store(&config);
            let event = store.add(EventService::test_event_for_now(now))?;
            println!(
                "Created test event {} at {} ({})",
                event.id,
                event.start_time,
                event.weekday_label()
            );
            Ok(())
        }
    }
}

fn create(config: &AppConfig, form: EventForm) -> Result<(), Box<dyn Error>> {
    let mut store = runtime::open_store(config);
    if let Some(event) = EventService::create(&mut store, form)? {
        println!("Created event {} ({} {})", event.id, event.weekday_label(), event.start_time);
    }
    Ok(())
}

fn prompt_event_form() -> Result<EventForm, Box<dyn Error>> {
    let title = Text::new("Event title").prompt()?;
    let day = Select::new("Day", WEEKDAY_LABELS.to_vec()).prompt()?;
    let start_time = Text::new("Start time (HH:MM)").prompt()?;
    let end_time = Text::new("End time (HH:MM)").prompt()?;
    let location = Text::new("Location").prompt()?;
    let description = Text::new("Description").prompt()?;
    Ok(EventForm {
        title,
        start_time,
        end_time,
        day: day.to_string(),
        location,
        description,
        ..EventForm::default()
    })
}
