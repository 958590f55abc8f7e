#![allow(non_snake_case)]

use calendarReminder::cli;
use calendarReminder::config::AppConfig;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config: {}", e);
            AppConfig::default()
        }
    };
    init_logging(&config);

    let result = cli::cli(config).await;
    if let Err(e) = &result {
        tracing::error!(error = %e, "Command failed");
    }
    // The stdin reader blocks runtime shutdown, so leave directly.
    std::process::exit(if result.is_ok() { 0 } else { 1 });
}

fn init_logging(config: &AppConfig) {
    let filter = if config.debug_log() {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
