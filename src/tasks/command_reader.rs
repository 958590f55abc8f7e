use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{error, warn};

use crate::events::queue::{CommandBus, ReminderCommand};

pub const USAGE: &str = "Commands: ack | dismiss | status | quit";

/// Forwards one command per input line until EOF, a shutdown command, or
/// the reminder loop going away.
pub async fn run_command_reader<R>(reader: R, bus: CommandBus)
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => return,
            Err(err) => {
                error!(error = %err, "Failed to read command input");
                return;
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        let Some(command) = ReminderCommand::parse(&line) else {
            warn!(input = %line.trim(), "{}", USAGE);
            continue;
        };
        if !bus.emit(command).await || command == ReminderCommand::Shutdown {
            return;
        }
    }
}
