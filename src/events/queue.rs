use tokio::sync::mpsc;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReminderCommand {
    /// "Join Meeting".
    Acknowledge,
    Dismiss,
    Status,
    Shutdown,
}

impl ReminderCommand {
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_ascii_lowercase().as_str() {
            "ack" | "acknowledge" | "join" | "j" => Some(Self::Acknowledge),
            "dismiss" | "d" => Some(Self::Dismiss),
            "status" | "s" => Some(Self::Status),
            "quit" | "exit" | "q" => Some(Self::Shutdown),
            _ => None,
        }
    }
}

#[derive(Clone)]
pub struct CommandBus {
    tx: mpsc::Sender<ReminderCommand>,
}

impl CommandBus {
    pub fn new(buffer: usize) -> (Self, mpsc::Receiver<ReminderCommand>) {
        let (tx, rx) = mpsc::channel(buffer);
        (Self { tx }, rx)
    }

    /// Returns false once the reminder loop has gone away.
    pub async fn emit(&self, command: ReminderCommand) -> bool {
        if self.tx.send(command).await.is_err() {
            debug!(?command, "Reminder loop closed, dropping command");
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_aliases() {
        assert_eq!(ReminderCommand::parse(" Join "), Some(ReminderCommand::Acknowledge));
        assert_eq!(ReminderCommand::parse("dismiss"), Some(ReminderCommand::Dismiss));
        assert_eq!(ReminderCommand::parse("q"), Some(ReminderCommand::Shutdown));
        assert_eq!(ReminderCommand::parse("snooze"), None);
    }

    #[tokio::test]
    async fn emit_reports_closed_receiver() {
        let (bus, rx) = CommandBus::new(1);
        drop(rx);
        assert!(!bus.emit(ReminderCommand::Status).await);
    }
}
