use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::Duration;
use chrono_tz::Tz;

use crate::clients::telegram_client::DEFAULT_API_BASE;
use crate::error::ConfigError;
use crate::service::reminder_engine::ReminderSettings;

pub const DEFAULT_DB_LOCATION: &str = "./data";
pub const DEFAULT_AUDIO_PLAYER: &str = "paplay";
pub const DEFAULT_CALL_SOUND: &str = "./sounds/you-have-a-call.mp3";
pub const DEFAULT_BELL_SOUND: &str = "./sounds/bell-notification.mp3";

/// `KEY=VALUE` settings from an optional file, with the process environment
/// as a per-key fallback.
#[derive(Debug, Default, Clone)]
pub struct AppConfig {
    values: HashMap<String, String>,
}

#[derive(Debug, Clone)]
pub struct TelegramConfig {
    pub api_base: String,
    pub bot_token: String,
    pub chat_id: String,
}

#[derive(Debug, Clone)]
pub struct AudioConfig {
    pub player: String,
    pub call: PathBuf,
    pub bell: PathBuf,
}

impl AppConfig {
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_string(),
            source,
        })?;
        Self::parse(&content)
    }

    /// One `KEY=VALUE` per line. Blank lines and `#` comments are skipped;
    /// a value may be wrapped in double quotes.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let mut values = HashMap::new();
        for (idx, line) in content.lines().enumerate() {
            let entry = line.trim();
            if entry.is_empty() || entry.starts_with('#') {
                continue;
            }
            let (key, value) = entry.split_once('=').ok_or_else(|| ConfigError::Malformed {
                line: idx + 1,
                content: line.to_string(),
            })?;
            values.insert(key.trim().to_string(), unquote(value.trim()).to_string());
        }
        Ok(Self { values })
    }

    /// Loads the file named by `CONFIG_FILE`, or an empty config when unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        match env::var("CONFIG_FILE") {
            Ok(path) => Self::from_file(&path),
            Err(_) => Ok(Self::default()),
        }
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.values
            .get(key)
            .cloned()
            .or_else(|| env::var(key).ok())
            .filter(|value| !value.trim().is_empty())
    }

    fn parsed<T: FromStr>(&self, key: &str, default: T) -> Result<T, ConfigError> {
        match self.get(key) {
            Some(value) => value.trim().parse().map_err(|_| ConfigError::InvalidValue {
                key: key.to_string(),
                value,
            }),
            None => Ok(default),
        }
    }

    pub fn db_location(&self) -> PathBuf {
        PathBuf::from(
            self.get("DB_LOCATION")
                .unwrap_or(DEFAULT_DB_LOCATION.to_string()),
        )
    }

    pub fn debug_log(&self) -> bool {
        self.get("DEBUG_LOG")
            .map(|value| matches!(value.as_str(), "1" | "true" | "TRUE" | "yes" | "YES"))
            .unwrap_or(false)
    }

    pub fn timezone(&self) -> Result<Option<Tz>, ConfigError> {
        match self.get("TIMEZONE") {
            Some(name) => name
                .trim()
                .parse::<Tz>()
                .map(Some)
                .map_err(|_| ConfigError::InvalidValue {
                    key: "TIMEZONE".to_string(),
                    value: name,
                }),
            None => Ok(None),
        }
    }

    pub fn reminder_settings(&self) -> Result<ReminderSettings, ConfigError> {
        let tick_secs: u64 = self.parsed("TICK_SECONDS", 60)?;
        let escalation_secs: i64 = self.parsed("ESCALATION_SECONDS", 120)?;
        let tolerance_minutes: u32 = self.parsed("MATCH_TOLERANCE_MINUTES", 1)?;
        if tick_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "TICK_SECONDS".to_string(),
                value: "0".to_string(),
            });
        }
        Ok(ReminderSettings {
            tick: std::time::Duration::from_secs(tick_secs),
            escalation_delay: Duration::seconds(escalation_secs.max(0)),
            tolerance_minutes,
        })
    }

    /// `None` when no bot token is configured.
    pub fn telegram(&self) -> Result<Option<TelegramConfig>, ConfigError> {
        let Some(bot_token) = self.get("TELEGRAM_BOT_TOKEN") else {
            return Ok(None);
        };
        let chat_id = self.get("TELEGRAM_CHAT_ID").ok_or(ConfigError::InvalidValue {
            key: "TELEGRAM_CHAT_ID".to_string(),
            value: String::new(),
        })?;
        Ok(Some(TelegramConfig {
            api_base: self
                .get("TELEGRAM_API_BASE")
                .unwrap_or(DEFAULT_API_BASE.to_string()),
            bot_token,
            chat_id,
        }))
    }

    pub fn audio(&self) -> AudioConfig {
        AudioConfig {
            player: self
                .get("AUDIO_PLAYER")
                .unwrap_or(DEFAULT_AUDIO_PLAYER.to_string()),
            call: PathBuf::from(self.get("SOUND_CALL").unwrap_or(DEFAULT_CALL_SOUND.to_string())),
            bell: PathBuf::from(self.get("SOUND_BELL").unwrap_or(DEFAULT_BELL_SOUND.to_string())),
        }
    }
}

fn unquote(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|inner| inner.strip_suffix('"'))
        .unwrap_or(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_handles_comments_and_quotes() {
        let config = AppConfig::parse(
            "# reminder settings\n\
             CALREM_TEST_TOKEN=\"123:abc\"\n\
             CALREM_TEST_CHAT=42\n\
             \n\
             CALREM_TEST_TICK = 30\n",
        )
        .unwrap();
        assert_eq!(config.get("CALREM_TEST_TOKEN").as_deref(), Some("123:abc"));
        assert_eq!(config.get("CALREM_TEST_CHAT").as_deref(), Some("42"));
        assert_eq!(config.get("CALREM_TEST_TICK").as_deref(), Some("30"));
    }

    #[test]
    fn parse_rejects_lines_without_equals() {
        let err = AppConfig::parse("GOOD=1\nbroken line\n").unwrap_err();
        assert!(matches!(err, ConfigError::Malformed { line: 2, .. }));
    }

    #[test]
    fn reminder_settings_default_and_override() {
        let config = AppConfig::parse("TICK_SECONDS=30\nESCALATION_SECONDS=90\n").unwrap();
        let settings = config.reminder_settings().unwrap();
        assert_eq!(settings.tick, std::time::Duration::from_secs(30));
        assert_eq!(settings.escalation_delay, Duration::seconds(90));
        assert_eq!(settings.tolerance_minutes, 1);

        let bad = AppConfig::parse("TICK_SECONDS=soon\n").unwrap();
        assert!(matches!(
            bad.reminder_settings(),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn timezone_parses_iana_names() {
        let config = AppConfig::parse("TIMEZONE=America/New_York\n").unwrap();
        assert_eq!(config.timezone().unwrap(), Some(chrono_tz::America::New_York));

        let bad = AppConfig::parse("TIMEZONE=Mars/Olympus\n").unwrap();
        assert!(bad.timezone().is_err());
    }

    #[test]
    fn telegram_requires_chat_id_with_token() {
        let config = AppConfig::parse("TELEGRAM_BOT_TOKEN=abc\nTELEGRAM_CHAT_ID=42\n").unwrap();
        let telegram = config.telegram().unwrap().unwrap();
        assert_eq!(telegram.api_base, DEFAULT_API_BASE);
        assert_eq!(telegram.chat_id, "42");
    }
}
