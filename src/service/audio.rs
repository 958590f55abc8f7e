use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Mutex;

use tokio::process::{Child, Command};
use tracing::{debug, error, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sound {
    /// Played when a reminder opens.
    Call,
    /// Played when a reminder escalates.
    Bell,
}

impl Sound {
    pub fn name(&self) -> &'static str {
        match self {
            Sound::Call => "call",
            Sound::Bell => "bell",
        }
    }
}

/// Fire-and-forget playback. Implementations log failures instead of
/// returning them.
pub trait AudioPlayer: Send + Sync {
    /// Starts `sound` from the beginning, restarting it if already playing.
    fn play(&self, sound: Sound);
    fn stop_all(&self);
}

/// Plays assets by spawning an external player such as `paplay` or `afplay`.
/// Must be used inside a tokio runtime.
pub struct CommandAudioPlayer {
    program: String,
    assets: HashMap<Sound, PathBuf>,
    playing: Mutex<HashMap<Sound, Child>>,
}

impl CommandAudioPlayer {
    pub fn new(program: impl Into<String>, call: PathBuf, bell: PathBuf) -> Self {
        let assets = HashMap::from([(Sound::Call, call), (Sound::Bell, bell)]);
        Self {
            program: program.into(),
            assets,
            playing: Mutex::new(HashMap::new()),
        }
    }

    // Dropped children are reaped by the runtime, so nothing waits here.
    fn stop(playing: &mut HashMap<Sound, Child>, sound: Sound) {
        if let Some(mut child) = playing.remove(&sound) {
            if let Err(err) = child.start_kill() {
                debug!(sound = sound.name(), error = %err, "Player already exited");
            }
        }
    }

    fn reap_finished(playing: &mut HashMap<Sound, Child>) {
        playing.retain(|sound, child| match child.try_wait() {
            Ok(None) => true,
            Ok(Some(status)) => {
                debug!(sound = sound.name(), %status, "Sound finished");
                false
            }
            Err(err) => {
                warn!(sound = sound.name(), error = %err, "Lost track of player");
                false
            }
        });
    }
}

impl AudioPlayer for CommandAudioPlayer {
    fn play(&self, sound: Sound) {
        let Some(path) = self.assets.get(&sound) else {
            warn!(sound = sound.name(), "No asset configured");
            return;
        };
        if !path.exists() {
            error!(sound = sound.name(), path = %path.display(), "Error playing sound: asset missing");
            return;
        }
        let Ok(mut playing) = self.playing.lock() else {
            error!("Audio state poisoned");
            return;
        };
        Self::reap_finished(&mut playing);
        Self::stop(&mut playing, sound);
        match Command::new(&self.program)
            .arg(path)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
        {
            Ok(child) => {
                debug!(sound = sound.name(), "Playing sound");
                playing.insert(sound, child);
            }
            Err(err) => {
                error!(sound = sound.name(), program = %self.program, error = %err, "Error playing sound");
            }
        }
    }

    fn stop_all(&self) {
        let Ok(mut playing) = self.playing.lock() else {
            error!("Audio state poisoned");
            return;
        };
        Self::reap_finished(&mut playing);
        for sound in [Sound::Call, Sound::Bell] {
            Self::stop(&mut playing, sound);
        }
    }
}

/// Records calls instead of playing anything.
#[derive(Default)]
pub struct RecordingAudioPlayer {
    log: Mutex<Vec<AudioCall>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioCall {
    Play(Sound),
    StopAll,
}

impl RecordingAudioPlayer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<AudioCall> {
        self.log.lock().map(|log| log.clone()).unwrap_or_default()
    }

    pub fn played(&self, sound: Sound) -> usize {
        self.calls()
            .iter()
            .filter(|call| **call == AudioCall::Play(sound))
            .count()
    }
}

impl AudioPlayer for RecordingAudioPlayer {
    fn play(&self, sound: Sound) {
        debug!(sound = sound.name(), "Sound requested");
        if let Ok(mut log) = self.log.lock() {
            log.push(AudioCall::Play(sound));
        }
    }

    fn stop_all(&self) {
        if let Ok(mut log) = self.log.lock() {
            log.push(AudioCall::StopAll);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_asset_is_logged_not_fatal() {
        let player = CommandAudioPlayer::new(
            "definitely-not-a-player",
            PathBuf::from("/nonexistent/call.mp3"),
            PathBuf::from("/nonexistent/bell.mp3"),
        );
        player.play(Sound::Call);
        player.stop_all();
        assert!(player.playing.lock().unwrap().is_empty());
    }

    fn temp_asset() -> PathBuf {
        let asset = std::env::temp_dir().join(format!("calendar_reminder_{}.mp3", uuid::Uuid::new_v4()));
        std::fs::write(&asset, b"").unwrap();
        asset
    }

    #[tokio::test]
    async fn missing_player_program_is_logged_not_fatal() {
        let asset = temp_asset();
        let player = CommandAudioPlayer::new("definitely-not-a-player", asset.clone(), asset.clone());

        player.play(Sound::Bell);
        assert!(player.playing.lock().unwrap().is_empty());
        let _ = std::fs::remove_file(asset);
    }

    #[tokio::test]
    async fn finished_player_is_reaped() {
        let asset = temp_asset();
        let player = CommandAudioPlayer::new("true", asset.clone(), asset.clone());

        player.play(Sound::Call);
        assert_eq!(player.playing.lock().unwrap().len(), 1);

        for _ in 0..100 {
            let empty = {
                let mut playing = player.playing.lock().unwrap();
                CommandAudioPlayer::reap_finished(&mut playing);
                playing.is_empty()
            };
            if empty {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        }
        assert!(player.playing.lock().unwrap().is_empty());
        let _ = std::fs::remove_file(asset);
    }

    #[test]
    fn recording_player_counts_plays() {
        let player = RecordingAudioPlayer::new();
        player.play(Sound::Call);
        player.play(Sound::Call);
        player.stop_all();
        assert_eq!(player.played(Sound::Call), 2);
        assert_eq!(player.played(Sound::Bell), 0);
        assert_eq!(player.calls().last(), Some(&AudioCall::StopAll));
    }
}
