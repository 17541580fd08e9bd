//! Audio file playback.
//!
//! The default backend shells out to an external player with tempo-preserving
//! speed control; the native backend decodes through rodio.

use std::path::Path;
use std::process::Command;

use anyhow::{bail, Context, Result};

/// Default external player command.
pub const DEFAULT_PLAYER: &str = "mplayer";

#[derive(Debug, Clone, PartialEq)]
pub enum Player {
    /// `<command> -af scaletempo -speed <speed> <path>`
    External { command: String },
    /// Decode and play in-process through the default output device.
    Native,
}

impl Default for Player {
    fn default() -> Self {
        Player::External {
            command: DEFAULT_PLAYER.to_string(),
        }
    }
}

impl Player {
    /// Pick a backend from the `player` property: `native`, or the name of
    /// an external player command.
    pub fn from_name(name: &str) -> Self {
        match name {
            "native" => Player::Native,
            "" => Player::default(),
            command => Player::External {
                command: command.to_string(),
            },
        }
    }

    /// Play a file to completion at `speed` (1.0 = normal).
    pub fn play(&self, path: &Path, speed: f64) -> Result<()> {
        if !path.exists() {
            bail!("Audio file not found: {}", path.display());
        }
        match self {
            Player::External { command } => play_external(command, path, speed),
            Player::Native => play_native(path, speed),
        }
    }
}

/// Arguments passed to the external player.
fn external_args(path: &Path, speed: f64) -> Vec<String> {
    vec![
        "-af".to_string(),
        "scaletempo".to_string(),
        "-speed".to_string(),
        format!("{}", speed),
        path.to_string_lossy().to_string(),
    ]
}

fn play_external(command: &str, path: &Path, speed: f64) -> Result<()> {
    let output = Command::new(command)
        .args(external_args(path, speed))
        .output()
        .with_context(|| format!("Failed to run player '{}'", command))?;
    if !output.status.success() {
        bail!(
            "Player '{}' failed ({}) on {}: {}",
            command,
            output.status,
            path.display(),
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }
    Ok(())
}

#[cfg(feature = "native-playback")]
fn play_native(path: &Path, speed: f64) -> Result<()> {
    use rodio::{Decoder, OutputStream, Sink};
    use std::io::BufReader;

    let (_stream, stream_handle) =
        OutputStream::try_default().context("Failed to open audio output device")?;
    let sink = Sink::try_new(&stream_handle).context("Failed to create audio sink")?;

    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open: {}", path.display()))?;
    let source = Decoder::new(BufReader::new(file))
        .with_context(|| format!("Unsupported audio format: {}", path.display()))?;

    sink.set_speed(speed as f32);
    sink.append(source);
    sink.sleep_until_end();

    Ok(())
}

#[cfg(not(feature = "native-playback"))]
fn play_native(path: &Path, _speed: f64) -> Result<()> {
    bail!(
        "Native playback of {} requires the 'native-playback' feature",
        path.display()
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_name() {
        assert_eq!(Player::from_name("native"), Player::Native);
        assert_eq!(Player::from_name(""), Player::default());
        assert_eq!(
            Player::from_name("mpv"),
            Player::External { command: "mpv".to_string() }
        );
    }

    #[test]
    fn test_external_args() {
        let args = external_args(Path::new("/tmp/a b.mp3"), 0.8);
        assert_eq!(args, vec!["-af", "scaletempo", "-speed", "0.8", "/tmp/a b.mp3"]);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let err = Player::default()
            .play(Path::new("/nonexistent/recite.wav"), 1.0)
            .unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_missing_player_command_is_an_error() {
        let dir = std::env::temp_dir().join(format!("recite_player_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("clip.wav");
        std::fs::write(&path, b"RIFF").unwrap();

        let player = Player::from_name("recite-no-such-player");
        assert!(player.play(&path, 1.0).is_err());

        std::fs::remove_dir_all(&dir).ok();
    }
}
