//! Text-to-speech backends.
//!
//! Two engines share the [`Speaker`] interface:
//! - `local`: a command-line speech engine (espeak-ng by default),
//! - `remote`: an HTTP API with md5-signed requests.

pub mod local;
#[cfg(feature = "remote-tts")]
pub mod remote;

use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use serde::Deserialize;
use thiserror::Error;

use crate::audio::playback::Player;

pub use local::LocalTts;
#[cfg(feature = "remote-tts")]
pub use remote::RemoteTts;

/// Words per minute at speed 1.0.
pub const DEFAULT_RATE: f64 = 200.0;

pub const DEFAULT_LOCAL_CONFIG: &str = "templates/local-tts.json";
pub const DEFAULT_REMOTE_CONFIG: &str = "templates/tts.json";

#[derive(Debug, Error)]
pub enum TtsError {
    #[error("unsupported language '{0}'")]
    UnsupportedLanguage(String),
    #[error("no voices configured for language '{0}'")]
    NoVoices(String),
    #[error("no language selected")]
    LanguageNotSet,
    #[error("text is {len} characters, the engine accepts at most {max}")]
    TextTooLong { len: usize, max: usize },
}

/// A speech engine.
pub trait Speaker {
    /// Short engine name ("local", "remote").
    fn name(&self) -> &str;

    /// Select the language by its configured name (case-insensitive).
    fn set_language(&mut self, language: &str) -> Result<(), TtsError>;

    /// Extension of the files written by [`Speaker::generate`].
    fn extension(&self) -> &str;

    /// Synthesize `text` into `<prefix>.<extension>` and return that path.
    fn generate(&mut self, prefix: &Path, text: &str, speed: f64) -> Result<PathBuf>;

    /// Speak `text` right away.
    fn say(&mut self, text: &str, speed: f64) -> Result<()>;
}

/// Round-robin voice selection. Every utterance advances to the next voice.
#[derive(Debug, Clone, Default)]
pub struct VoiceRotation {
    index: Option<usize>,
}

impl VoiceRotation {
    pub fn reset(&mut self) {
        self.index = None;
    }

    /// Advance and return the voice index to use, given `count` voices.
    pub fn advance(&mut self, count: usize) -> Option<usize> {
        if count == 0 {
            return None;
        }
        let next = match self.index {
            None => 0,
            Some(i) if i + 1 >= count => 0,
            Some(i) => i + 1,
        };
        self.index = Some(next);
        Some(next)
    }
}

/// A configured language with its voices.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Language {
    pub name: String,
    /// Engine-side language id (remote engine only)
    #[serde(rename = "languageId", default)]
    pub language_id: String,
    #[serde(rename = "voiceIds")]
    pub voice_ids: Vec<String>,
}

/// Case-insensitive lookup of a language by name.
pub fn find_language<'a>(languages: &'a [Language], name: &str) -> Result<&'a Language, TtsError> {
    let wanted = name.to_lowercase();
    languages
        .iter()
        .find(|l| l.name.to_lowercase() == wanted)
        .ok_or_else(|| TtsError::UnsupportedLanguage(name.to_string()))
}

/// Build a speech engine by name.
///
/// - "local": command-line engine, configured by `config` or
///   [`DEFAULT_LOCAL_CONFIG`].
/// - "remote": HTTP engine, configured by `config` or
///   [`DEFAULT_REMOTE_CONFIG`]; clips are cached under `cache_dir` and played
///   with `player`.
pub fn get_speaker(
    engine: &str,
    config: Option<&Path>,
    player: Player,
    cache_dir: &Path,
) -> Result<Box<dyn Speaker>> {
    match engine {
        "local" => {
            let path = config.unwrap_or(Path::new(DEFAULT_LOCAL_CONFIG));
            Ok(Box::new(LocalTts::load(path)?))
        }
        #[cfg(feature = "remote-tts")]
        "remote" => {
            let path = config.unwrap_or(Path::new(DEFAULT_REMOTE_CONFIG));
            Ok(Box::new(RemoteTts::load(path, player, cache_dir)?))
        }
        #[cfg(not(feature = "remote-tts"))]
        "remote" => {
            let _ = (player, cache_dir);
            bail!("The remote TTS engine requires the 'remote-tts' feature");
        }
        other => bail!("Unknown TTS engine '{}' (expected 'local' or 'remote')", other),
    }
}
