//! Local speech engine driven through its command line.
//!
//! Requires espeak-ng (or a compatible command) to be installed:
//! - macOS: `brew install espeak-ng`
//! - Linux: `apt-get install espeak-ng`

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use super::{find_language, Language, Speaker, TtsError, VoiceRotation, DEFAULT_RATE};

const DEFAULT_COMMAND: &str = "espeak-ng";

/// Contents of `templates/local-tts.json`.
#[derive(Debug, Clone, Deserialize)]
pub struct LocalTtsConfig {
    pub languages: Vec<Language>,
    #[serde(default)]
    pub command: Option<String>,
}

pub struct LocalTts {
    config: LocalTtsConfig,
    language: Option<Language>,
    rotation: VoiceRotation,
}

impl LocalTts {
    pub fn new(config: LocalTtsConfig) -> Self {
        Self {
            config,
            language: None,
            rotation: VoiceRotation::default(),
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read TTS config: {}", path.display()))?;
        let config: LocalTtsConfig = serde_json::from_str(&data)
            .with_context(|| format!("Invalid TTS config: {}", path.display()))?;
        Ok(Self::new(config))
    }

    fn command(&self) -> &str {
        self.config.command.as_deref().unwrap_or(DEFAULT_COMMAND)
    }

    /// Pick the next voice of the current language.
    fn next_voice(&mut self) -> Result<String, TtsError> {
        let language = self.language.as_ref().ok_or(TtsError::LanguageNotSet)?;
        let index = self
            .rotation
            .advance(language.voice_ids.len())
            .ok_or_else(|| TtsError::NoVoices(language.name.clone()))?;
        Ok(language.voice_ids[index].clone())
    }

    fn run(&self, args: Vec<String>, text: &str) -> Result<()> {
        let mut child = Command::new(self.command())
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("Failed to start speech engine '{}'", self.command()))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(text.as_bytes())?;
        }

        let output = child.wait_with_output()?;
        if !output.status.success() {
            bail!(
                "Speech engine '{}' failed ({}): {}",
                self.command(),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        Ok(())
    }
}

/// Engine arguments; text is fed on stdin so it is never parsed as a flag.
fn engine_args(voice: &str, speed: f64, output: Option<&Path>) -> Vec<String> {
    let rate = (DEFAULT_RATE * speed).round() as u32;
    let mut args = vec![
        "-v".to_string(),
        voice.to_string(),
        "-s".to_string(),
        rate.to_string(),
    ];
    if let Some(path) = output {
        args.push("-w".to_string());
        args.push(path.to_string_lossy().to_string());
    }
    args.push("--stdin".to_string());
    args
}

impl Speaker for LocalTts {
    fn name(&self) -> &str {
        "local"
    }

    fn set_language(&mut self, language: &str) -> Result<(), TtsError> {
        let found = find_language(&self.config.languages, language)?.clone();
        if self.language.as_ref() != Some(&found) {
            self.language = Some(found);
            self.rotation.reset();
        }
        Ok(())
    }

    fn extension(&self) -> &str {
        "wav"
    }

    fn generate(&mut self, prefix: &Path, text: &str, speed: f64) -> Result<PathBuf> {
        let voice = self.next_voice()?;
        let path = prefix.with_extension(self.extension());
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        log::debug!("Synthesizing {:?} with voice {} -> {}", text, voice, path.display());
        self.run(engine_args(&voice, speed, Some(&path)), text)?;
        Ok(path)
    }

    fn say(&mut self, text: &str, speed: f64) -> Result<()> {
        let voice = self.next_voice()?;
        self.run(engine_args(&voice, speed, None), text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> LocalTtsConfig {
        serde_json::from_str(
            r#"{
                "languages": [
                    {"name": "english", "voiceIds": ["en-us", "en-gb"]},
                    {"name": "chinese", "voiceIds": ["cmn"]},
                    {"name": "silent", "voiceIds": []}
                ]
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_engine_args_live() {
        let args = engine_args("en-us", 1.0, None);
        assert_eq!(args, vec!["-v", "en-us", "-s", "200", "--stdin"]);
    }

    #[test]
    fn test_engine_args_to_file_with_speed() {
        let args = engine_args("cmn", 0.8, Some(Path::new("/tmp/x.wav")));
        assert_eq!(args, vec!["-v", "cmn", "-s", "160", "-w", "/tmp/x.wav", "--stdin"]);
    }

    #[test]
    fn test_voice_requires_language() {
        let mut tts = LocalTts::new(config());
        assert!(matches!(tts.next_voice(), Err(TtsError::LanguageNotSet)));
    }

    #[test]
    fn test_voices_rotate_per_language() {
        let mut tts = LocalTts::new(config());
        tts.set_language("english").unwrap();
        assert_eq!(tts.next_voice().unwrap(), "en-us");
        assert_eq!(tts.next_voice().unwrap(), "en-gb");
        // Re-selecting the same language keeps the rotation going
        tts.set_language("English").unwrap();
        assert_eq!(tts.next_voice().unwrap(), "en-us");

        tts.set_language("chinese").unwrap();
        assert_eq!(tts.next_voice().unwrap(), "cmn");
    }

    #[test]
    fn test_language_without_voices() {
        let mut tts = LocalTts::new(config());
        tts.set_language("silent").unwrap();
        assert!(matches!(tts.next_voice(), Err(TtsError::NoVoices(_))));
    }

    #[test]
    fn test_default_command() {
        let tts = LocalTts::new(config());
        assert_eq!(tts.command(), "espeak-ng");
    }
}
