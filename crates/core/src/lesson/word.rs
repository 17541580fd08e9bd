use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;

use crate::audio::playback::Player;
use crate::cache;
use crate::tts::Speaker;
use crate::types::LessonEntry;

/// A speech engine paired with the player used for generated clips.
pub struct Voice<'a> {
    speaker: &'a mut dyn Speaker,
    player: Player,
}

impl<'a> Voice<'a> {
    pub fn new(speaker: &'a mut dyn Speaker, player: Player) -> Self {
        Self { speaker, player }
    }

    /// Speak `text` in `language`. Blank text is skipped.
    pub fn say(&mut self, text: &str, language: &str, speed: f64) -> Result<()> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(());
        }
        self.speaker.set_language(language)?;
        self.speaker.say(text, speed)
    }

    /// Audio for `text` under `dir`, synthesized only when not cached yet.
    pub fn generate(
        &mut self,
        dir: &Path,
        text: &str,
        language: &str,
        speed: f64,
    ) -> Result<Option<PathBuf>> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(None);
        }
        if let Some(path) = cache::get_cached_audio(dir, text, self.speaker.extension()) {
            return Ok(Some(path));
        }
        self.speaker.set_language(language)?;
        let path = self
            .speaker
            .generate(&cache::audio_prefix(dir, text), text, speed)?;
        Ok(Some(path))
    }

    pub fn play(&self, path: &Path, speed: f64) -> Result<()> {
        self.player.play(path, speed)
    }
}

/// One lesson entry bound to its audio cache directory.
#[derive(Debug, Clone, PartialEq)]
pub struct Word {
    pub chinese: String,
    pub english: String,
    pub explanation: String,
    pub samples: Vec<String>,
    letters: Vec<char>,
    cache_dir: PathBuf,
}

impl Word {
    pub fn from_entry(entry: &LessonEntry, cache_dir: &Path) -> Self {
        let english = entry.word.trim().to_string();
        let letters = english
            .chars()
            .map(|c| c.to_ascii_lowercase())
            .filter(|c| c.is_ascii_lowercase())
            .collect();
        Self {
            chinese: entry.chinese.trim().to_string(),
            english,
            explanation: entry.explanation.trim().to_string(),
            samples: entry.samples.clone(),
            letters,
            cache_dir: cache_dir.to_path_buf(),
        }
    }

    /// Lower-cased ASCII letters of the English word.
    pub fn letters(&self) -> &[char] {
        &self.letters
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    pub fn sample(&self, index: usize) -> &str {
        self.samples.get(index).map(String::as_str).unwrap_or("")
    }

    pub fn say(&self, voice: &mut Voice, text: &str, language: &str, speed: f64) -> Result<()> {
        voice.say(text, language, speed)
    }

    pub fn generate(
        &self,
        voice: &mut Voice,
        text: &str,
        language: &str,
        speed: f64,
    ) -> Result<Option<PathBuf>> {
        voice.generate(&self.cache_dir, text, language, speed)
    }

    pub fn play_chinese(&self, voice: &mut Voice) -> Result<()> {
        voice.say(&self.chinese, "chinese", 1.0)
    }

    pub fn play_english(&self, voice: &mut Voice) -> Result<()> {
        voice.say(&self.english, "english", 1.0)
    }

    pub fn play_explanation(&self, voice: &mut Voice) -> Result<()> {
        voice.say(&self.explanation, "english", 1.0)
    }

    pub fn play_sample(&self, voice: &mut Voice, index: usize) -> Result<()> {
        voice.say(self.sample(index), "english", 1.0)
    }

    /// Spell the word, one cached clip per letter.
    pub fn play_letters(&self, voice: &mut Voice, gap: Duration) -> Result<()> {
        for letter in &self.letters {
            if let Some(path) = self.generate(voice, &letter.to_string(), "english", 1.0)? {
                voice.play(&path, 1.0)?;
            }
            std::thread::sleep(gap);
        }
        Ok(())
    }
}
