//! Flat `key=value` property files.
//!
//! Every command reads its paths from one such file (`config.ini` by
//! default). Lines starting with `#` are comments, lines without `=` are
//! ignored, and the first occurrence of a key wins.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use thiserror::Error;

pub const SOURCE_PATH: &str = "source-path";
pub const OUTPUT_PATH: &str = "output-path";
pub const SYNONYM_PATH: &str = "synonym-path";
pub const AUDIO_CONFIG_DIR: &str = "audio-config-dir";
pub const AUDIO_CONFIG_FILE_NAME: &str = "audio-config-file-name";
pub const TTS_ENGINE: &str = "tts-engine";
pub const TTS_CONFIG: &str = "tts-config";
pub const PLAYER: &str = "player";
pub const LAST_LESSON: &str = "last-lesson";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing property '{key}' in {}", path.display())]
    Missing { key: String, path: PathBuf },
}

/// Properties loaded from one file.
#[derive(Debug, Clone, Default)]
pub struct Properties {
    path: PathBuf,
    entries: Vec<(String, String)>,
}

impl Properties {
    /// Load a property file. A missing file yields an empty set.
    pub fn load(path: &Path) -> Result<Self> {
        let entries = if path.exists() {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config: {}", path.display()))?;
            parse_entries(&text)
        } else {
            log::warn!("Config file not found: {}", path.display());
            Vec::new()
        };
        Ok(Self {
            path: path.to_path_buf(),
            entries,
        })
    }

    pub fn parse(path: &Path, text: &str) -> Self {
        Self {
            path: path.to_path_buf(),
            entries: parse_entries(text),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn get_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.get(key).unwrap_or(default)
    }

    pub fn require(&self, key: &str) -> Result<&str, ConfigError> {
        self.get(key).ok_or_else(|| ConfigError::Missing {
            key: key.to_string(),
            path: self.path.clone(),
        })
    }

    /// Path-valued property, resolved relative to the current directory.
    pub fn require_path(&self, key: &str) -> Result<PathBuf, ConfigError> {
        self.require(key).map(PathBuf::from)
    }

    /// Set `key` to `value` and write the file back.
    ///
    /// The first line holding the key is rewritten in place; an absent key
    /// is appended. Nothing is written when the value is unchanged.
    pub fn update(&mut self, key: &str, value: &str) -> Result<()> {
        if self.get(key) == Some(value) {
            return Ok(());
        }

        let text = if self.path.exists() {
            std::fs::read_to_string(&self.path)
                .with_context(|| format!("Failed to read config: {}", self.path.display()))?
        } else {
            String::new()
        };
        let updated = update_text(&text, key, value);
        std::fs::write(&self.path, updated)
            .with_context(|| format!("Failed to write config: {}", self.path.display()))?;

        match self.entries.iter_mut().find(|(k, _)| k == key) {
            Some(entry) => entry.1 = value.to_string(),
            None => self.entries.push((key.to_string(), value.to_string())),
        }
        Ok(())
    }
}

fn parse_line(line: &str) -> Option<(&str, &str)> {
    if line.starts_with('#') {
        return None;
    }
    let line = line.trim();
    let (key, value) = line.split_once('=')?;
    let key = key.trim();
    if key.is_empty() {
        return None;
    }
    Some((key, value.trim()))
}

fn parse_entries(text: &str) -> Vec<(String, String)> {
    text.lines()
        .filter_map(parse_line)
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn update_text(text: &str, key: &str, value: &str) -> String {
    let mut out = String::with_capacity(text.len() + key.len() + value.len() + 2);
    let mut replaced = false;
    for line in text.split_inclusive('\n') {
        let hit = !replaced && parse_line(line).map(|(k, _)| k == key).unwrap_or(false);
        if hit {
            let ending = if line.ends_with("\r\n") {
                "\r\n"
            } else if line.ends_with('\n') {
                "\n"
            } else {
                ""
            };
            out.push_str(&format!("{}={}{}", key, value, ending));
            replaced = true;
        } else {
            out.push_str(line);
        }
    }
    if !replaced {
        if !out.is_empty() && !out.ends_with('\n') {
            out.push('\n');
        }
        out.push_str(&format!("{}={}\n", key, value));
    }
    out
}
