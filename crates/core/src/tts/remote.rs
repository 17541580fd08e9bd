//! Remote TTS over HTTP.
//!
//! Each request carries an md5 checksum over the engine id, language,
//! voice, text, encoding flag, extension, account and secret. Synthesis is
//! two GETs: a preparation call, then the download of the audio file.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use md5::{Digest, Md5};
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

use super::{find_language, Language, Speaker, TtsError, VoiceRotation};
use crate::audio::playback::Player;
use crate::cache;

/// Contents of `templates/tts.json`.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteTtsConfig {
    pub url: String,
    #[serde(rename = "accountId")]
    pub account_id: String,
    #[serde(rename = "secretId")]
    pub secret_id: String,
    #[serde(rename = "max-length", deserialize_with = "number_or_string")]
    pub max_length: usize,
    /// Fixed query parameters of the preparation request
    pub preparation: Map<String, Value>,
    /// Fixed query parameters of the download request
    pub download: Map<String, Value>,
    pub languages: Vec<Language>,
}

fn number_or_string<'de, D>(deserializer: D) -> std::result::Result<usize, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Number(n) => n
            .as_u64()
            .map(|n| n as usize)
            .ok_or_else(|| serde::de::Error::custom("max-length must be a positive integer")),
        Value::String(s) => s.trim().parse().map_err(serde::de::Error::custom),
        other => Err(serde::de::Error::custom(format!(
            "max-length must be a number, got {}",
            other
        ))),
    }
}

/// Plain text of a parameter value (strings without quotes).
fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn param(section: &Map<String, Value>, key: &str) -> String {
    section.get(key).map(value_text).unwrap_or_default()
}

/// Request checksum: md5 over EID, LID, VID, TXT, IS_UTF8, EXT, ACC, secret.
pub fn checksum(
    preparation: &Map<String, Value>,
    language_id: &str,
    voice_id: &str,
    text: &str,
    account_id: &str,
    secret_id: &str,
) -> String {
    let mut hasher = Md5::new();
    hasher.update(param(preparation, "EID").as_bytes());
    hasher.update(language_id.as_bytes());
    hasher.update(voice_id.as_bytes());
    hasher.update(text.as_bytes());
    hasher.update(param(preparation, "IS_UTF8").as_bytes());
    hasher.update(param(preparation, "EXT").as_bytes());
    hasher.update(account_id.as_bytes());
    hasher.update(secret_id.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// The section's fixed parameters plus the per-request signed fields.
pub fn signed_params(
    section: &Map<String, Value>,
    language_id: &str,
    voice_id: &str,
    account_id: &str,
    text: &str,
    checksum: &str,
) -> Vec<(String, String)> {
    let mut params = section.clone();
    params.insert("LID".into(), Value::from(language_id));
    params.insert("VID".into(), Value::from(voice_id));
    params.insert("ACC".into(), Value::from(account_id));
    params.insert("TXT".into(), Value::from(text));
    params.insert("CS".into(), Value::from(checksum));
    params.iter().map(|(k, v)| (k.clone(), value_text(v))).collect()
}

/// Append url-encoded parameters to the configured base URL.
pub fn build_url(base: &str, params: &[(String, String)]) -> Result<reqwest::Url> {
    let mut url = reqwest::Url::parse(base)
        .with_context(|| format!("Invalid TTS url: {}", base))?;
    url.query_pairs_mut().extend_pairs(params);
    Ok(url)
}

pub struct RemoteTts {
    config: RemoteTtsConfig,
    language: Option<Language>,
    rotation: VoiceRotation,
    client: reqwest::blocking::Client,
    player: Player,
    cache_dir: PathBuf,
}

impl RemoteTts {
    pub fn new(config: RemoteTtsConfig, player: Player, cache_dir: &Path) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            config,
            language: None,
            rotation: VoiceRotation::default(),
            client,
            player,
            cache_dir: cache_dir.to_path_buf(),
        })
    }

    pub fn load(path: &Path, player: Player, cache_dir: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read TTS config: {}", path.display()))?;
        let config: RemoteTtsConfig = serde_json::from_str(&data)
            .with_context(|| format!("Invalid TTS config: {}", path.display()))?;
        Self::new(config, player, cache_dir)
    }

    fn next_voice(&mut self) -> Result<(String, String), TtsError> {
        let language = self.language.as_ref().ok_or(TtsError::LanguageNotSet)?;
        let index = self
            .rotation
            .advance(language.voice_ids.len())
            .ok_or_else(|| TtsError::NoVoices(language.name.clone()))?;
        Ok((language.language_id.clone(), language.voice_ids[index].clone()))
    }

    fn get(&self, url: reqwest::Url) -> Result<reqwest::blocking::Response> {
        log::debug!("GET {}", url);
        let response = self
            .client
            .get(url.clone())
            .send()
            .with_context(|| format!("Request failed: {}", url))?;
        if !response.status().is_success() {
            bail!("TTS request failed: HTTP {} for {}", response.status(), url);
        }
        Ok(response)
    }
}

impl Speaker for RemoteTts {
    fn name(&self) -> &str {
        "remote"
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
        match self.config.download.get("EXT").or_else(|| self.config.preparation.get("EXT")) {
            Some(Value::String(ext)) if !ext.is_empty() => ext,
            _ => "mp3",
        }
    }

    fn generate(&mut self, prefix: &Path, text: &str, _speed: f64) -> Result<PathBuf> {
        let len = text.chars().count();
        if len > self.config.max_length {
            return Err(TtsError::TextTooLong {
                len,
                max: self.config.max_length,
            }
            .into());
        }

        let (language_id, voice_id) = self.next_voice()?;
        let cfg = &self.config;
        let cs = checksum(
            &cfg.preparation,
            &language_id,
            &voice_id,
            text,
            &cfg.account_id,
            &cfg.secret_id,
        );

        let preparation = signed_params(&cfg.preparation, &language_id, &voice_id, &cfg.account_id, text, &cs);
        self.get(build_url(&cfg.url, &preparation)?)?;

        let download = signed_params(&cfg.download, &language_id, &voice_id, &cfg.account_id, text, &cs);
        let bytes = self
            .get(build_url(&cfg.url, &download)?)?
            .bytes()
            .context("Error reading TTS response")?;
        if bytes.is_empty() {
            bail!("TTS service returned no audio for {:?}", text);
        }

        let dest = prefix.with_extension(self.extension());
        let dest_dir = dest
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        std::fs::create_dir_all(&dest_dir)
            .with_context(|| format!("Failed to create directory: {}", dest_dir.display()))?;

        // Write to temp file in same directory for atomic rename
        let mut tmp_file = tempfile::NamedTempFile::new_in(&dest_dir)
            .context("Failed to create temp file")?;
        tmp_file.write_all(&bytes).context("Error writing audio")?;
        tmp_file.persist(&dest).map_err(|e| {
            anyhow::anyhow!("Failed to save audio to {}: {}", dest.display(), e)
        })?;

        log::debug!("Downloaded {} bytes -> {}", bytes.len(), dest.display());
        Ok(dest)
    }

    fn say(&mut self, text: &str, speed: f64) -> Result<()> {
        let path = match cache::get_cached_audio(&self.cache_dir, text, self.extension()) {
            Some(path) => path,
            None => {
                let prefix = cache::audio_prefix(&self.cache_dir, text);
                self.generate(&prefix, text, speed)?
            }
        };
        self.player.play(&path, speed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: &str = r#"{
        "url": "http://tts.example.com/api?",
        "accountId": "acc-1",
        "secretId": "s3cret",
        "max-length": "600",
        "preparation": {"EID": "2", "IS_UTF8": "1", "EXT": "mp3", "ACTION": "prepare"},
        "download": {"EID": "2", "IS_UTF8": "1", "EXT": "mp3", "ACTION": "fetch"},
        "languages": [
            {"name": "english", "languageId": "1", "voiceIds": ["3", "5"]}
        ]
    }"#;

    fn config() -> RemoteTtsConfig {
        serde_json::from_str(CONFIG).unwrap()
    }

    #[test]
    fn test_config_max_length_forms() {
        assert_eq!(config().max_length, 600);
        let numeric = CONFIG.replace(r#""max-length": "600""#, r#""max-length": 42"#);
        let cfg: RemoteTtsConfig = serde_json::from_str(&numeric).unwrap();
        assert_eq!(cfg.max_length, 42);
    }

    #[test]
    fn test_checksum_is_md5_of_concatenation() {
        let cfg = config();
        let cs = checksum(&cfg.preparation, "1", "3", "hello", "acc-1", "s3cret");
        assert_eq!(cs, cache::text_hash("213hello1mp3acc-1s3cret"));
    }

    #[test]
    fn test_signed_params_override_and_keep_fixed() {
        let cfg = config();
        let params = signed_params(&cfg.download, "1", "5", "acc-1", "hi there", "abc");
        let get = |k: &str| params.iter().find(|(key, _)| key == k).map(|(_, v)| v.as_str());
        assert_eq!(get("ACTION"), Some("fetch"));
        assert_eq!(get("LID"), Some("1"));
        assert_eq!(get("VID"), Some("5"));
        assert_eq!(get("ACC"), Some("acc-1"));
        assert_eq!(get("TXT"), Some("hi there"));
        assert_eq!(get("CS"), Some("abc"));
    }

    #[test]
    fn test_build_url_encodes_text() {
        let params = vec![("TXT".to_string(), "a b&c".to_string())];
        let url = build_url("http://tts.example.com/api?", &params).unwrap();
        assert_eq!(url.as_str(), "http://tts.example.com/api?TXT=a+b%26c");
    }

    #[test]
    fn test_text_too_long_rejected_before_network() {
        let mut cfg = config();
        cfg.max_length = 3;
        let mut tts = RemoteTts::new(cfg, Player::Native, Path::new("/tmp")).unwrap();
        tts.set_language("english").unwrap();
        let err = tts.generate(Path::new("/tmp/x"), "four", 1.0).unwrap_err();
        assert!(err.to_string().contains("at most 3"));
    }

    #[test]
    fn test_extension_from_config() {
        let tts = RemoteTts::new(config(), Player::Native, Path::new("/tmp")).unwrap();
        assert_eq!(tts.extension(), "mp3");
    }
}
