use serde::{Deserialize, Serialize};

/// One vocabulary entry of a lesson file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LessonEntry {
    pub chinese: String,
    /// English word or phrase
    pub word: String,
    pub explanation: String,
    #[serde(default)]
    pub samples: Vec<String>,
}

/// A lesson file: `{"contents-list": [...]}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LessonFile {
    #[serde(rename = "contents-list")]
    pub contents: Vec<LessonEntry>,
}

/// Start and end of one entry inside a chapter recording.
///
/// Kept as text: the audio index stores whatever the recorder wrote.
pub type AudioSpan = (String, String);

/// One exported synonym pair.
///
/// Fields are declared in alphabetical order so the JSON export comes out
/// with sorted keys.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SynonymRecord {
    pub audio1: AudioSpan,
    pub audio2: AudioSpan,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chapter: Option<u32>,
    pub explanation1: String,
    pub explanation2: String,
    pub word1: String,
    pub word2: String,
}

/// Parse state of one dictionary page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ParseInfo {
    pub md5code: String,
    /// File modification time, whole seconds since the epoch
    pub timestamp: u64,
}
