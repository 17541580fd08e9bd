//! Synonym dictionary pages: parsing scanned pages into tab-delimited
//! chapter files, tracking parse state, studying pairs and exporting JSON.

pub mod book;
pub mod chapter;
pub mod dictionary;
pub mod page;

use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::types::{AudioSpan, SynonymRecord};

pub use book::SynonymBook;
pub use chapter::SynonymChapter;
pub use dictionary::{ParseSummary, SynonymDictionary};
pub use page::SynonymPage;

/// One side of a synonym pair.
#[derive(Debug, Clone, PartialEq)]
pub struct Synonym {
    pub word: String,
    pub explanation: String,
    pub audio: AudioSpan,
}

impl Synonym {
    pub fn new(word: &str, explanation: &str, audio: AudioSpan) -> Self {
        Self {
            word: word.trim().to_string(),
            explanation: explanation.trim().to_string(),
            audio,
        }
    }

    /// Build the export record of a pair, keyed `<word1>---<word2>`.
    ///
    /// The pair is ordered so that `word1 <= word2`.
    pub fn to_record(self, other: Synonym, chapter: Option<u32>) -> (String, SynonymRecord) {
        let (first, second) = if self.word > other.word {
            (other, self)
        } else {
            (self, other)
        };
        let key = record_key(&first.word, &second.word);
        let record = SynonymRecord {
            audio1: first.audio,
            audio2: second.audio,
            chapter,
            explanation1: first.explanation,
            explanation2: second.explanation,
            word1: first.word,
            word2: second.word,
        };
        (key, record)
    }
}

fn key_part(word: &str) -> String {
    word.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

pub fn record_key(word1: &str, word2: &str) -> String {
    format!("{}---{}", key_part(word1), key_part(word2))
}

/// Pretty JSON with 4-space indentation. Map keys come out sorted when the
/// value uses `BTreeMap`s and structs declare fields alphabetically.
pub(crate) fn to_pretty_json<T: Serialize>(value: &T) -> Result<String> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut serializer)?;
    Ok(String::from_utf8(buf)?)
}

pub(crate) fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = to_pretty_json(value)?;
    crate::cache::atomic_write(path, json.as_bytes())
        .with_context(|| format!("Failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    fn span(a: &str, b: &str) -> AudioSpan {
        (a.to_string(), b.to_string())
    }

    #[test]
    fn test_to_record_orders_pair() {
        let zeal = Synonym::new(" zeal ", "热情", span("3.0", "4.0"));
        let ardor = Synonym::new("ardor", " 热忱 ", span("1.0", "2.0"));
        let (key, record) = zeal.to_record(ardor, Some(6));
        assert_eq!(key, "ardor---zeal");
        assert_eq!(record.word1, "ardor");
        assert_eq!(record.explanation1, "热忱");
        assert_eq!(record.audio1, span("1.0", "2.0"));
        assert_eq!(record.word2, "zeal");
        assert_eq!(record.audio2, span("3.0", "4.0"));
        assert_eq!(record.chapter, Some(6));
    }

    #[test]
    fn test_record_key_replaces_punctuation() {
        assert_eq!(record_key("give up", "let's go"), "give_up---let_s_go");
        assert_eq!(record_key("café", "a-b"), "caf_---a_b");
    }

    #[test]
    fn test_pretty_json_indent_and_order() {
        let mut map = BTreeMap::new();
        map.insert("b", 2);
        map.insert("a", 1);
        assert_eq!(to_pretty_json(&map).unwrap(), "{\n    \"a\": 1,\n    \"b\": 2\n}");
    }
}
