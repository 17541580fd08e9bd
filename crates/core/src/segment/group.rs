use std::path::Path;

use anyhow::{Context, Result};

use super::phrase::Phrase;
use super::sentence::Sentence;

/// Alternating expression/explanation strings of one page.
///
/// `items[2k]` is an expression and `items[2k + 1]` its explanation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SentenceGroup {
    items: Vec<String>,
}

impl SentenceGroup {
    pub fn read(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read page: {}", path.display()))?;
        Ok(Self::parse(&text))
    }

    pub fn parse(text: &str) -> Self {
        Self::parse_with(&Sentence::default(), text)
    }

    pub fn parse_with(sentence: &Sentence, text: &str) -> Self {
        let phrase = sentence.phrase();
        let lines: Vec<&str> = text.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
        let mut items: Vec<String> = Vec::new();
        let mut waiting = false;

        for (index, &line) in lines.iter().enumerate() {
            if waiting {
                items.push(phrase.replace_all(line).trim().to_string());
                waiting = false;
                continue;
            }

            // An untagged line right before a tag-led line is a whole
            // expression, even with punctuation in it ("well-known", "a.m.").
            let normalized = phrase.replace_all(line);
            if phrase.find_all(&normalized).is_empty()
                && lines.get(index + 1).is_some_and(|next| opens_with_tag(phrase, next))
            {
                items.push(normalized.trim().to_string());
                waiting = true;
                continue;
            }

            let (expression, explanation) = sentence.refine(line);
            let expression = expression.trim();

            let Some(explanation) = explanation else {
                items.push(expression.to_string());
                waiting = true;
                continue;
            };
            let explanation = explanation.trim();

            if !expression.is_empty() {
                items.push(expression.to_string());
                items.push(explanation.to_string());
                continue;
            }

            // A line opening with a tag continues the previous explanation
            match items.last_mut() {
                Some(last) if !last.is_empty() => {
                    last.push(' ');
                    last.push_str(explanation);
                }
                Some(last) => last.push_str(explanation),
                None => {
                    items.push(String::new());
                    items.push(explanation.to_string());
                }
            }
        }

        if waiting {
            items.push(String::new());
        }

        Self { items }
    }

    pub fn items(&self) -> &[String] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// `(expression, explanation)` entries in page order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.items
            .chunks(2)
            .map(|pair| (pair[0].as_str(), pair.get(1).map(String::as_str).unwrap_or("")))
    }
}

fn opens_with_tag(phrase: &Phrase, line: &str) -> bool {
    phrase
        .find_all(&phrase.replace_all(line))
        .first()
        .is_some_and(|span| span.start == 0)
}
