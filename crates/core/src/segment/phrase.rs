use std::ops::Range;

use regex::Regex;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CategoryError {
    #[error("invalid pattern for category '{name}': {source}")]
    InvalidPattern {
        name: String,
        #[source]
        source: regex::Error,
    },
    #[error("pattern for category '{0}' has no capture group")]
    MissingGroup(String),
}

/// A part-of-speech category: a name, its canonical abbreviation and the
/// pattern recognizing its (possibly misread) tag.
///
/// Capture group 1 of the pattern is the tag itself.
#[derive(Debug, Clone)]
pub struct Category {
    name: String,
    abbreviation: String,
    regex: Regex,
}

impl Category {
    pub fn new(name: &str, pattern: &str, abbreviation: &str) -> Result<Self, CategoryError> {
        let regex = Regex::new(pattern).map_err(|source| CategoryError::InvalidPattern {
            name: name.to_string(),
            source,
        })?;
        if regex.captures_len() < 2 {
            return Err(CategoryError::MissingGroup(name.to_string()));
        }
        Ok(Self {
            name: name.to_string(),
            abbreviation: abbreviation.to_string(),
            regex,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn abbreviation(&self) -> &str {
        &self.abbreviation
    }

    /// Byte spans of the tag in every non-overlapping match.
    pub fn find(&self, text: &str) -> Vec<Range<usize>> {
        self.regex
            .captures_iter(text)
            .filter_map(|caps| caps.get(1))
            .map(|m| m.range())
            .collect()
    }

    /// Replace every tag with the canonical abbreviation.
    fn replace(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        let mut last = 0;
        for span in self.find(text) {
            out.push_str(&text[last..span.start]);
            out.push_str(&self.abbreviation);
            last = span.end;
        }
        out.push_str(&text[last..]);
        out
    }
}

lazy_static::lazy_static! {
    // m, u, w, i: and y are frequent OCR misreads of the tag letters.
    static ref DEFAULT_CATEGORIES: Vec<Category> = vec![
        Category::new("noun", r"[ \t]([nm][,\.]*)[^a-zA-Z]+", "n.").unwrap(),
        Category::new("verb", r"[ \t]([vuw][,\.]*)[^a-zA-Z]+", "v.").unwrap(),
        Category::new("vi", r"[ \t]([vuw]i[,\.]*)[^a-zA-Z]+", "vi.").unwrap(),
        Category::new("vt", r"[ \t]([vuw]t[,\.]*)[^a-zA-Z]+", "vt.").unwrap(),
        Category::new("adjective", r"[ \t](ad[ij:;][,\.]*)[^a-zA-Z]+", "adj.").unwrap(),
        Category::new("adv", r"[ \t](ad[vyu][,\.]*)[^a-zA-Z]+", "adv.").unwrap(),
        Category::new("prep", r"[ \t](prep[,\.]*)[^a-zA-Z]+", "prep.").unwrap(),
    ];
}

/// An ordered vocabulary of categories.
#[derive(Debug, Clone)]
pub struct Phrase {
    categories: Vec<Category>,
}

impl Default for Phrase {
    fn default() -> Self {
        Self {
            categories: DEFAULT_CATEGORIES.clone(),
        }
    }
}

impl Phrase {
    pub fn new(categories: Vec<Category>) -> Self {
        Self { categories }
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    /// Tag spans of every category in `line`, sorted by start.
    ///
    /// Patterns need a blank before the tag, so the line is matched with one
    /// blank prepended and the spans are shifted back. A tag that takes in
    /// the prepended blank is clamped to the start of the line.
    pub fn find_all(&self, line: &str) -> Vec<Range<usize>> {
        let padded = format!(" {}", line);
        let mut spans: Vec<Range<usize>> = self
            .categories
            .iter()
            .flat_map(|c| c.find(&padded))
            .map(|r| r.start.saturating_sub(1)..r.end.saturating_sub(1))
            .collect();
        spans.sort_by_key(|r| (r.start, r.end));
        spans
    }

    /// Normalize every tag to its canonical abbreviation.
    ///
    /// One pass per category, in vocabulary order; each pass sees the output
    /// of the previous one.
    pub fn replace_all(&self, line: &str) -> String {
        let mut text = format!(" {}", line);
        for category in &self.categories {
            text = category.replace(&text);
        }
        match text.strip_prefix(' ') {
            Some(rest) => rest.to_string(),
            // the blank was part of a replaced tag
            None => text,
        }
    }
}
