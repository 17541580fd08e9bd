//! Dictionary-line segmentation.
//!
//! Scanned dictionary lines mix an English expression, a part-of-speech tag
//! (often misread by OCR) and a bilingual explanation. The pipeline:
//! 1. [`Phrase::replace_all`] normalizes the tags to canonical abbreviations,
//! 2. [`Sentence::refine`] splits a line before its first tag, or before the
//!    first character that cannot be English text,
//! 3. [`SentenceGroup`] folds the lines of a page into expression/explanation
//!    pairs, joining continuation lines.
//!
//! All spans are byte offsets into the line.

pub mod group;
pub mod phrase;
pub mod sentence;

pub use group::SentenceGroup;
pub use phrase::{Category, CategoryError, Phrase};
pub use sentence::{Explanation, Sentence};
