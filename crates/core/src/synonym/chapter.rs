use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{bail, Context, Result};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;

use super::Synonym;
use crate::term::{self, Color, Console};
use crate::tts::Speaker;
use crate::types::{AudioSpan, SynonymRecord};

/// `(expression, explanation)` as stored in a chapter or page file.
pub type Entry = (String, String);

/// Seconds to press return after a pair is spoken.
const SKIP_WINDOW_SECS: u64 = 1;

/// Rows of a tab-delimited file, no header.
pub fn read_rows(path: &Path) -> Result<Vec<Vec<String>>> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.with_context(|| format!("Invalid row in {}", path.display()))?;
        rows.push(record.iter().map(str::to_string).collect());
    }
    Ok(rows)
}

/// `(expression, explanation)` entries of a chapter or page file.
pub fn read_entries(path: &Path) -> Result<Vec<Entry>> {
    Ok(read_rows(path)?
        .into_iter()
        .map(|row| {
            let mut cells = row.into_iter();
            let expression = cells.next().unwrap_or_default();
            let explanation = cells.next().unwrap_or_default();
            (expression, explanation)
        })
        .collect())
}

/// Consecutive entries form a pair; a trailing odd entry is dropped.
pub fn pairs(entries: Vec<Entry>) -> Vec<(Entry, Entry)> {
    let mut pairs = Vec::with_capacity(entries.len() / 2);
    let mut iter = entries.into_iter();
    while let (Some(first), Some(second)) = (iter.next(), iter.next()) {
        pairs.push((first, second));
    }
    pairs
}

/// Studies the synonym pairs of one chapter or page.
pub struct SynonymChapter<'a> {
    console: &'a Console,
    speaker: &'a mut dyn Speaker,
    rng: StdRng,
}

impl<'a> SynonymChapter<'a> {
    pub fn new(console: &'a Console, speaker: &'a mut dyn Speaker, rng: StdRng) -> Result<Self> {
        speaker.set_language("english")?;
        Ok(Self {
            console,
            speaker,
            rng,
        })
    }

    /// Clip boundaries from a tab-delimited audio index: columns 1 and 2.
    pub fn positions(path: &Path) -> Result<Vec<AudioSpan>> {
        read_rows(path)?
            .into_iter()
            .enumerate()
            .map(|(i, row)| match (row.get(1), row.get(2)) {
                (Some(start), Some(end)) => Ok((start.clone(), end.clone())),
                _ => bail!("Row {} of {} has no start/end columns", i + 1, path.display()),
            })
            .collect()
    }

    /// Export records of a chapter file. Rows and clip positions must line
    /// up one to one, otherwise nothing is exported.
    pub fn to_records(
        path: &Path,
        positions_path: &Path,
        chapter: Option<u32>,
    ) -> Result<BTreeMap<String, SynonymRecord>> {
        let positions = Self::positions(positions_path)?;
        let entries = read_entries(path)?;

        let mut records = BTreeMap::new();
        if entries.len() != positions.len() {
            log::error!(
                "Error: {} != {} in {}",
                entries.len(),
                positions.len(),
                path.display()
            );
            return Ok(records);
        }

        let sides = entries
            .into_iter()
            .zip(positions)
            .map(|((word, explanation), audio)| Synonym::new(&word, &explanation, audio))
            .collect::<Vec<_>>();
        let mut sides = sides.into_iter();
        while let (Some(first), Some(second)) = (sides.next(), sides.next()) {
            let (key, record) = first.to_record(second, chapter);
            records.insert(key, record);
        }
        Ok(records)
    }

    pub fn study(&mut self, path: &Path) -> Result<()> {
        let entries = read_entries(path)?;
        if entries.is_empty() {
            log::warn!("Nothing to study in {}", path.display());
            return Ok(());
        }
        self.study_pairs(pairs(entries))
    }

    /// Rounds over the remaining pairs in random order until every pair has
    /// been retired.
    pub fn study_pairs(&mut self, mut remaining: Vec<(Entry, Entry)>) -> Result<()> {
        term::show(Color::Red, "Notice: press return key to skip one pair");

        while !remaining.is_empty() {
            term::clear_screen();
            term::show(Color::Yellow, term::rule('='));
            term::show(Color::Yellow, format!("{} synonyms are left.", remaining.len()));

            let mut order: Vec<usize> = (0..remaining.len()).collect();
            order.shuffle(&mut self.rng);

            let mut retired = Vec::new();
            for index in order {
                if self.study_pair(&remaining[index])? {
                    retired.push(index);
                }
            }

            retired.sort_unstable_by(|a, b| b.cmp(a));
            for index in retired {
                remaining.remove(index);
            }
        }
        Ok(())
    }

    /// Show and speak one pair. Returns true when the user retired it.
    fn study_pair(&mut self, pair: &(Entry, Entry)) -> Result<bool> {
        let (left, right) = if self.rng.gen_bool(0.5) {
            (&pair.1, &pair.0)
        } else {
            (&pair.0, &pair.1)
        };

        term::show(Color::Yellow, term::rule('-'));
        term::show(Color::LightGray, format!("{:^40}\t{:^40}", left.0, right.0));
        term::show(Color::Purple, format!("{:^40}\t{:^40}", left.1, right.1));

        let words = format!("{},{}", left.0, right.0);
        self.speaker.say(&words, 1.0)?;

        let reply = self.console.read_line_timeout(SKIP_WINDOW_SECS, false);
        if reply.timed_out {
            return Ok(false);
        }
        term::show(Color::Red, format!("Skip {}", words));
        Ok(true)
    }
}
