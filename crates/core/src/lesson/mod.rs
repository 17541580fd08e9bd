//! Lesson selection and the study/test drills.

pub mod procedure;
pub mod word;

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use rand::rngs::StdRng;

use crate::config::{Properties, LAST_LESSON};
use crate::files::{file_name, list_files, slugify};
use crate::term::{self, Color, Console};
use crate::types::{LessonEntry, LessonFile};

pub use procedure::{Pacing, StudyProcedure, TestProcedure};
pub use word::{Voice, Word};

/// Seconds to answer a menu before the default is taken.
const MENU_TIMEOUT_SECS: u64 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Study,
    Test,
}

/// Read a lesson file; text fields are trimmed.
pub fn load_entries(path: &Path) -> Result<Vec<LessonEntry>> {
    let data = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read lesson: {}", path.display()))?;
    let lesson: LessonFile = serde_json::from_str(&data)
        .with_context(|| format!("Invalid lesson file: {}", path.display()))?;
    Ok(lesson
        .contents
        .into_iter()
        .map(|mut entry| {
            entry.chinese = entry.chinese.trim().to_string();
            entry.word = entry.word.trim().to_string();
            entry.explanation = entry.explanation.trim().to_string();
            entry
        })
        .collect())
}

/// Audio cache directory of one lesson.
pub fn cache_dir(output_dir: &Path, lesson: &Path) -> PathBuf {
    let stem = lesson
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    output_dir.join(slugify(&stem))
}

pub struct Lesson<'a> {
    source_dir: PathBuf,
    output_dir: PathBuf,
    console: &'a Console,
}

impl<'a> Lesson<'a> {
    pub fn new(source_dir: &Path, output_dir: &Path, console: &'a Console) -> Self {
        Self {
            source_dir: source_dir.to_path_buf(),
            output_dir: output_dir.to_path_buf(),
            console,
        }
    }

    /// Lesson files, newest name first.
    pub fn list(&self) -> Result<Vec<PathBuf>> {
        let mut lessons = list_files(&self.source_dir, ".json")?;
        lessons.reverse();
        Ok(lessons)
    }

    /// Let the user pick a lesson by sequence number.
    ///
    /// The default is the remembered lesson when it is still listed,
    /// otherwise the last one listed.
    pub fn select(&self, lessons: &[PathBuf], remembered: Option<&str>) -> Result<PathBuf> {
        if lessons.is_empty() {
            bail!("No lesson is found in {}", self.source_dir.display());
        }
        let default = remembered
            .and_then(|r| lessons.iter().position(|p| p.to_string_lossy() == r))
            .unwrap_or(lessons.len() - 1);

        loop {
            term::show(Color::Green, "Please select a lesson you want to study:");
            for (index, path) in lessons.iter().enumerate() {
                term::show(Color::LightPurple, format!("{:3}\t{}", index + 1, path.display()));
            }
            term::show(
                Color::Green,
                format!("Please input the sequence number (default is {}):", default + 1),
            );

            let reply = self.console.read_line_timeout(MENU_TIMEOUT_SECS, true);
            let index = match reply.text.parse::<usize>() {
                Ok(n) if (1..=lessons.len()).contains(&n) => n - 1,
                Ok(n) => {
                    term::show(Color::Red, format!("No lesson NO.{}", n));
                    continue;
                }
                Err(_) => default,
            };
            let chosen = lessons[index].clone();
            term::show(Color::Yellow, format!("\"{}\" is selected.", chosen.display()));
            return Ok(chosen);
        }
    }

    pub fn choose_mode(&self) -> Mode {
        term::show(
            Color::Green,
            "Do you like to study or do a test?:\n\t1, study\n\t2, test\nPlease input sequence number (default is 2):",
        );
        let reply = self.console.read_line_timeout(MENU_TIMEOUT_SECS, true);
        if reply.text == "1" {
            Mode::Study
        } else {
            Mode::Test
        }
    }

    /// Select a lesson, remember it, and run the chosen drill.
    pub fn start(&self, properties: &mut Properties, voice: &mut Voice, rng: &mut StdRng) -> Result<()> {
        let lessons = self.list()?;
        let remembered = properties.get(LAST_LESSON).map(str::to_string);
        let chosen = self.select(&lessons, remembered.as_deref())?;
        properties.update(LAST_LESSON, &chosen.to_string_lossy())?;

        let entries = load_entries(&chosen)?;
        let cache = cache_dir(&self.output_dir, &chosen);
        std::fs::create_dir_all(&cache)
            .with_context(|| format!("Failed to create directory: {}", cache.display()))?;
        log::info!(
            "{}: {} entries, audio cache {}",
            file_name(&chosen),
            entries.len(),
            cache.display()
        );

        match self.choose_mode() {
            Mode::Study => StudyProcedure::new(&entries, &cache, self.console).run(voice),
            Mode::Test => TestProcedure::new(&entries, &cache, self.console).run(voice, rng),
        }
    }
}
