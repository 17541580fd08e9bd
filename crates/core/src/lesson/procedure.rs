use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Result};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use super::word::{Voice, Word};
use crate::term::{self, Color, Console};
use crate::types::LessonEntry;

const STUDY_REPEATS: usize = 3;
const GREETING: &str = "You passed all the tests! Congratulations!";

/// Pauses and answer windows of the drills.
#[derive(Debug, Clone, Copy)]
pub struct Pacing {
    /// Between the spoken parts of an entry
    pub pause: Duration,
    /// Between spelled letters
    pub letter_gap: Duration,
    /// Seconds to type something after the word is studied
    pub study_wait: u64,
    /// Seconds before each test hint
    pub hint_wait: u64,
    /// Seconds to retire a tested entry
    pub retire_wait: u64,
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            pause: Duration::from_millis(500),
            letter_gap: Duration::from_millis(100),
            study_wait: 2,
            hint_wait: 5,
            retire_wait: 10,
        }
    }
}

fn bind(entries: &[LessonEntry], cache_dir: &Path) -> Vec<Word> {
    entries
        .iter()
        .map(|entry| Word::from_entry(entry, cache_dir))
        .collect()
}

/// Walk through every entry once: word, translation, spelling, explanation
/// and a sample.
pub struct StudyProcedure<'a> {
    words: Vec<Word>,
    console: &'a Console,
    pacing: Pacing,
}

impl<'a> StudyProcedure<'a> {
    pub fn new(entries: &[LessonEntry], cache_dir: &Path, console: &'a Console) -> Self {
        Self {
            words: bind(entries, cache_dir),
            console,
            pacing: Pacing::default(),
        }
    }

    pub fn with_pacing(mut self, pacing: Pacing) -> Self {
        self.pacing = pacing;
        self
    }

    pub fn run(&self, voice: &mut Voice) -> Result<()> {
        for word in &self.words {
            term::clear_screen();
            term::show(Color::Yellow, term::rule('-'));
            self.study_word(word, voice)?;
        }
        Ok(())
    }

    fn study_word(&self, word: &Word, voice: &mut Voice) -> Result<()> {
        term::show(Color::Cyan, "Chinese:");
        term::show(Color::LightGray, format!("\t{}", word.chinese));
        term::show(Color::Cyan, "Word:");
        term::show(Color::LightGray, format!("\t{}", word.english));

        for _ in 0..STUDY_REPEATS {
            word.play_english(voice)?;
            std::thread::sleep(self.pacing.pause);
            word.play_chinese(voice)?;
            std::thread::sleep(self.pacing.pause);
            word.play_letters(voice, self.pacing.letter_gap)?;
            std::thread::sleep(self.pacing.pause);
        }

        if self.console.read_line_timeout(self.pacing.study_wait, true).answered() {
            return Ok(());
        }

        term::show(Color::Cyan, "Explanation:");
        term::show(Color::LightGray, format!("\t{}", word.explanation));
        word.play_explanation(voice)?;

        if self.console.read_line_timeout(self.pacing.study_wait, true).answered() {
            return Ok(());
        }

        term::show(Color::Cyan, "Sample:");
        term::show(Color::LightGray, format!("\t{}", word.sample(0)));
        word.play_sample(voice, 0)
    }
}

/// Quiz rounds: explanation first, then hints. An entry leaves the rotation
/// once the user types something at the end of its quiz.
pub struct TestProcedure<'a> {
    words: Vec<Word>,
    console: &'a Console,
    pacing: Pacing,
}

impl<'a> TestProcedure<'a> {
    pub fn new(entries: &[LessonEntry], cache_dir: &Path, console: &'a Console) -> Self {
        Self {
            words: bind(entries, cache_dir),
            console,
            pacing: Pacing::default(),
        }
    }

    pub fn with_pacing(mut self, pacing: Pacing) -> Self {
        self.pacing = pacing;
        self
    }

    pub fn run(&self, voice: &mut Voice, rng: &mut StdRng) -> Result<()> {
        let mut remaining: Vec<&Word> = self.words.iter().collect();

        while !remaining.is_empty() {
            let mut round = remaining.clone();
            round.shuffle(rng);

            for word in round {
                term::clear_screen();
                term::show(Color::Yellow, term::rule('-'));
                term::show(Color::Yellow, format!("{} words are left.", remaining.len()));

                if !self.test_word(word, voice)? {
                    continue;
                }
                if let Some(pos) = remaining.iter().position(|w| w.english == word.english) {
                    let retired = remaining.remove(pos);
                    term::show(Color::Red, format!("\"{}\" is skipped.", retired.english));
                }
            }
        }

        self.play_greeting(voice)
    }

    /// Quiz one entry. Returns true when the user asked to retire it.
    fn test_word(&self, word: &Word, voice: &mut Voice) -> Result<bool> {
        let wait = self.pacing.hint_wait;

        term::show(Color::Cyan, "Explanation:");
        word.play_explanation(voice)?;
        let reply = self.console.read_raw_timeout(wait, true);
        term::show(Color::LightGray, format!("\t{}", word.explanation));
        if reply.timed_out {
            word.play_explanation(voice)?;
            self.console.read_line_timeout(wait, true);
        }

        term::show(Color::Cyan, "Chinese:");
        self.console.read_line_timeout(wait, true);
        term::show(Color::LightGray, format!("\t{}", word.chinese));
        word.play_chinese(voice)?;

        term::show(Color::Cyan, "Word:");
        self.console.read_line_timeout(wait, true);
        term::show(Color::LightGray, format!("\t{}", word.english));
        word.play_english(voice)?;
        std::thread::sleep(self.pacing.pause);
        word.play_letters(voice, self.pacing.letter_gap)?;
        std::thread::sleep(self.pacing.pause);

        term::show(Color::Cyan, "Sample:");
        term::show(Color::LightGray, format!("\t{}", word.sample(0)));
        word.play_sample(voice, 0)?;

        term::show(
            Color::Green,
            format!("Type anything and press return to skip \"{}\".", word.english),
        );
        let reply = self.console.read_line_timeout(self.pacing.retire_wait, true);
        if reply.closed {
            bail!("Input closed before all words were retired");
        }
        Ok(reply.answered())
    }

    fn play_greeting(&self, voice: &mut Voice) -> Result<()> {
        term::clear_screen();
        term::show(Color::Purple, GREETING);
        voice.say(GREETING, "english", 0.8)
    }
}
