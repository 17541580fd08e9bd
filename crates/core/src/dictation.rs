//! Spelling dictation: random digit strings and post codes are read out
//! with "double"/"triple" runs, and the user types back what they heard.

use std::time::Duration;

use anyhow::{bail, Result};
use rand::rngs::StdRng;
use rand::Rng;

use crate::term::{self, Color, Console};
use crate::tts::Speaker;

pub const MAX_ATTEMPTS: usize = 5;

const DEFAULT_LENGTH: usize = 6;
const DEFAULT_SIZE: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    /// Digits, read in groups of four
    Number,
    /// Digits and capital letters, read in groups of three
    PostCode,
}

impl Kind {
    pub fn from_index(index: u32) -> Option<Self> {
        match index {
            0 => Some(Kind::Number),
            1 => Some(Kind::PostCode),
            _ => None,
        }
    }
}

/// One dictation item: what is expected back and what is spoken.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dictation {
    pub answer: String,
    pub phrase: String,
}

#[derive(Debug, Clone, Copy)]
pub struct Generator {
    kind: Kind,
    double: f64,
    triple: f64,
}

impl Generator {
    pub fn new(kind: Kind) -> Self {
        Self {
            kind,
            double: 0.2,
            triple: 0.2,
        }
    }

    pub fn with_proportions(kind: Kind, double: f64, triple: f64) -> Self {
        Self { kind, double, triple }
    }

    pub fn group_size(&self) -> usize {
        match self.kind {
            Kind::Number => 4,
            Kind::PostCode => 3,
        }
    }

    /// A random symbol and the way it is read out.
    fn symbol(&self, rng: &mut StdRng) -> (char, String) {
        match self.kind {
            Kind::Number => {
                let digit = rng.gen_range(0..10u32);
                let ch = char::from_digit(digit, 10).unwrap_or('0');
                let spoken = if digit == 0 { "o".to_string() } else { ch.to_string() };
                (ch, spoken)
            }
            Kind::PostCode => {
                let num = rng.gen_range(0..36u8);
                match num {
                    0 => ('0', "zero".to_string()),
                    1..=9 => {
                        let ch = char::from(b'0' + num);
                        (ch, ch.to_string())
                    }
                    _ => {
                        let ch = char::from(b'A' + num - 10);
                        // C, H and W are easy to miss after the previous symbol
                        let spoken = if matches!(ch, 'C' | 'H' | 'W') {
                            format!(",{}", ch)
                        } else {
                            ch.to_string()
                        };
                        (ch, spoken)
                    }
                }
            }
        }
    }

    /// Run length for the next symbol, clipped to what is left of the item
    /// and of the current group.
    fn run_length(&self, rng: &mut StdRng, left: usize, count: usize) -> usize {
        let ratio: f64 = rng.gen();
        let run = if ratio < self.double {
            2
        } else if ratio < self.double + self.triple {
            3
        } else {
            1
        };
        let group_left = self.group_size() - count % self.group_size();
        run.min(left).min(group_left)
    }

    pub fn create(&self, rng: &mut StdRng, length: usize) -> Dictation {
        let mut answer = String::with_capacity(length);
        let mut words: Vec<String> = Vec::new();
        let mut count = 0;

        while count < length {
            let run = self.run_length(rng, length - count, count);
            let (ch, spoken) = self.symbol(rng);
            answer.extend(std::iter::repeat(ch).take(run));
            count += run;

            match run {
                2 => words.push("double".to_string()),
                3 => words.push("triple".to_string()),
                _ => {}
            }
            let mut word = spoken;
            if count % self.group_size() == 0 {
                word.push(',');
            }
            words.push(word);
        }

        let mut phrase = words.join(" ");
        phrase.push('.');
        Dictation { answer, phrase }
    }
}

/// Upper-cased guess without spaces and commas.
pub fn normalize_guess(guess: &str) -> String {
    guess
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ',')
        .collect::<String>()
        .to_uppercase()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Score {
    /// Wrong guesses over all items
    pub retries: usize,
    /// Items answered on the first try
    pub first_try: usize,
}

pub struct Examiner<'a> {
    console: &'a Console,
    speaker: &'a mut dyn Speaker,
    rng: StdRng,
    ready_pause: Duration,
    retry_pause: Duration,
}

impl<'a> Examiner<'a> {
    pub fn new(console: &'a Console, speaker: &'a mut dyn Speaker, rng: StdRng) -> Result<Self> {
        speaker.set_language("english")?;
        Ok(Self {
            console,
            speaker,
            rng,
            ready_pause: Duration::from_secs(1),
            retry_pause: Duration::from_secs(2),
        })
    }

    pub fn with_pauses(mut self, ready: Duration, retry: Duration) -> Self {
        self.ready_pause = ready;
        self.retry_pause = retry;
        self
    }

    /// Ask for the settings, then run the drill.
    pub fn run(&mut self) -> Result<Score> {
        term::show(Color::Green, format!("Please input the length (default is {}):", DEFAULT_LENGTH));
        let length = self.read_setting(2).unwrap_or(DEFAULT_LENGTH).max(1);
        term::show(Color::Cyan, format!("The length is {}", length));

        term::show(Color::Green, format!("Please input the number (default is {}):", DEFAULT_SIZE));
        let size = self.read_setting(2).unwrap_or(DEFAULT_SIZE);
        term::show(Color::Cyan, format!("The size is {}", size));

        term::show(
            Color::Green,
            "Please input the type [0: number, 1: post code] (default is 0):",
        );
        let kind = self
            .read_setting(5)
            .and_then(|i| Kind::from_index(i as u32))
            .unwrap_or(Kind::Number);
        term::show(Color::Cyan, format!("The type is {:?}", kind));

        self.test_loop(length, size, kind)
    }

    fn read_setting(&self, seconds: u64) -> Option<usize> {
        self.console.read_line_timeout(seconds, false).text.parse().ok()
    }

    pub fn test_loop(&mut self, length: usize, size: usize, kind: Kind) -> Result<Score> {
        let generator = Generator::new(kind);
        let mut score = Score::default();

        for index in 0..size {
            term::clear_screen();
            term::show(Color::Yellow, format!("NO.{}: please be ready ...", index + 1));
            std::thread::sleep(self.ready_pause);

            let item = generator.create(&mut self.rng, length);
            let retries = self.test_one(&item)?;
            if retries == 0 {
                score.first_try += 1;
            }
            score.retries += retries;
        }

        term::show(Color::Green, format!("All retried times: {}", score.retries));
        term::show(Color::Green, format!("Accurate: {}", score.first_try));
        Ok(score)
    }

    /// Returns the number of wrong guesses.
    pub fn test_one(&mut self, item: &Dictation) -> Result<usize> {
        let expected = item.answer.to_uppercase();

        for attempt in 0..MAX_ATTEMPTS {
            self.speaker.say(&item.phrase, 1.0)?;

            let reply = self.console.read_line();
            if reply.closed {
                bail!("Input closed during dictation");
            }
            if normalize_guess(&reply.text) == expected {
                return Ok(attempt);
            }

            term::clear_screen();
            term::show(Color::Red, "Please try it again");
            std::thread::sleep(self.retry_pause);
        }

        term::show(Color::Purple, format!("It is {}", expected));
        self.speaker.say(&item.phrase, 1.0)?;
        Ok(MAX_ATTEMPTS)
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;

    use super::*;
    use crate::synonym::chapter::tests::SilentSpeaker;

    /// Rebuild the answer from a phrase, group by group.
    fn expand(phrase: &str) -> Vec<String> {
        let mut groups = vec![String::new()];
        let mut repeat = 1;
        for token in phrase.trim_end_matches('.').split_whitespace() {
            let token = token.trim_start_matches(',');
            match token {
                "double" => repeat = 2,
                "triple" => repeat = 3,
                _ => {
                    let closes = token.ends_with(',');
                    let symbol = match token.trim_end_matches(',') {
                        "o" | "zero" => "0".to_string(),
                        other => other.to_string(),
                    };
                    if let Some(current) = groups.last_mut() {
                        current.push_str(&symbol.repeat(repeat));
                    }
                    repeat = 1;
                    if closes {
                        groups.push(String::new());
                    }
                }
            }
        }
        groups.retain(|g| !g.is_empty());
        groups
    }

    #[test]
    fn test_number_phrase_matches_answer() {
        let mut rng = StdRng::seed_from_u64(42);
        let generator = Generator::new(Kind::Number);
        for length in [1, 4, 6, 9, 12] {
            let item = generator.create(&mut rng, length);
            assert_eq!(item.answer.len(), length);
            assert!(item.answer.chars().all(|c| c.is_ascii_digit()));
            assert!(item.phrase.ends_with('.'));
            let groups = expand(&item.phrase);
            assert_eq!(groups.concat(), item.answer);
            for group in &groups[..groups.len() - 1] {
                assert_eq!(group.len(), 4);
            }
        }
    }

    #[test]
    fn test_post_code_groups_of_three() {
        let mut rng = StdRng::seed_from_u64(7);
        let generator = Generator::new(Kind::PostCode);
        let item = generator.create(&mut rng, 6);
        assert_eq!(item.answer.len(), 6);
        assert!(item.answer.chars().all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));
        assert_eq!(expand(&item.phrase), vec![&item.answer[..3], &item.answer[3..]]);
        assert!(item.phrase.ends_with(",."));
    }

    #[test]
    fn test_runs_clipped_to_group() {
        let mut rng = StdRng::seed_from_u64(3);
        let generator = Generator::with_proportions(Kind::Number, 0.0, 1.0);
        let item = generator.create(&mut rng, 5);
        // triple, then the single slot left in the group, then one more
        let words: Vec<&str> = item.phrase.split_whitespace().collect();
        assert_eq!(words[0], "triple");
        assert_ne!(words[2], "double");
        assert_eq!(item.answer.len(), 5);
        assert_eq!(expand(&item.phrase).concat(), item.answer);
    }

    #[test]
    fn test_zero_spoken() {
        let mut rng = StdRng::seed_from_u64(1);
        let generator = Generator::with_proportions(Kind::Number, 0.0, 0.0);
        let item = generator.create(&mut rng, 40);
        for (ch, word) in item.answer.chars().zip(item.phrase.split_whitespace()) {
            let word = word.trim_end_matches(['.', ',']);
            if ch == '0' {
                assert_eq!(word, "o");
            } else {
                assert_eq!(word, ch.to_string());
            }
        }
    }

    #[test]
    fn test_normalize_guess() {
        assert_eq!(normalize_guess(" ab1, 2c "), "AB12C");
    }

    #[test]
    fn test_examiner_counts_retries() {
        let console = Console::scripted(["12 34", "1234", "99", "00", "0000"]);
        let mut speaker = SilentSpeaker::default();
        let mut examiner = Examiner::new(&console, &mut speaker, StdRng::seed_from_u64(0))
            .unwrap()
            .with_pauses(Duration::ZERO, Duration::ZERO);

        let first = Dictation {
            answer: "1234".into(),
            phrase: "1 2 3 4,.".into(),
        };
        assert_eq!(examiner.test_one(&first).unwrap(), 0);
        assert_eq!(examiner.test_one(&first).unwrap(), 0);

        let zeros = Dictation {
            answer: "0000".into(),
            phrase: "double o double o,.".into(),
        };
        assert_eq!(examiner.test_one(&zeros).unwrap(), 2);
    }

    #[test]
    fn test_examiner_gives_up_after_max_attempts() {
        let console = Console::scripted(["1", "2", "3", "4", "5"]);
        let mut speaker = SilentSpeaker::default();
        {
            let mut examiner = Examiner::new(&console, &mut speaker, StdRng::seed_from_u64(0))
                .unwrap()
                .with_pauses(Duration::ZERO, Duration::ZERO);
            let item = Dictation {
                answer: "AB".into(),
                phrase: "A B.".into(),
            };
            assert_eq!(examiner.test_one(&item).unwrap(), MAX_ATTEMPTS);
        }
        assert_eq!(speaker.spoken.len(), MAX_ATTEMPTS + 1);
    }
}
