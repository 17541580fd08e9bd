use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use rand::rngs::StdRng;
use rand::Rng;
use serde::Deserialize;

use super::chapter::SynonymChapter;
use super::write_json;
use crate::files::{file_name, file_numbers, list_files};
use crate::term::{self, Color, Console};
use crate::tts::Speaker;
use crate::types::SynonymRecord;

/// Seconds to choose a chapter or page before one is picked at random.
const CHOICE_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, Default)]
struct ChapterFiles {
    /// Whole-chapter file (one number in its name)
    file: Option<PathBuf>,
    /// Page files by page number (two numbers in the name)
    pages: BTreeMap<u32, PathBuf>,
}

/// One entry of the audio index file.
#[derive(Debug, Clone, Deserialize)]
struct AudioIndexEntry {
    filename: String,
}

/// All chapter and page files of a synonym book directory.
#[derive(Debug, Clone)]
pub struct SynonymBook {
    dir: PathBuf,
    chapters: BTreeMap<u32, ChapterFiles>,
}

impl SynonymBook {
    /// Index the `.csv` files under `dir` by the numbers in their names.
    pub fn load(dir: &Path) -> Result<Self> {
        let mut book = Self {
            dir: dir.to_path_buf(),
            chapters: BTreeMap::new(),
        };
        for path in list_files(dir, ".csv")? {
            if file_name(&path).ends_with(".error.csv") {
                continue;
            }
            book.add(path);
        }
        if book.chapters.is_empty() {
            bail!("No file is found in {}", dir.display());
        }
        Ok(book)
    }

    fn add(&mut self, path: PathBuf) {
        match file_numbers(&path).as_slice() {
            [chapter] => self.chapters.entry(*chapter).or_default().file = Some(path),
            [chapter, page] => {
                self.chapters
                    .entry(*chapter)
                    .or_default()
                    .pages
                    .insert(*page, path);
            }
            _ => log::debug!("Ignoring {}", path.display()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn chapter_numbers(&self) -> Vec<u32> {
        self.chapters.keys().copied().collect()
    }

    pub fn pages(&self, chapter: u32) -> Vec<u32> {
        self.chapters
            .get(&chapter)
            .map(|c| c.pages.keys().copied().collect())
            .unwrap_or_default()
    }

    pub fn chapter_path(&self, chapter: u32) -> Option<&Path> {
        self.chapters.get(&chapter)?.file.as_deref()
    }

    pub fn page_path(&self, chapter: u32, page: u32) -> Option<&Path> {
        self.chapters
            .get(&chapter)?
            .pages
            .get(&page)
            .map(PathBuf::as_path)
    }

    /// Records of every whole-chapter file, with clip positions taken from
    /// `<audio_config_dir>/<filename>.csv` as named by the audio index.
    pub fn to_records(
        &self,
        audio_config_dir: &Path,
        audio_index: &Path,
    ) -> Result<BTreeMap<String, SynonymRecord>> {
        let data = std::fs::read_to_string(audio_index)
            .with_context(|| format!("Failed to read audio index: {}", audio_index.display()))?;
        let index: HashMap<String, AudioIndexEntry> = serde_json::from_str(&data)
            .with_context(|| format!("Invalid audio index: {}", audio_index.display()))?;

        let mut records = BTreeMap::new();
        for (number, files) in &self.chapters {
            let Some(path) = &files.file else {
                log::debug!("Chapter {} has no chapter file", number);
                continue;
            };
            let Some(entry) = index.get(&number.to_string()) else {
                bail!(
                    "Chapter {} is missing from audio index {}",
                    number,
                    audio_index.display()
                );
            };
            let positions = audio_config_dir.join(format!("{}.csv", entry.filename));
            records.extend(SynonymChapter::to_records(path, &positions, Some(*number))?);
        }
        Ok(records)
    }

    pub fn save_to_file(&self, path: &Path, audio_config_dir: &Path, audio_index: &Path) -> Result<()> {
        let records = self.to_records(audio_config_dir, audio_index)?;
        write_json(path, &records)?;
        log::info!("Saved {} synonym pairs to {}", records.len(), path.display());
        Ok(())
    }

    /// Choose a chapter and a page, then study it.
    pub fn study(&self, console: &Console, speaker: &mut dyn Speaker, mut rng: StdRng) -> Result<()> {
        let chapters = self.chapter_numbers();
        let chapter = read_number(console, &mut rng, &chapters, "Please select a chapter");
        term::show(Color::Yellow, format!("Chapter \"{}\" is selected.", chapter));

        let pages = self.pages(chapter);
        let path = if pages.is_empty() {
            self.chapter_path(chapter)
        } else {
            let page = read_number(console, &mut rng, &pages, "Please select a page");
            term::show(Color::Yellow, format!("Page \"{}\" is selected.", page));
            self.page_path(chapter, page)
        };
        let Some(path) = path else {
            bail!("No file for chapter {} in {}", chapter, self.dir.display());
        };
        term::show(Color::Yellow, format!("File \"{}\" is selected.", path.display()));

        SynonymChapter::new(console, speaker, rng)?.study(path)
    }
}

/// Read one of `choices`. Empty, invalid or late input picks one at random;
/// a number that is not offered asks again.
fn read_number(console: &Console, rng: &mut StdRng, choices: &[u32], prompt: &str) -> u32 {
    let (first, last) = match choices {
        [] => return 0,
        [first, .., last] => (*first, *last),
        [only] => (*only, *only),
    };

    loop {
        term::show(
            Color::Cyan,
            format!(
                "{} from {} to {}, press return to select one randomly:",
                prompt, first, last
            ),
        );
        let reply = console.read_line_timeout(CHOICE_TIMEOUT_SECS, false);
        if let Ok(number) = reply.text.parse::<u32>() {
            if choices.contains(&number) {
                return number;
            }
            term::show(Color::Red, format!("No NO.{}, please choose another one", number));
            continue;
        }
        return choices[rng.gen_range(0..choices.len())];
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;

    use super::*;
    use crate::synonym::chapter::tests::SilentSpeaker;

    fn scratch(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("recite_book_{}_{}", name, std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn build_book(dir: &Path) {
        std::fs::write(dir.join("unit-b6.csv"), "abandon\tv. 放弃\ndesert\tv. 抛弃\n").unwrap();
        std::fs::write(dir.join("unit-b6-1.csv"), "abandon\tv. 放弃\ndesert\tv. 抛弃\n").unwrap();
        std::fs::write(dir.join("unit-b6-2.csv"), "zeal\tn. 热情\nardor\tn. 热忱\n").unwrap();
        std::fs::write(dir.join("unit-b7-1.error.csv"), "x\n").unwrap();
        std::fs::write(dir.join("dictionary.csv"), "x\n").unwrap();
    }

    #[test]
    fn test_load_indexes_chapters_and_pages() {
        let dir = scratch("load");
        build_book(&dir);

        let book = SynonymBook::load(&dir).unwrap();
        assert_eq!(book.chapter_numbers(), vec![6]);
        assert_eq!(book.pages(6), vec![1, 2]);
        assert_eq!(book.chapter_path(6), Some(dir.join("unit-b6.csv").as_path()));
        assert_eq!(book.page_path(6, 2), Some(dir.join("unit-b6-2.csv").as_path()));
        assert!(book.page_path(7, 1).is_none());

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_load_empty_dir_fails() {
        let dir = scratch("empty");
        assert!(SynonymBook::load(&dir).is_err());
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_save_to_file() {
        let dir = scratch("save");
        build_book(&dir);
        let audio_dir = scratch("save_audio");
        std::fs::write(audio_dir.join("unit6.csv"), "1\t0.0\t1.0\n2\t1.0\t2.0\n").unwrap();
        let index = audio_dir.join("index.json");
        std::fs::write(&index, r#"{"6": {"filename": "unit6"}}"#).unwrap();

        let out = dir.join("synonyms.json");
        let book = SynonymBook::load(&dir).unwrap();
        book.save_to_file(&out, &audio_dir, &index).unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
        let record = &json["abandon---desert"];
        assert_eq!(record["chapter"], 6);
        assert_eq!(record["audio2"][1], "2.0");
        assert_eq!(record["explanation1"], "v. 放弃");

        std::fs::remove_dir_all(&dir).ok();
        std::fs::remove_dir_all(&audio_dir).ok();
    }

    #[test]
    fn test_read_number() {
        let mut rng = StdRng::seed_from_u64(1);
        let console = Console::scripted(["9", "2"]);
        assert_eq!(read_number(&console, &mut rng, &[1, 2, 3], "pick"), 2);

        let console = Console::scripted(["abc"]);
        let picked = read_number(&console, &mut rng, &[4, 5], "pick");
        assert!(picked == 4 || picked == 5);
    }

    #[test]
    fn test_study_selected_page() {
        let dir = scratch("study");
        build_book(&dir);
        let book = SynonymBook::load(&dir).unwrap();

        let console = Console::scripted(["6", "2", ""]);
        let mut speaker = SilentSpeaker::default();
        book.study(&console, &mut speaker, StdRng::seed_from_u64(3)).unwrap();
        assert_eq!(speaker.spoken.len(), 1);
        assert!(speaker.spoken[0].contains("zeal"));

        std::fs::remove_dir_all(&dir).ok();
    }
}
