use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use anyhow::{Context, Result};

use super::page::{csv_path, SynonymPage};
use super::write_json;
use crate::cache;
use crate::files::list_files;
use crate::types::ParseInfo;

pub const DICTIONARY_FILE: &str = "dictionary.json";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseSummary {
    pub parsed: usize,
    pub failed: usize,
    pub skipped: usize,
}

/// Parse state of every page under a directory, persisted as
/// `<dir>/dictionary.json`.
#[derive(Debug, Clone)]
pub struct SynonymDictionary {
    dir: PathBuf,
    path: PathBuf,
    entries: BTreeMap<String, ParseInfo>,
}

fn mtime_secs(path: &Path) -> Result<u64> {
    let modified = std::fs::metadata(path)
        .and_then(|m| m.modified())
        .with_context(|| format!("Failed to stat {}", path.display()))?;
    Ok(modified.duration_since(UNIX_EPOCH)?.as_secs())
}

impl SynonymDictionary {
    pub fn load(dir: &Path) -> Result<Self> {
        let path = dir.join(DICTIONARY_FILE);
        let entries = if path.exists() {
            let data = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            serde_json::from_str(&data)
                .with_context(|| format!("Invalid parse state: {}", path.display()))?
        } else {
            BTreeMap::new()
        };
        Ok(Self {
            dir: dir.to_path_buf(),
            path,
            entries,
        })
    }

    pub fn save(&self) -> Result<()> {
        write_json(&self.path, &self.entries)
    }

    pub fn key(path: &Path) -> String {
        path.to_string_lossy().replace(['/', '\\', '.'], "-")
    }

    pub fn info(&self, path: &Path) -> Option<&ParseInfo> {
        self.entries.get(&Self::key(path))
    }

    /// The page is unchanged since it was last parsed and its CSV exists.
    pub fn is_parsed(&self, path: &Path) -> Result<bool> {
        let Some(info) = self.info(path) else {
            return Ok(false);
        };
        if info.timestamp != mtime_secs(path)? {
            return Ok(false);
        }
        if info.md5code != cache::file_hash(path)? {
            return Ok(false);
        }
        Ok(csv_path(path).exists())
    }

    pub fn update(&mut self, path: &Path) -> Result<()> {
        let info = ParseInfo {
            md5code: cache::file_hash(path)?,
            timestamp: mtime_secs(path)?,
        };
        self.entries.insert(Self::key(path), info);
        Ok(())
    }

    /// Parse every page that changed since the last run, then persist the
    /// parse state. A page that cannot be read counts as failed.
    pub fn parse(&mut self) -> Result<ParseSummary> {
        let pages = list_files(&self.dir, ".txt")?;
        if pages.is_empty() {
            log::error!("No file is found in {}", self.dir.display());
            return Ok(ParseSummary::default());
        }

        let mut summary = ParseSummary::default();
        for page in &pages {
            if let Err(e) = self.parse_page(page, &mut summary) {
                log::error!("Failed to parse {}: {:#}", page.display(), e);
                summary.failed += 1;
            }
        }

        self.save()?;
        log::info!(
            "Parsed {}, failed {}, skipped {}",
            summary.parsed,
            summary.failed,
            summary.skipped
        );
        Ok(summary)
    }

    fn parse_page(&mut self, page: &Path, summary: &mut ParseSummary) -> Result<()> {
        if self.is_parsed(page)? {
            log::debug!("Skipping {}", page.display());
            summary.skipped += 1;
            return Ok(());
        }
        if SynonymPage::read(page, self.info(page))? {
            self.update(page)?;
            summary.parsed += 1;
        } else {
            summary.failed += 1;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_flattens_path() {
        assert_eq!(
            SynonymDictionary::key(Path::new("english/synonym/unit-b6-1.txt")),
            "english-synonym-unit-b6-1-txt"
        );
        assert_eq!(SynonymDictionary::key(Path::new("a\\b.txt")), "a-b-txt");
    }

    #[test]
    fn test_parse_then_skip() {
        let dir = std::env::temp_dir().join(format!("recite_dict_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join("unit-b6-1.txt"),
            "abandon v. 放弃\nability n. 能力\ndesert v. 抛弃\ncapacity n. 才能\n",
        )
        .unwrap();
        std::fs::write(dir.join("unit-b6-2.txt"), "abandon v. 放弃\n").unwrap();

        let mut dictionary = SynonymDictionary::load(&dir).unwrap();
        let first = dictionary.parse().unwrap();
        assert_eq!(
            first,
            ParseSummary {
                parsed: 1,
                failed: 1,
                skipped: 0
            }
        );

        let reloaded = SynonymDictionary::load(&dir).unwrap();
        assert!(reloaded.is_parsed(&dir.join("unit-b6-1.txt")).unwrap());
        assert!(!reloaded.is_parsed(&dir.join("unit-b6-2.txt")).unwrap());

        let mut dictionary = reloaded;
        let second = dictionary.parse().unwrap();
        assert_eq!(
            second,
            ParseSummary {
                parsed: 0,
                failed: 1,
                skipped: 1
            }
        );

        let json = std::fs::read_to_string(dir.join(DICTIONARY_FILE)).unwrap();
        assert!(json.contains("\n    \""));
        assert!(json.contains("\"md5code\""));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_unreadable_page_keeps_state_of_the_others() {
        let dir = std::env::temp_dir().join(format!("recite_dict_gbk_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let good = dir.join("unit-b6-1.txt");
        std::fs::write(
            &good,
            "abandon v. 放弃\nability n. 能力\ndesert v. 抛弃\ncapacity n. 才能\n",
        )
        .unwrap();
        // "放弃" in GBK is not valid UTF-8
        std::fs::write(dir.join("unit-b6-2.txt"), [0xb7, 0xc5, 0xc6, 0xfa, b'\n']).unwrap();

        let mut dictionary = SynonymDictionary::load(&dir).unwrap();
        let summary = dictionary.parse().unwrap();
        assert_eq!(
            summary,
            ParseSummary {
                parsed: 1,
                failed: 1,
                skipped: 0
            }
        );

        assert!(dir.join(DICTIONARY_FILE).exists());
        let reloaded = SynonymDictionary::load(&dir).unwrap();
        assert!(reloaded.is_parsed(&good).unwrap());

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_missing_csv_means_not_parsed() {
        let dir = std::env::temp_dir().join(format!("recite_dict_csv_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let page = dir.join("unit-b1-1.txt");
        std::fs::write(&page, "x").unwrap();

        let mut dictionary = SynonymDictionary::load(&dir).unwrap();
        dictionary.update(&page).unwrap();
        assert!(!dictionary.is_parsed(&page).unwrap());
        std::fs::write(csv_path(&page), "").unwrap();
        assert!(dictionary.is_parsed(&page).unwrap());

        std::fs::remove_dir_all(&dir).ok();
    }
}
