use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::cache;
use crate::segment::SentenceGroup;
use crate::types::ParseInfo;

/// A scanned two-column page. The first half of the group is the left
/// column, the second half the right one; entries are paired by index.
#[derive(Debug, Clone, Default)]
pub struct SynonymPage {
    group: SentenceGroup,
}

pub fn csv_path(page: &Path) -> PathBuf {
    page.with_extension("csv")
}

pub fn error_csv_path(page: &Path) -> PathBuf {
    page.with_extension("error.csv")
}

impl SynonymPage {
    pub fn new(group: SentenceGroup) -> Self {
        Self { group }
    }

    pub fn group(&self) -> &SentenceGroup {
        &self.group
    }

    /// Parse a page, rewrite it in refined form and export it.
    ///
    /// Returns whether the page could be paired.
    pub fn read(path: &Path, info: Option<&ParseInfo>) -> Result<bool> {
        log::info!("Parsing {} ...", path.display());
        let page = Self::new(SentenceGroup::read(path)?);
        page.refine(path, info)?;
        page.save_as_synonym(path)
    }

    /// One element per line, with a gap between the two columns.
    pub fn refined_text(&self) -> String {
        let items = self.group.items();
        let mid = (items.len() / 2).checked_sub(1);
        let mut content = String::new();
        for (index, item) in items.iter().enumerate() {
            content.push_str(item);
            content.push('\n');
            if Some(index) == mid {
                content.push_str("\n\n\n");
            }
        }
        content
    }

    /// Rewrite the page in refined form. Nothing is written when the result
    /// hashes to the recorded `md5code`.
    pub fn refine(&self, path: &Path, info: Option<&ParseInfo>) -> Result<bool> {
        let content = self.refined_text();
        if info.is_some_and(|info| info.md5code == cache::text_hash(&content)) {
            return Ok(false);
        }
        std::fs::write(path, &content)
            .with_context(|| format!("Failed to write page: {}", path.display()))?;
        log::info!("Refined {}", path.display());
        Ok(true)
    }

    /// Export the pairs as `<stem>.csv`, or `<stem>.error.csv` when the page
    /// does not split into whole left/right pairs.
    pub fn save_as_synonym(&self, path: &Path) -> Result<bool> {
        let items = self.group.items();
        let size = items.len() / 4;
        let succeeded = !items.is_empty() && items.len() % 4 == 0;

        let target = if succeeded {
            let stale = error_csv_path(path);
            if stale.exists() {
                std::fs::remove_file(&stale)
                    .with_context(|| format!("Failed to remove {}", stale.display()))?;
            }
            csv_path(path)
        } else {
            error_csv_path(path)
        };

        if let Err(e) = write_pairs(&target, items, size, succeeded) {
            std::fs::remove_file(&target).ok();
            return Err(e);
        }

        if succeeded {
            log::info!("Successfully saved into {}", target.display());
        } else {
            log::error!(
                "{} elements do not pair up, saved into {}",
                items.len(),
                target.display()
            );
        }
        Ok(succeeded)
    }
}

fn write_pairs(target: &Path, items: &[String], size: usize, complete: bool) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .from_path(target)
        .with_context(|| format!("Failed to create {}", target.display()))?;

    for index in 0..size {
        let first = index * 2;
        let second = first + size * 2;
        writer.write_record([&items[first], &items[first + 1]])?;
        writer.write_record([&items[second], &items[second + 1]])?;
    }

    let leftovers = &items[size * 4..];
    if !complete && !leftovers.is_empty() {
        writer.write_record(leftovers)?;
    }

    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = "abandon v. 放弃
ability n. 能力
desert v. 抛弃
capacity n. 才能
";

    fn scratch(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("recite_page_{}_{}", name, std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_refined_text_gap_after_left_column() {
        let page = SynonymPage::new(SentenceGroup::parse(PAGE));
        assert_eq!(
            page.refined_text(),
            "abandon\nv. 放弃\nability\nn. 能力\n\n\n\ndesert\nv. 抛弃\ncapacity\nn. 才能\n"
        );
    }

    #[test]
    fn test_reparsing_refined_page_keeps_hyphenated_words() {
        let page = SynonymPage::new(SentenceGroup::parse(
            "well-known adj. 著名的\nfamous adj. 有名的\nself-evident adj. 不言而喻的\nobvious adj. 明显的\n",
        ));
        let reparsed = SentenceGroup::parse(&page.refined_text());
        assert_eq!(&reparsed, page.group());
        assert_eq!(reparsed.items()[4], "self-evident");
    }

    #[test]
    fn test_read_writes_paired_csv() {
        let dir = scratch("ok");
        let path = dir.join("unit-b6-1.txt");
        std::fs::write(&path, PAGE).unwrap();
        std::fs::write(error_csv_path(&path), "stale").unwrap();

        assert!(SynonymPage::read(&path, None).unwrap());

        let csv = std::fs::read_to_string(csv_path(&path)).unwrap();
        assert_eq!(
            csv,
            "abandon\tv. 放弃\ndesert\tv. 抛弃\nability\tn. 能力\ncapacity\tn. 才能\n"
        );
        assert!(!error_csv_path(&path).exists());
        assert!(std::fs::read_to_string(&path).unwrap().contains("\n\n\n\n"));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_unpaired_page_goes_to_error_csv() {
        let dir = scratch("err");
        let path = dir.join("unit-b6-2.txt");
        std::fs::write(&path, "abandon v. 放弃\nability n. 能力\ndesert v. 抛弃\n").unwrap();

        assert!(!SynonymPage::read(&path, None).unwrap());

        let csv = std::fs::read_to_string(error_csv_path(&path)).unwrap();
        assert_eq!(csv, "abandon\tv. 放弃\nability\tn. 能力\ndesert\tv. 抛弃\n");
        assert!(!csv_path(&path).exists());

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_empty_page_fails() {
        let dir = scratch("empty");
        let path = dir.join("unit-b7-1.txt");
        std::fs::write(&path, "\n\n").unwrap();
        assert!(!SynonymPage::read(&path, None).unwrap());
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_refine_skips_unchanged_content() {
        let dir = scratch("skip");
        let path = dir.join("unit-b6-3.txt");
        std::fs::write(&path, PAGE).unwrap();

        let page = SynonymPage::new(SentenceGroup::parse(PAGE));
        let info = ParseInfo {
            md5code: cache::text_hash(&page.refined_text()),
            timestamp: 0,
        };
        assert!(!page.refine(&path, Some(&info)).unwrap());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), PAGE);
        assert!(page.refine(&path, None).unwrap());

        std::fs::remove_dir_all(&dir).ok();
    }
}
