//! Directory listing and file-name helpers.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// All files under `dir` (recursively) whose name ends with `suffix`, sorted.
pub fn list_files(dir: &Path, suffix: &str) -> Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    collect(dir, suffix, &mut found)?;
    found.sort();
    Ok(found)
}

fn collect(dir: &Path, suffix: &str, found: &mut Vec<PathBuf>) -> Result<()> {
    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("Failed to list directory: {}", dir.display()))?;
    for entry in entries {
        let path = entry?.path();
        if path.is_dir() {
            collect(&path, suffix, found)?;
        } else if file_name(&path).ends_with(suffix) {
            found.push(path);
        }
    }
    Ok(())
}

pub fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default()
}

/// Every run of ASCII digits in the file name, in order.
///
/// Only the final path component is inspected, so numbered directories do
/// not leak into chapter numbers.
pub fn file_numbers(path: &Path) -> Vec<u32> {
    file_name(path)
        .split(|c: char| !c.is_ascii_digit())
        .filter(|s| !s.is_empty())
        .filter_map(|s| s.parse().ok())
        .collect()
}

/// Keep only alphanumeric characters.
pub fn slugify(value: &str) -> String {
    value.chars().filter(|c| c.is_alphanumeric()).collect()
}
