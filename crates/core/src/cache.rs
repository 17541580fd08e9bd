//! Content-hash naming for generated audio and parse fingerprints.
//!
//! Synthesized clips are stored as `<dir>/<md5(text)>.<ext>` so a phrase is
//! only synthesized once. The same md5 hex digest fingerprints dictionary
//! pages in the parse-state file.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use md5::{Digest, Md5};

/// md5 hex digest of a string's UTF-8 bytes.
pub fn text_hash(text: &str) -> String {
    let mut hasher = Md5::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// md5 hex digest of a file's contents.
///
/// Returns a 32-character hex string.
pub fn file_hash(path: &Path) -> Result<String> {
    let mut hasher = Md5::new();
    let mut file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open file for hashing: {}", path.display()))?;
    std::io::copy(&mut file, &mut hasher)?;
    Ok(format!("{:x}", hasher.finalize()))
}

/// Atomically write data to a file via temp file + rename.
pub fn atomic_write(target: &Path, data: &[u8]) -> Result<()> {
    if let Some(parent) = target.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let tmp_path = target.with_extension("tmp");
    std::fs::write(&tmp_path, data)?;
    std::fs::rename(&tmp_path, target)?;
    Ok(())
}

/// Path prefix (no extension) under which audio for `text` is stored.
pub fn audio_prefix(dir: &Path, text: &str) -> PathBuf {
    dir.join(text_hash(text))
}

/// Return the cached audio for `text`, or None if not cached.
pub fn get_cached_audio(dir: &Path, text: &str, extension: &str) -> Option<PathBuf> {
    let path = audio_prefix(dir, text).with_extension(extension);
    if path.exists() && path.metadata().map(|m| m.len() > 0).unwrap_or(false) {
        log::debug!("Cache hit: {:?} -> {}", text, path.display());
        Some(path)
    } else {
        None
    }
}
