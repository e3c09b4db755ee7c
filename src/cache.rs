//! Content-addressable run cache.
//!
//! A run is keyed by a SHA-256 digest over the document text and the
//! configuration that influences the produced output. Entries live as JSON
//! files in the cache directory. A hit is detected and logged but does not
//! short-circuit recomputation; the signal exists so a separate process can
//! skip reprocessing later.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::config::Config;
use crate::latex::scanner::MultiArgCommand;

/// Completion status of a cache entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryStatus {
    Pending,
    Complete,
}

/// One cached run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    pub status: EntryStatus,
    pub text: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Deterministic key over the pair (document text, relevant configuration).
/// Identical pairs always produce identical keys.
pub fn cache_key(text: &str, config: &Config, multi_arg: &[MultiArgCommand]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    hasher.update([0]);
    hasher.update(config.char_limit.to_le_bytes());
    hasher.update([config.make_complete as u8, config.keep_command_wrappers as u8]);
    // serde_json keeps struct field order, so this is deterministic.
    let rules = serde_json::to_string(multi_arg).expect("scan rules serialize");
    hasher.update(rules.as_bytes());
    let digest = hasher.finalize();
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Directory of cache entry files.
#[derive(Debug, Clone)]
pub struct RunCache {
    dir: PathBuf,
}

impl RunCache {
    /// Open (creating if needed) the cache at `dir`, or the platform cache
    /// directory when none is given.
    pub fn open(dir: Option<PathBuf>) -> Result<Self> {
        let dir = match dir {
            Some(dir) => dir,
            None => dirs::cache_dir()
                .context("Could not determine cache directory")?
                .join("flattex"),
        };
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create cache directory: {}", dir.display()))?;
        Ok(Self { dir })
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }

    /// Remove stale entries: anything still pending is a leftover from an
    /// interrupted run and will never complete.
    pub fn purge_stale(&self) -> Result<usize> {
        let mut removed = 0;
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().map_or(true, |ext| ext != "json") {
                continue;
            }
            let stale = match self.read_entry_file(&path) {
                Some(entry) => entry.status == EntryStatus::Pending,
                None => true, // unparseable entry, drop it
            };
            if stale {
                debug!(path = %path.display(), "purging stale cache entry");
                fs::remove_file(&path)?;
                removed += 1;
            }
        }
        Ok(removed)
    }

    /// Hit/miss signal for `key`.
    pub fn contains(&self, key: &str) -> bool {
        self.entry_path(key).exists()
    }

    /// Record the start of a run as a pending entry.
    pub fn create(&self, key: &str) -> Result<()> {
        if self.contains(key) {
            info!(%key, "cache hit (run proceeds; hit is a signal only)");
        }
        self.write_entry(
            key,
            &CacheEntry {
                status: EntryStatus::Pending,
                text: None,
                created_at: Utc::now(),
            },
        )
    }

    /// Mark a run complete, storing the produced text.
    pub fn complete(&self, key: &str, text: &str) -> Result<()> {
        self.write_entry(
            key,
            &CacheEntry {
                status: EntryStatus::Complete,
                text: Some(text.to_string()),
                created_at: Utc::now(),
            },
        )
    }

    /// Read the entry for `key`, if present and parseable.
    pub fn get(&self, key: &str) -> Option<CacheEntry> {
        self.read_entry_file(&self.entry_path(key))
    }

    fn read_entry_file(&self, path: &std::path::Path) -> Option<CacheEntry> {
        let content = fs::read_to_string(path).ok()?;
        serde_json::from_str(&content).ok()
    }

    fn write_entry(&self, key: &str, entry: &CacheEntry) -> Result<()> {
        let path = self.entry_path(key);
        let json = serde_json::to_string(entry)?;
        fs::write(&path, json)
            .with_context(|| format!("Failed to write cache entry: {}", path.display()))?;
        Ok(())
    }
}
