//! Raw-document cache.
//!
//! Job documents are cached on disk under `{date}_{uuid}.html` so repeated
//! mining passes over the same date avoid re-fetching. Presence is the only
//! hit test: there is no staleness policy, and an entry is treated as
//! authoritative unless a refresh is explicitly requested.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use crate::error::{AppError, Result};

/// How the orchestrator combines the cache with the remote source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CachePolicy {
    /// Load from cache when present, otherwise fetch and cache.
    FetchIfAbsent,
    /// Fetch unconditionally, overwriting any cache entry.
    AlwaysFetch,
    /// Only use the cache; an absent entry fails the item. Identifier
    /// discovery enumerates the cache directory instead of issuing the
    /// listing request, so no network traffic occurs at all.
    NeverFetch,
}

/// Filesystem cache of raw job documents keyed by `(date, uuid)`.
pub struct JobCache {
    root: PathBuf,
}

impl JobCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn file_name(date: NaiveDate, uuid: &str) -> String {
        format!("{}_{uuid}.html", date.format("%Y-%m-%d"))
    }

    fn path(&self, date: NaiveDate, uuid: &str) -> PathBuf {
        self.root.join(Self::file_name(date, uuid))
    }

    /// Load a cached document, `None` if absent.
    pub fn load(&self, date: NaiveDate, uuid: &str) -> Result<Option<String>> {
        match fs::read_to_string(self.path(date, uuid)) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }

    /// Store a document atomically (write to temp, then rename).
    pub fn store(&self, date: NaiveDate, uuid: &str, text: &str) -> Result<()> {
        fs::create_dir_all(&self.root)?;
        let path = self.path(date, uuid);
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, text)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    /// Identifiers cached for a date, sorted.
    pub fn entries(&self, date: NaiveDate) -> Result<Vec<String>> {
        let prefix = format!("{}_", date.format("%Y-%m-%d"));
        let mut uuids = Vec::new();

        let dir = match fs::read_dir(&self.root) {
            Ok(dir) => dir,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(uuids),
            Err(e) => return Err(AppError::Io(e)),
        };

        for entry in dir {
            let name = entry?.file_name();
            let Some(name) = name.to_str() else { continue };
            if let Some(stem) = name.strip_prefix(&prefix).and_then(|s| s.strip_suffix(".html")) {
                uuids.push(stem.to_string());
            }
        }
        uuids.sort();
        Ok(uuids)
    }

    /// Root directory of the cache.
    pub fn root(&self) -> &Path {
        &self.root
    }
}
