//! Disk-backed page cache keyed by URL hash.
//!
//! One file per URL, named `<md5 hex>.wbc`, stored flat under the cache root.
//! The file's modification time is the fetch time.

use chrono::{DateTime, Utc};
use md5::{Digest, Md5};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use weatherapp_core::config::DEFAULT_CACHING_TIME;
use weatherapp_core::{AppError, CacheError};

use crate::fetch::Fetcher;
use crate::prompt::Prompt;
use crate::types::Page;

pub const CACHE_EXTENSION: &str = "wbc";

const CLEAR_QUESTION: &str = "Do you really want to remove all cache files with directory?";

/// Metadata of a stored page
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub key: String,
    pub path: PathBuf,
    pub modified: SystemTime,
}

impl CacheEntry {
    pub fn fetched_at(&self) -> DateTime<Utc> {
        DateTime::<Utc>::from(self.modified)
    }

    /// Time since the entry was written. Modification times in the future count as zero.
    pub fn age(&self) -> Duration {
        SystemTime::now()
            .duration_since(self.modified)
            .unwrap_or(Duration::ZERO)
    }
}

/// Outcome of clearing the cache
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClearReport {
    pub files_removed: usize,
    pub directory_removed: bool,
}

#[derive(Clone)]
pub struct PageCache {
    root: PathBuf,
    ttl: Duration,
    fetcher: Arc<dyn Fetcher>,
}

impl std::fmt::Debug for PageCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageCache")
            .field("root", &self.root)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl PageCache {
    pub fn new(root: impl Into<PathBuf>, fetcher: Arc<dyn Fetcher>) -> Self {
        Self {
            root: root.into(),
            ttl: minutes(DEFAULT_CACHING_TIME),
            fetcher,
        }
    }

    /// A view of the same cache with a different time-to-live.
    ///
    /// Entries are shared; only freshness is judged differently.
    pub fn with_ttl_minutes(&self, ttl_minutes: u32) -> Self {
        Self {
            root: self.root.clone(),
            ttl: minutes(ttl_minutes),
            fetcher: Arc::clone(&self.fetcher),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Stable key for a URL
    pub fn key_for(url: &str) -> String {
        hex::encode(Md5::digest(url.as_bytes()))
    }

    pub fn path_for(&self, url: &str) -> PathBuf {
        self.root
            .join(format!("{}.{}", Self::key_for(url), CACHE_EXTENSION))
    }

    /// Entry metadata for `url`, if a cached file exists
    pub fn entry(&self, url: &str) -> Result<Option<CacheEntry>, CacheError> {
        let path = self.path_for(url);
        let metadata = match fs::metadata(&path) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(CacheError::Read { path, source }),
        };

        let modified = metadata
            .modified()
            .map_err(|source| CacheError::Read {
                path: path.clone(),
                source,
            })?;

        Ok(Some(CacheEntry {
            key: Self::key_for(url),
            path,
            modified,
        }))
    }

    fn is_fresh(&self, entry: &CacheEntry) -> bool {
        entry.age() < self.ttl
    }

    /// Return the body for `url`, from disk when fresh, otherwise from the network.
    ///
    /// `force_reload` always fetches and overwrites the stored entry.
    pub fn get(&self, url: &str, force_reload: bool) -> Result<Vec<u8>, AppError> {
        if !force_reload {
            if let Some(entry) = self.entry(url)? {
                if self.is_fresh(&entry) {
                    tracing::debug!("Cache hit for {} ({})", url, entry.key);
                    let body = fs::read(&entry.path).map_err(|source| CacheError::Read {
                        path: entry.path,
                        source,
                    })?;
                    return Ok(body);
                }
                tracing::debug!("Cache entry for {} is stale", url);
            }
        }

        tracing::info!("Fetching {}", url);
        let body = self.fetcher.fetch(url)?;
        self.store(url, &body)?;
        Ok(body)
    }

    /// `get` decoded into a page
    pub fn load_page(&self, url: &str, force_reload: bool) -> Result<Page, AppError> {
        let body = self.get(url, force_reload)?;
        Ok(Page::from_bytes(url, &body))
    }

    /// Write `body` under the key for `url`.
    ///
    /// Goes through a temporary file in the cache root and a rename so a
    /// reader never sees a partial entry.
    fn store(&self, url: &str, body: &[u8]) -> Result<(), CacheError> {
        fs::create_dir_all(&self.root).map_err(|source| CacheError::CreateDir {
            path: self.root.clone(),
            source,
        })?;

        let path = self.path_for(url);
        let write_err = |source| CacheError::Write {
            path: path.clone(),
            source,
        };

        let mut tmp = tempfile::NamedTempFile::new_in(&self.root).map_err(write_err)?;
        tmp.write_all(body).map_err(write_err)?;
        tmp.persist(&path).map_err(|e| write_err(e.error))?;

        tracing::debug!("Cached {} bytes for {} at {}", body.len(), url, path.display());
        Ok(())
    }

    /// Delete every cached file, then the cache directory.
    ///
    /// The next `get` recreates the directory.
    pub fn clear(&self) -> Result<ClearReport, CacheError> {
        let mut report = ClearReport::default();

        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(report),
            Err(source) => {
                return Err(CacheError::Read {
                    path: self.root.clone(),
                    source,
                })
            }
        };

        for entry in entries {
            let entry = entry.map_err(|source| CacheError::Read {
                path: self.root.clone(),
                source,
            })?;
            let path = entry.path();
            if path.is_file() {
                fs::remove_file(&path).map_err(|source| CacheError::Remove {
                    path: path.clone(),
                    source,
                })?;
                report.files_removed += 1;
            }
        }

        fs::remove_dir(&self.root).map_err(|source| CacheError::Remove {
            path: self.root.clone(),
            source,
        })?;
        report.directory_removed = true;

        tracing::info!(
            "Removed {} cache files and {}",
            report.files_removed,
            self.root.display()
        );
        Ok(report)
    }

    /// Ask for confirmation, then clear. Returns `None` when declined.
    pub fn clear_confirmed(
        &self,
        prompt: &mut dyn Prompt,
    ) -> Result<Option<ClearReport>, AppError> {
        if !prompt.confirm(CLEAR_QUESTION)? {
            tracing::info!("Cache clear declined");
            return Ok(None);
        }
        Ok(Some(self.clear()?))
    }
}

fn minutes(m: u32) -> Duration {
    Duration::from_secs(u64::from(m) * 60)
}
