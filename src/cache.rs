//! This module provides a local cache for portal documents
//!
//! Every resource is stored as-is in its own file, so that each of them can be refreshed independently.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::error::Result;

/// A document as it was last fetched from the server
#[derive(Clone, Debug, PartialEq)]
pub struct CacheEntry {
    pub resource_name: String,
    pub payload: Vec<u8>,
    pub fetched_at: DateTime<Utc>,
    /// Only successful fetches are stored, so this is always `200`
    pub status_code: u16,
}

impl CacheEntry {
    /// The payload, as text
    pub fn text(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.payload)
    }
}

/// A directory that holds one file per cached resource
#[derive(Clone, Debug, PartialEq)]
pub struct Cache {
    dir: PathBuf,
}

impl Cache {
    /// Create a cache backed by `dir`. The directory is created if needed
    pub fn new(dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(dir)?;
        Ok(Self { dir: PathBuf::from(dir) })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Get the path to the file that backs a resource
    pub fn path_of(&self, resource_name: &str) -> PathBuf {
        self.dir.join(sanitize_filename::sanitize(resource_name))
    }

    pub fn exists(&self, resource_name: &str) -> bool {
        self.path_of(resource_name).is_file()
    }

    /// Replace the cached copy of a resource. Readers either see the previous or the new content, never a mix
    pub fn store(&self, resource_name: &str, payload: &[u8]) -> Result<()> {
        let path = self.path_of(resource_name);
        crate::utils::write_atomically(&path, payload)?;
        log::debug!("Cached {} bytes for {} in {:?}", payload.len(), resource_name, path);
        Ok(())
    }

    /// Read the cached copy of a resource, if any
    pub fn load(&self, resource_name: &str) -> Result<Option<CacheEntry>> {
        let path = self.path_of(resource_name);
        let payload = match std::fs::read(&path) {
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
            Ok(p) => p,
        };
        let fetched_at = match std::fs::metadata(&path).and_then(|m| m.modified()) {
            Ok(time) => DateTime::<Utc>::from(time),
            Err(err) => {
                log::warn!("Unable to get modification time of {:?}: {}", path, err);
                Utc::now()
            },
        };

        Ok(Some(CacheEntry {
            resource_name: resource_name.to_string(),
            payload,
            fetched_at,
            status_code: 200,
        }))
    }

    /// Delete the cached copy of a resource. Returns whether there was one
    pub fn remove(&self, resource_name: &str) -> Result<bool> {
        match std::fs::remove_file(self.path_of(resource_name)) {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(err.into()),
        }
    }

    /// Delete every cached resource. Returns how many were removed
    ///
    /// Temporary files of interrupted writes are left alone.
    pub fn clear(&self) -> Result<usize> {
        let mut removed = 0;
        for entry in std::fs::read_dir(&self.dir)? {
            let entry = entry?;
            if entry.file_type()?.is_file() == false {
                continue;
            }
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if name.starts_with('.') && name.ends_with(".tmp") {
                continue;
            }
            std::fs::remove_file(entry.path())?;
            removed += 1;
        }
        log::debug!("Removed {} cached resources from {:?}", removed, self.dir);
        Ok(removed)
    }
}
