//! Cache storage abstraction.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde_json::Value;

use super::error::StorageError;
use super::meta::CacheEntry;
use super::path::CacheKey;

/// Minimal file access the fetcher needs.
///
/// Implementations do not need atomic writes; a torn body record is read back as
/// corrupt and handled by the fallback tiers.
pub trait CacheStorage {
    /// Create a directory and its parents. Existing directories are not an error.
    fn create_dir_all(&self, dir: &Path) -> io::Result<()>;

    /// Read a text file, returning `None` if it does not exist.
    fn read_text(&self, path: &Path) -> io::Result<Option<String>>;

    /// Write a text file, replacing any previous content.
    fn write_text(&self, path: &Path, text: &str) -> io::Result<()>;
}

impl<S: CacheStorage + ?Sized> CacheStorage for &S {
    fn create_dir_all(&self, dir: &Path) -> io::Result<()> {
        (**self).create_dir_all(dir)
    }

    fn read_text(&self, path: &Path) -> io::Result<Option<String>> {
        (**self).read_text(path)
    }

    fn write_text(&self, path: &Path, text: &str) -> io::Result<()> {
        (**self).write_text(path, text)
    }
}

/// File-system based cache storage.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsStorage;

impl CacheStorage for FsStorage {
    fn create_dir_all(&self, dir: &Path) -> io::Result<()> {
        fs::create_dir_all(dir)
    }

    fn read_text(&self, path: &Path) -> io::Result<Option<String>> {
        match fs::read_to_string(path) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn write_text(&self, path: &Path, text: &str) -> io::Result<()> {
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)?;

        // Write atomically using tempfile
        let mut temp = tempfile::NamedTempFile::new_in(dir)?;
        temp.write_all(text.as_bytes())?;
        temp.persist(path).map_err(|e| e.error)?;
        Ok(())
    }
}

/// The validator and body records of one cache key.
pub struct EntryFiles<'a, S: ?Sized> {
    storage: &'a S,
    validator_path: PathBuf,
    body_path: PathBuf,
}

impl<'a, S: CacheStorage + ?Sized> EntryFiles<'a, S> {
    pub fn new(storage: &'a S, cache_dir: &Path, key: &CacheKey) -> Self {
        Self {
            storage,
            validator_path: key.validator_path(cache_dir),
            body_path: key.body_path(cache_dir),
        }
    }

    pub fn validator_path(&self) -> &Path {
        &self.validator_path
    }

    pub fn body_path(&self) -> &Path {
        &self.body_path
    }

    /// Read the stored validator. A blank record counts as absent.
    pub fn read_validator(&self) -> Result<Option<String>, StorageError> {
        let text = self
            .storage
            .read_text(&self.validator_path)
            .map_err(|e| StorageError::io(&self.validator_path, e))?;

        Ok(text
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty()))
    }

    /// Read and decode the stored body.
    pub fn read_body(&self) -> Result<Option<Value>, StorageError> {
        let Some(text) = self
            .storage
            .read_text(&self.body_path)
            .map_err(|e| StorageError::io(&self.body_path, e))?
        else {
            return Ok(None);
        };

        serde_json::from_str(&text)
            .map(Some)
            .map_err(|source| StorageError::Corrupt {
                path: self.body_path.clone(),
                source,
            })
    }

    /// Overwrite both records with `entry`.
    ///
    /// The validator record is blanked before the body is replaced and only
    /// rewritten afterwards, so a failure at any point leaves no validator next
    /// to a body it was not issued for. A missing validator is written as an
    /// empty record.
    pub fn write(&self, entry: &CacheEntry) -> Result<(), StorageError> {
        if let Some(body) = &entry.body {
            let text = serde_json::to_string(body).map_err(|source| StorageError::Corrupt {
                path: self.body_path.clone(),
                source,
            })?;
            self.write_validator("")?;
            self.storage
                .write_text(&self.body_path, &text)
                .map_err(|e| StorageError::io(&self.body_path, e))?;
        }

        self.write_validator(entry.validator.as_deref().unwrap_or_default())
    }

    fn write_validator(&self, validator: &str) -> Result<(), StorageError> {
        self.storage
            .write_text(&self.validator_path, validator)
            .map_err(|e| StorageError::io(&self.validator_path, e))
    }
}

/// Write the resolved value to an output file.
///
/// On failure the value is handed back inside the error.
pub fn write_output<S: CacheStorage + ?Sized>(
    storage: &S,
    path: &Path,
    value: &Value,
) -> Result<(), StorageError> {
    let output_error = |source: io::Error| StorageError::Output {
        path: path.to_path_buf(),
        source,
        resolved: Box::new(value.clone()),
    };

    let text = serde_json::to_string(value).map_err(|e| output_error(e.into()))?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        storage.create_dir_all(parent).map_err(output_error)?;
    }
    storage.write_text(path, &text).map_err(output_error)
}
