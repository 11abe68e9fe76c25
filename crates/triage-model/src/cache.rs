//! Content-addressed memoization of parsed contribution logs.
//!
//! A [`RecordCache`] remembers the parsed records for each input path along
//! with the SHA-256 of the bytes they were parsed from. Loading the same
//! unchanged file again returns the shared records without re-parsing; any
//! change to the file's content invalidates the entry.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use sha2::{Digest, Sha256};
use triage_core::TriageError;

use crate::records::{parse_records, ContributionRecord};

/// Parsed records shared between callers.
pub type SharedRecords = Arc<[ContributionRecord]>;

/// Hex-encoded SHA-256 of `bytes`.
///
/// # Examples
///
/// ```
/// use triage_model::cache::content_hash;
///
/// assert_eq!(content_hash(b"a"), content_hash(b"a"));
/// assert_ne!(content_hash(b"a"), content_hash(b"b"));
/// assert_eq!(content_hash(b"").len(), 64);
/// ```
pub fn content_hash(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

#[derive(Debug)]
struct Entry {
    hash: String,
    records: SharedRecords,
}

/// Read-through cache of parsed contribution logs keyed by path and content.
///
/// # Examples
///
/// ```no_run
/// use std::path::Path;
/// use std::sync::Arc;
/// use triage_model::cache::RecordCache;
///
/// let mut cache = RecordCache::new();
/// let first = cache.load(Path::new("data/commits.csv")).unwrap();
/// let second = cache.load(Path::new("data/commits.csv")).unwrap();
/// assert!(Arc::ptr_eq(&first, &second));
/// ```
#[derive(Debug, Default)]
pub struct RecordCache {
    entries: HashMap<PathBuf, Entry>,
}

impl RecordCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the log at `path`, reusing the cached parse if its content is
    /// unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`TriageError::DataLoad`] if the file cannot be read or fails
    /// validation. A failed load leaves any previous entry for `path` in
    /// place.
    pub fn load(&mut self, path: &Path) -> Result<SharedRecords, TriageError> {
        let input = path.display().to_string();
        let bytes = std::fs::read(path)
            .map_err(|e| TriageError::data_load(&input, format!("cannot read file: {e}")))?;
        let hash = content_hash(&bytes);

        if let Some(entry) = self.entries.get(path) {
            if entry.hash == hash {
                tracing::debug!(input, "record cache hit");
                return Ok(Arc::clone(&entry.records));
            }
            tracing::debug!(input, "record cache stale, reparsing");
        }

        let records: SharedRecords = parse_records(bytes.as_slice(), &input)?.into();
        self.entries.insert(
            path.to_path_buf(),
            Entry {
                hash,
                records: Arc::clone(&records),
            },
        );
        tracing::info!(input, records = records.len(), "loaded contribution log");
        Ok(records)
    }

    /// Content hash of the cached parse for `path`, if any.
    pub fn hash_of(&self, path: &Path) -> Option<&str> {
        self.entries.get(path).map(|e| e.hash.as_str())
    }

    /// Drop the entry for `path`. Returns whether one existed.
    pub fn invalidate(&mut self, path: &Path) -> bool {
        self.entries.remove(path).is_some()
    }

    /// Number of cached inputs.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOG: &str = "source,target,weight,start_date,end_date,year\n\
                       alice,Crash,5,2021-01-01,2021-02-01,2021\n";

    #[test]
    fn unchanged_file_is_served_from_cache() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("commits.csv");
        std::fs::write(&path, LOG).unwrap();

        let mut cache = RecordCache::new();
        let first = cache.load(&path).unwrap();
        let second = cache.load(&path).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.hash_of(&path), Some(content_hash(LOG.as_bytes()).as_str()));
    }

    #[test]
    fn changed_content_is_reparsed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("commits.csv");
        std::fs::write(&path, LOG).unwrap();

        let mut cache = RecordCache::new();
        let first = cache.load(&path).unwrap();
        assert_eq!(first.len(), 1);

        std::fs::write(&path, format!("{LOG}bob,UI,2,2021-01-01,2021-02-01,2021\n")).unwrap();
        let second = cache.load(&path).unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(second.len(), 2);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn invalidate_forces_reparse() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("commits.csv");
        std::fs::write(&path, LOG).unwrap();

        let mut cache = RecordCache::new();
        let first = cache.load(&path).unwrap();
        assert!(cache.invalidate(&path));
        assert!(!cache.invalidate(&path));
        let second = cache.load(&path).unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(first, second);
    }

    #[test]
    fn failed_load_keeps_previous_entry() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("commits.csv");
        std::fs::write(&path, LOG).unwrap();

        let mut cache = RecordCache::new();
        cache.load(&path).unwrap();
        std::fs::write(&path, "source,target\nalice,Crash\n").unwrap();
        assert!(cache.load(&path).is_err());
        assert_eq!(cache.hash_of(&path), Some(content_hash(LOG.as_bytes()).as_str()));
    }

    #[test]
    fn missing_file_is_data_load_error() {
        let mut cache = RecordCache::new();
        let err = cache.load(Path::new("/nonexistent/commits.csv")).unwrap_err();
        assert!(matches!(err, TriageError::DataLoad { .. }));
        assert!(cache.is_empty());
    }
}
