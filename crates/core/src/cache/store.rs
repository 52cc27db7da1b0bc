//! File-per-key response store.
//!
//! Each cached response lives in `<cache_dir>/<key>.http` and holds the raw
//! header block immediately followed by the raw body. The file modification
//! time is the only freshness signal: an entry older than the TTL is bypassed
//! on read and overwritten by the next successful fetch.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use super::hash::is_valid_key;
use crate::Error;
use crate::config::AppConfig;

/// File extension for cache entries.
const ENTRY_EXTENSION: &str = "http";

/// A fresh cache entry read from disk.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub key: String,
    /// Header block followed by body, exactly as persisted.
    pub bytes: Vec<u8>,
    pub modified: SystemTime,
}

impl CacheEntry {
    /// Age of the entry relative to `now`. Entries stamped in the future are zero-aged.
    pub fn age_at(&self, now: SystemTime) -> Duration {
        now.duration_since(self.modified).unwrap_or(Duration::ZERO)
    }
}

/// Disk cache rooted at a directory with a fixed freshness window.
#[derive(Debug, Clone)]
pub struct CacheStore {
    root: PathBuf,
    ttl: Duration,
}

impl CacheStore {
    /// Create a store rooted at `root`. The directory is created lazily on first write.
    pub fn new(root: impl Into<PathBuf>, ttl: Duration) -> Self {
        Self { root: root.into(), ttl }
    }

    /// Create a store from the loaded application configuration.
    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.cache_dir.clone(), config.cache_ttl())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Path of the file backing `key`.
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}.{ENTRY_EXTENSION}"))
    }

    /// Whether an entry last modified at `modified` is still fresh at `now`.
    pub fn is_fresh_at(&self, modified: SystemTime, now: SystemTime) -> bool {
        match now.duration_since(modified) {
            Ok(age) => age <= self.ttl,
            Err(_) => true,
        }
    }

    /// Look up a fresh entry for `key`.
    ///
    /// Returns `Ok(None)` when no file exists or the file is stale.
    pub fn get(&self, key: &str) -> Result<Option<CacheEntry>, Error> {
        self.get_at(key, SystemTime::now())
    }

    /// Look up a fresh entry for `key`, judging freshness against `now`.
    pub fn get_at(&self, key: &str, now: SystemTime) -> Result<Option<CacheEntry>, Error> {
        if !is_valid_key(key) {
            return Err(Error::CacheRead(format!("invalid cache key: {key}")));
        }

        let path = self.path_for(key);
        let metadata = match fs::metadata(&path) {
            Ok(m) => m,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(Error::CacheRead(format!("{}: {e}", path.display()))),
        };

        let modified = metadata
            .modified()
            .map_err(|e| Error::CacheRead(format!("{}: {e}", path.display())))?;

        if !self.is_fresh_at(modified, now) {
            tracing::debug!(key, "cache entry is stale");
            return Ok(None);
        }

        let bytes = match fs::read(&path) {
            Ok(b) => b,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(Error::CacheRead(format!("{}: {e}", path.display()))),
        };

        Ok(Some(CacheEntry { key: key.to_string(), bytes, modified }))
    }

    /// Persist `headers` followed by `body` under `key`.
    ///
    /// Failures are logged and swallowed; returns whether the entry was written.
    pub fn put(&self, key: &str, headers: &[u8], body: &[u8]) -> bool {
        match self.try_put(key, headers, body) {
            Ok(path) => {
                tracing::debug!(key, path = %path.display(), bytes = headers.len() + body.len(), "cached response");
                true
            }
            Err(e) => {
                tracing::warn!(key, error = %e, "failed to write cache entry");
                false
            }
        }
    }

    /// Persist an entry, reporting any failure as [`Error::CacheWrite`].
    ///
    /// Writes go to a sibling temporary file that is renamed into place, so a
    /// concurrent reader sees either the old entry or the new one.
    pub fn try_put(&self, key: &str, headers: &[u8], body: &[u8]) -> Result<PathBuf, Error> {
        if !is_valid_key(key) {
            return Err(Error::CacheWrite(format!("invalid cache key: {key}")));
        }

        fs::create_dir_all(&self.root)
            .map_err(|e| Error::CacheWrite(format!("failed to create {}: {e}", self.root.display())))?;

        let path = self.path_for(key);
        let tmp = self.root.join(format!("{key}.{ENTRY_EXTENSION}.tmp"));

        let mut data = Vec::with_capacity(headers.len() + body.len());
        data.extend_from_slice(headers);
        data.extend_from_slice(body);

        fs::write(&tmp, &data).map_err(|e| Error::CacheWrite(format!("{}: {e}", tmp.display())))?;
        fs::rename(&tmp, &path).map_err(|e| {
            let _ = fs::remove_file(&tmp);
            Error::CacheWrite(format!("{}: {e}", path.display()))
        })?;

        Ok(path)
    }

    /// Delete every stale entry. Returns the number of files removed.
    pub fn purge_stale(&self) -> Result<usize, Error> {
        self.purge_stale_at(SystemTime::now())
    }

    /// Delete every entry that is stale at `now`.
    pub fn purge_stale_at(&self, now: SystemTime) -> Result<usize, Error> {
        self.remove_entries(|modified| !self.is_fresh_at(modified, now))
    }

    /// Delete every entry regardless of age.
    pub fn clear(&self) -> Result<usize, Error> {
        self.remove_entries(|_| true)
    }

    fn remove_entries(&self, should_remove: impl Fn(SystemTime) -> bool) -> Result<usize, Error> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(Error::CacheRead(format!("{}: {e}", self.root.display()))),
        };

        let mut removed = 0;
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(ENTRY_EXTENSION) {
                continue;
            }
            if !path.file_stem().and_then(|s| s.to_str()).is_some_and(is_valid_key) {
                continue;
            }

            let Ok(modified) = entry.metadata().and_then(|m| m.modified()) else {
                continue;
            };

            if should_remove(modified) {
                match fs::remove_file(&path) {
                    Ok(()) => removed += 1,
                    Err(e) => tracing::warn!(path = %path.display(), error = %e, "failed to remove cache entry"),
                }
            }
        }

        tracing::debug!(removed, root = %self.root.display(), "purged cache entries");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::hash::compute_cache_key;
    use std::fs::File;
    use tempfile::TempDir;

    const TTL: Duration = Duration::from_secs(3600);

    fn store() -> (TempDir, CacheStore) {
        let dir = TempDir::new().unwrap();
        let store = CacheStore::new(dir.path().join("cache"), TTL);
        (dir, store)
    }

    fn set_mtime(path: &Path, when: SystemTime) {
        File::options().write(true).open(path).unwrap().set_modified(when).unwrap();
    }

    #[test]
    fn test_get_missing_entry() {
        let (_dir, store) = store();
        let key = compute_cache_key("http://example.com/");
        assert!(store.get(&key).unwrap().is_none());
    }

    #[test]
    fn test_put_then_get() {
        let (_dir, store) = store();
        let key = compute_cache_key("http://example.com/");
        assert!(store.put(&key, b"HTTP/1.1 200 OK\r\nContent-Type: text/html\r\n\r\n", b"<p>hi</p>"));

        let entry = store.get(&key).unwrap().unwrap();
        assert_eq!(entry.key, key);
        assert_eq!(entry.bytes, b"HTTP/1.1 200 OK\r\nContent-Type: text/html\r\n\r\n<p>hi</p>");
    }

    #[test]
    fn test_entry_fresh_within_ttl() {
        let (_dir, store) = store();
        let key = compute_cache_key("http://example.com/");
        let path = store.try_put(&key, b"HTTP/1.1 200 OK\r\n\r\n", b"body").unwrap();

        let written = SystemTime::now() - Duration::from_secs(10_000);
        set_mtime(&path, written);

        let at_half_ttl = written + Duration::from_secs(1800);
        assert!(store.get_at(&key, at_half_ttl).unwrap().is_some());
    }

    #[test]
    fn test_entry_stale_after_ttl() {
        let (_dir, store) = store();
        let key = compute_cache_key("http://example.com/");
        let path = store.try_put(&key, b"HTTP/1.1 200 OK\r\n\r\n", b"body").unwrap();

        let written = SystemTime::now() - Duration::from_secs(10_000);
        set_mtime(&path, written);

        let past_ttl = written + Duration::from_secs(3700);
        assert!(store.get_at(&key, past_ttl).unwrap().is_none());
        assert!(path.exists(), "stale entries are bypassed, not deleted");
    }

    #[test]
    fn test_stale_entry_overwritten() {
        let (_dir, store) = store();
        let key = compute_cache_key("http://example.com/");
        let path = store.try_put(&key, b"HTTP/1.1 200 OK\r\n\r\n", b"old").unwrap();
        set_mtime(&path, SystemTime::now() - Duration::from_secs(7200));
        assert!(store.get(&key).unwrap().is_none());

        store.try_put(&key, b"HTTP/1.1 200 OK\r\n\r\n", b"new").unwrap();
        let entry = store.get(&key).unwrap().unwrap();
        assert!(entry.bytes.ends_with(b"new"));
    }

    #[test]
    fn test_future_mtime_is_fresh() {
        let store = CacheStore::new("/nonexistent", TTL);
        let now = SystemTime::now();
        assert!(store.is_fresh_at(now + Duration::from_secs(60), now));
    }

    #[test]
    fn test_ttl_boundary() {
        let store = CacheStore::new("/nonexistent", TTL);
        let written = SystemTime::now();
        assert!(store.is_fresh_at(written, written + TTL));
        assert!(!store.is_fresh_at(written, written + TTL + Duration::from_secs(1)));
    }

    #[test]
    fn test_entry_age() {
        let modified = SystemTime::now();
        let entry = CacheEntry { key: String::new(), bytes: Vec::new(), modified };
        assert_eq!(entry.age_at(modified + Duration::from_secs(5)), Duration::from_secs(5));
        assert_eq!(entry.age_at(modified - Duration::from_secs(5)), Duration::ZERO);
    }

    #[test]
    fn test_put_failure_is_not_fatal() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"not a directory").unwrap();

        let store = CacheStore::new(blocker.join("cache"), TTL);
        let key = compute_cache_key("http://example.com/");
        assert!(!store.put(&key, b"HTTP/1.1 200 OK\r\n\r\n", b"body"));
        assert!(matches!(store.try_put(&key, b"", b""), Err(Error::CacheWrite(_))));
    }

    #[test]
    fn test_rejects_invalid_key() {
        let (_dir, store) = store();
        assert!(matches!(store.get("../escape"), Err(Error::CacheRead(_))));
        assert!(matches!(store.try_put("../escape", b"", b""), Err(Error::CacheWrite(_))));
    }

    #[test]
    fn test_purge_stale() {
        let (_dir, store) = store();
        let fresh = compute_cache_key("http://example.com/fresh");
        let stale = compute_cache_key("http://example.com/stale");
        store.try_put(&fresh, b"HTTP/1.1 200 OK\r\n\r\n", b"").unwrap();
        let stale_path = store.try_put(&stale, b"HTTP/1.1 200 OK\r\n\r\n", b"").unwrap();
        set_mtime(&stale_path, SystemTime::now() - Duration::from_secs(7200));

        assert_eq!(store.purge_stale().unwrap(), 1);
        assert!(store.get(&fresh).unwrap().is_some());
        assert!(!stale_path.exists());
    }

    #[test]
    fn test_clear_skips_foreign_files() {
        let (_dir, store) = store();
        store.try_put(&compute_cache_key("http://a.example/"), b"", b"").unwrap();
        store.try_put(&compute_cache_key("http://b.example/"), b"", b"").unwrap();
        let foreign = store.root().join("notes.txt");
        std::fs::write(&foreign, b"keep me").unwrap();

        assert_eq!(store.clear().unwrap(), 2);
        assert!(foreign.exists());
    }

    #[test]
    fn test_purge_missing_root() {
        let (_dir, store) = store();
        assert_eq!(store.purge_stale().unwrap(), 0);
        assert_eq!(store.clear().unwrap(), 0);
    }
}
