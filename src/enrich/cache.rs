// LogWarden - enrich/cache.rs
//
// Disk-backed key/value cache for enrichment lookups, one JSON file per key
// with a per-read TTL.
//
// The cache never raises: every failure mode (missing file, unreadable file,
// malformed JSON, missing stamp, expired entry, unwritable directory)
// degrades to a miss or a `false` return so the caller can always fall back
// to fetching fresh data.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// On-disk payload: a write stamp plus the caller's JSON-serialisable value.
#[derive(Debug, Serialize, Deserialize)]
struct CacheEntry {
    /// Write time as float epoch seconds. Float, so a TTL of zero observes
    /// any elapsed time at all as stale.
    cached_at: f64,
    value: serde_json::Value,
}

/// Current time as float epoch seconds.
fn now_epoch_secs() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

/// A directory of JSON cache files, one per key.
#[derive(Debug, Clone)]
pub struct FileCache {
    dir: PathBuf,
}

impl FileCache {
    /// Open a cache over an explicit directory (created best-effort).
    pub fn at(dir: PathBuf) -> Self {
        if let Err(e) = fs::create_dir_all(&dir) {
            tracing::warn!(
                dir = %dir.display(),
                error = %e,
                "Cannot create cache directory; cache will miss"
            );
        }
        Self { dir }
    }

    /// The directory this cache manages.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Map a key to its cache file. Path separators and the `:` namespace
    /// separator are transliterated to `_` so any key is filesystem-safe.
    fn path_for(&self, key: &str) -> PathBuf {
        let safe: String = key
            .chars()
            .map(|c| match c {
                ':' | '/' | '\\' => '_',
                c => c,
            })
            .collect();
        self.dir.join(format!("{safe}.json"))
    }

    /// Read the value stored under `key`, treating anything older than `ttl`
    /// as absent.
    ///
    /// Returns `None` when the file is missing, unreadable, not valid JSON,
    /// missing its stamp, expired, or when the stored value does not
    /// deserialise as `T`. Expired files are opportunistically deleted;
    /// deletion failure is ignored.
    pub fn get<T: DeserializeOwned>(&self, key: &str, ttl: Duration) -> Option<T> {
        let path = self.path_for(key);
        let text = fs::read_to_string(&path).ok()?;
        let entry: CacheEntry = serde_json::from_str(&text).ok()?;

        let age = now_epoch_secs() - entry.cached_at;
        if age > ttl.as_secs_f64() {
            tracing::debug!(key, age_secs = age, "Cache entry expired");
            let _ = fs::remove_file(&path);
            return None;
        }

        serde_json::from_value(entry.value).ok()
    }

    /// Store `value` under `key`, stamped with the current time.
    ///
    /// Returns `false` on any serialisation or write failure; enrichment
    /// proceeds network-only when the cache is unusable.
    pub fn set<T: Serialize>(&self, key: &str, value: &T) -> bool {
        let value = match serde_json::to_value(value) {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(key, error = %e, "Cache value not serialisable");
                return false;
            }
        };
        let entry = CacheEntry {
            cached_at: now_epoch_secs(),
            value,
        };
        let text = match serde_json::to_string(&entry) {
            Ok(t) => t,
            Err(e) => {
                tracing::warn!(key, error = %e, "Cache entry not serialisable");
                return false;
            }
        };

        let path = self.path_for(key);
        match fs::write(&path, text) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(key, path = %path.display(), error = %e, "Cache write failed");
                false
            }
        }
    }

    /// Delete every cache file in the managed directory, ignoring individual
    /// deletion failures. Returns the number of files removed.
    pub fn clear(&self) -> usize {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(_) => return 0,
        };

        let mut removed = 0;
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json")
                && fs::remove_file(&path).is_ok()
            {
                removed += 1;
            }
        }
        tracing::debug!(removed, dir = %self.dir.display(), "Cache cleared");
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::tempdir;

    const LONG_TTL: Duration = Duration::from_secs(3600);

    #[test]
    fn set_then_get_round_trips() {
        let dir = tempdir().unwrap();
        let cache = FileCache::at(dir.path().to_path_buf());

        assert!(cache.set("geo:8.8.8.8", &"hello".to_string()));
        let value: Option<String> = cache.get("geo:8.8.8.8", LONG_TTL);
        assert_eq!(value.as_deref(), Some("hello"));
    }

    #[test]
    fn get_missing_key_is_none() {
        let dir = tempdir().unwrap();
        let cache = FileCache::at(dir.path().to_path_buf());
        let value: Option<String> = cache.get("absent", LONG_TTL);
        assert!(value.is_none());
    }

    #[test]
    fn zero_ttl_expires_after_any_elapsed_time() {
        let dir = tempdir().unwrap();
        let cache = FileCache::at(dir.path().to_path_buf());

        assert!(cache.set("k", &42u32));
        std::thread::sleep(Duration::from_millis(10));
        let value: Option<u32> = cache.get("k", Duration::ZERO);
        assert!(value.is_none(), "zero TTL must read as a miss");
    }

    #[test]
    fn expired_entry_file_is_removed() {
        let dir = tempdir().unwrap();
        let cache = FileCache::at(dir.path().to_path_buf());

        cache.set("k", &1u32);
        std::thread::sleep(Duration::from_millis(10));
        let _: Option<u32> = cache.get("k", Duration::ZERO);

        // The stale file was opportunistically deleted, so even a large TTL
        // now misses.
        let value: Option<u32> = cache.get("k", LONG_TTL);
        assert!(value.is_none());
    }

    #[test]
    fn corrupted_file_is_a_miss() {
        let dir = tempdir().unwrap();
        let cache = FileCache::at(dir.path().to_path_buf());

        std::fs::write(dir.path().join("bad.json"), "{not json").unwrap();
        let value: Option<String> = cache.get("bad", LONG_TTL);
        assert!(value.is_none());
    }

    #[test]
    fn missing_stamp_is_a_miss() {
        let dir = tempdir().unwrap();
        let cache = FileCache::at(dir.path().to_path_buf());

        std::fs::write(dir.path().join("stampless.json"), r#"{"value": 5}"#).unwrap();
        let value: Option<u32> = cache.get("stampless", LONG_TTL);
        assert!(value.is_none());
    }

    #[test]
    fn wrong_value_shape_is_a_miss() {
        let dir = tempdir().unwrap();
        let cache = FileCache::at(dir.path().to_path_buf());

        cache.set("k", &"text".to_string());
        let value: Option<u32> = cache.get("k", LONG_TTL);
        assert!(value.is_none());
    }

    #[test]
    fn keys_are_transliterated_to_safe_filenames() {
        let dir = tempdir().unwrap();
        let cache = FileCache::at(dir.path().to_path_buf());

        assert!(cache.set("geo:8.8.8.8", &1u32));
        assert!(cache.set("a/b\\c", &2u32));

        assert!(dir.path().join("geo_8.8.8.8.json").exists());
        assert!(dir.path().join("a_b_c.json").exists());

        let value: Option<u32> = cache.get("a/b\\c", LONG_TTL);
        assert_eq!(value, Some(2));
    }

    #[test]
    fn clear_removes_everything_and_reports_count() {
        let dir = tempdir().unwrap();
        let cache = FileCache::at(dir.path().to_path_buf());

        cache.set("a", &1u32);
        cache.set("b", &2u32);
        cache.set("c", &3u32);

        assert_eq!(cache.clear(), 3);
        let value: Option<u32> = cache.get("a", LONG_TTL);
        assert!(value.is_none());
        assert_eq!(cache.clear(), 0);
    }
}
