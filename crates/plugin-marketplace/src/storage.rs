//! Key-value storage capability standing in for the browser's local storage.
//!
//! Values are opaque text blobs under string keys. Primitives are synchronous
//! like the store they replace; the async contract lives one layer up.

use marketplace_core::{MarketplaceError, MarketplaceResult};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

pub trait KeyValueStorage: Send + Sync {
    fn get(&self, key: &str) -> MarketplaceResult<Option<String>>;

    /// Fails with [`MarketplaceError::QuotaExceeded`] when the write would push
    /// the store past its quota; the previous value is then left in place.
    fn set(&self, key: &str, value: &str) -> MarketplaceResult<()>;

    fn remove(&self, key: &str) -> MarketplaceResult<()>;
}

fn check_quota(key: &str, attempted: u64, quota: Option<u64>) -> MarketplaceResult<()> {
    match quota {
        Some(limit) if attempted > limit => Err(MarketplaceError::QuotaExceeded {
            key: key.to_string(),
            attempted,
            limit,
        }),
        _ => Ok(()),
    }
}

fn entry_size(key: &str, value: &str) -> u64 {
    (key.len() + value.len()) as u64
}

/// In-process store. Used by tests and as the default backend.
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
    quota_bytes: Option<u64>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            quota_bytes: None,
        }
    }

    /// Quota counts key and value bytes across all entries.
    pub fn with_quota(quota_bytes: u64) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            quota_bytes: Some(quota_bytes),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get(&self, key: &str) -> MarketplaceResult<Option<String>> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> MarketplaceResult<()> {
        let mut entries = self.entries.lock();
        let others: u64 = entries
            .iter()
            .filter(|(k, _)| k.as_str() != key)
            .map(|(k, v)| entry_size(k, v))
            .sum();
        check_quota(key, others + entry_size(key, value), self.quota_bytes)?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> MarketplaceResult<()> {
        self.entries.lock().remove(key);
        Ok(())
    }
}

/// Durable store keeping one `<key>.json` file per key inside a directory.
pub struct FileStorage {
    dir: PathBuf,
    quota_bytes: Option<u64>,
    // Serialises writers so quota accounting sees a stable directory.
    write_lock: Mutex<()>,
}

impl FileStorage {
    pub fn open(dir: impl AsRef<Path>, quota_bytes: Option<u64>) -> MarketplaceResult<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        debug!(dir = %dir.display(), "File storage opened");
        Ok(Self {
            dir,
            quota_bytes,
            write_lock: Mutex::new(()),
        })
    }

    fn path_for(&self, key: &str) -> MarketplaceResult<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
            && !key.starts_with('.');
        if !valid {
            return Err(MarketplaceError::Storage(format!("invalid storage key '{key}'")));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }

    fn used_bytes_except(&self, skip: &Path) -> MarketplaceResult<u64> {
        let mut total = 0;
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            let path = entry.path();
            if path == skip || path.extension().map_or(true, |ext| ext != "json") {
                continue;
            }
            let key_len = path
                .file_stem()
                .map_or(0, |stem| stem.to_string_lossy().len()) as u64;
            total += key_len + entry.metadata()?.len();
        }
        Ok(total)
    }
}

impl KeyValueStorage for FileStorage {
    fn get(&self, key: &str) -> MarketplaceResult<Option<String>> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> MarketplaceResult<()> {
        let path = self.path_for(key)?;
        let _guard = self.write_lock.lock();

        let used = self.used_bytes_except(&path)?;
        check_quota(key, used + entry_size(key, value), self.quota_bytes)?;

        let tmp = path.with_extension("json.tmp");
        {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(value.as_bytes())?;
            file.sync_all()?;
        }
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> MarketplaceResult<()> {
        let path = self.path_for(key)?;
        let _guard = self.write_lock.lock();
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
