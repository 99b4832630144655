use crate::error::{Error, Result};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Bearer token attached to backend requests when present.
pub const ACCESS_TOKEN_KEY: &str = "access_token";
/// Last completeness level (string-encoded integer).
pub const COMPLETENESS_LEVEL_KEY: &str = "consult_omusubi";
/// Hex color matching [`COMPLETENESS_LEVEL_KEY`].
pub const COMPLETENESS_COLOR_KEY: &str = "consult_omusubi_color";
pub const DRAFT_KEY: &str = "consult:draft";
pub const CONSULTATION_ID_KEY: &str = "consultation_id";
pub const CONSULTATION_DATA_KEY: &str = "consultation_data";

/// Small string key/value store shared between views.
///
/// The realtime controller writes through it, other views read from it.
/// Implementations must be cheap enough to call on every level change.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

/// Process-local store, used in tests and for one-shot CLI runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.entries.lock().remove(key);
        Ok(())
    }
}

/// Durable store backed by a single JSON object on disk.
///
/// The whole file is rewritten on every mutation; values are tiny.
pub struct FileStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl FileStore {
    /// Open (or lazily create) the store at `path`. A leading `~` is expanded.
    pub fn open(path: &str) -> Result<Self> {
        let expanded = shellexpand::tilde(path).to_string();
        let path = PathBuf::from(expanded);
        let entries = if path.exists() {
            let raw = std::fs::read_to_string(&path)?;
            if raw.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&raw).map_err(|e| {
                    Error::Storage(format!("corrupt store {}: {e}", path.display()))
                })?
            }
        } else {
            BTreeMap::new()
        };
        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Blocking write. [`KeyValueStore`] is a sync trait and the file stays a
    /// few hundred bytes; callers never hold the controller's state lock here.
    /// Goes through a sibling `.tmp` file renamed over the target.
    fn flush(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() {
                std::fs::create_dir_all(dir)?;
            }
        }
        let body = serde_json::to_string_pretty(entries)?;
        let tmp = self.temp_path();
        std::fs::write(&tmp, body)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.entries.lock();
        entries.insert(key.to_string(), value.to_string());
        self.flush(&entries)
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut entries = self.entries.lock();
        if entries.remove(key).is_some() {
            self.flush(&entries)?;
        }
        Ok(())
    }
}
