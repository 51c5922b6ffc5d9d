//! Per-page result cache over a plain string key-value store.
//!
//! One entry per page identity, last write wins, never expires.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex as StdMutex;
use tracing::{debug, warn};

use crate::chapters::ExtractionResult;
use crate::youtube::PageIdentity;

/// String key-value persistence. No transactions, no expiry.
pub trait Store: Send + Sync {
  fn get(&self, key: &str) -> Result<Option<String>>;
  fn set(&self, key: &str, value: String) -> Result<()>;
}

impl<T: Store + ?Sized> Store for Box<T> {
  fn get(&self, key: &str) -> Result<Option<String>> {
    (**self).get(key)
  }

  fn set(&self, key: &str, value: String) -> Result<()> {
    (**self).set(key, value)
  }
}

/// Process-local store, used by tests.
#[derive(Default)]
pub struct MemoryStore {
  entries: StdMutex<BTreeMap<String, String>>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }
}

impl Store for MemoryStore {
  fn get(&self, key: &str) -> Result<Option<String>> {
    let entries = self.entries.lock().map_err(|_| anyhow::anyhow!("memory store lock poisoned"))?;
    Ok(entries.get(key).cloned())
  }

  fn set(&self, key: &str, value: String) -> Result<()> {
    let mut entries = self.entries.lock().map_err(|_| anyhow::anyhow!("memory store lock poisoned"))?;
    entries.insert(key.to_string(), value);
    Ok(())
  }
}

/// JSON object on disk, loaded once and rewritten on every `set`.
pub struct FileStore {
  path: PathBuf,
  entries: StdMutex<BTreeMap<String, String>>,
}

impl FileStore {
  pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
    let path = path.into();
    let entries = match std::fs::read_to_string(&path) {
      Ok(content) => match serde_json::from_str(&content) {
        Ok(entries) => entries,
        Err(e) => {
          // Whole file unreadable: every lookup misses until the next write.
          warn!(path = %path.display(), err = %e, "cache: store is not a JSON object, starting empty");
          BTreeMap::new()
        }
      },
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
      Err(e) => return Err(e).with_context(|| format!("Failed to read cache file {}", path.display())),
    };
    debug!(path = %path.display(), "cache: store opened");
    Ok(Self { path, entries: StdMutex::new(entries) })
  }

  /// `chapters.json` under the platform data dir.
  pub fn open_default() -> Result<Self> {
    let proj_dirs =
      ProjectDirs::from("", "", "ytchapters").context("Could not determine a home directory for the cache")?;
    Self::open(proj_dirs.data_dir().join("chapters.json"))
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  fn persist(&self, entries: &BTreeMap<String, String>) -> Result<()> {
    if let Some(parent) = self.path.parent() {
      std::fs::create_dir_all(parent).context("Failed to create cache directory")?;
    }
    let content = serde_json::to_string_pretty(entries).context("Failed to encode cache")?;
    // Write to a temp file, then rename (atomic)
    let tmp_path = self.path.with_extension("json.part");
    std::fs::write(&tmp_path, content).context("Failed to write cache file")?;
    std::fs::rename(&tmp_path, &self.path).context("Failed to finalize cache file")?;
    Ok(())
  }
}

impl Store for FileStore {
  fn get(&self, key: &str) -> Result<Option<String>> {
    let entries = self.entries.lock().map_err(|_| anyhow::anyhow!("cache lock poisoned"))?;
    Ok(entries.get(key).cloned())
  }

  fn set(&self, key: &str, value: String) -> Result<()> {
    let mut entries = self.entries.lock().map_err(|_| anyhow::anyhow!("cache lock poisoned"))?;
    entries.insert(key.to_string(), value);
    self.persist(&entries)
  }
}

/// Typed view over a [`Store`]: identity in, extraction result out.
pub struct ResultCache<S> {
  store: S,
}

impl<S: Store> ResultCache<S> {
  pub fn new(store: S) -> Self {
    Self { store }
  }

  /// Cached result, if any. Unreadable entries count as a miss.
  pub fn get(&self, identity: &PageIdentity) -> Option<ExtractionResult> {
    let raw = match self.store.get(identity.as_str()) {
      Ok(Some(raw)) => raw,
      Ok(None) => return None,
      Err(e) => {
        warn!(page = %identity, err = %e, "cache: read failed");
        return None;
      }
    };
    match serde_json::from_str(&raw) {
      Ok(result) => Some(result),
      Err(e) => {
        warn!(page = %identity, err = %e, "cache: ignoring unreadable entry");
        None
      }
    }
  }

  pub fn put(&self, identity: &PageIdentity, result: &ExtractionResult) -> Result<()> {
    let raw = serde_json::to_string(result).context("Failed to encode extraction result")?;
    self.store.set(identity.as_str(), raw)
  }
}
