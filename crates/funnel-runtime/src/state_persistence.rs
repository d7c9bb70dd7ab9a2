#![forbid(unsafe_code)]

//! Durable key-value store that carries answers between pages.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      KeyValueStore                            │
//! │   - In-memory cache of string entries                         │
//! │   - Last write wins per key                                   │
//! │   - Delegates to StorageBackend on load/flush/clear           │
//! └──────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌──────────────────────────────────────────────────────────────┐
//! │                     StorageBackend                            │
//! │   - MemoryStorage: in-memory (testing, ephemeral)             │
//! │   - FileStorage: JSON file (requires file-storage)            │
//! │   - LocalStorage: browser localStorage (wasm32 only)          │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Design Invariants
//!
//! 1. **Graceful degradation**: Storage failures never panic; operations return `Result`.
//! 2. **Atomic writes**: File storage uses write-rename so a crash never leaves half a file.
//! 3. **Overwrite, never append**: `set` replaces the previous value for a key.
//! 4. **Per-key flush**: `flush` sends only the keys this store changed, so
//!    stores sharing one backend never revert each other's keys.
//! 5. **No expiry**: entries live until removed or cleared.
//!
//! # Failure Modes
//!
//! | Failure | Cause | Behavior |
//! |---------|-------|----------|
//! | `StorageError::Io` | File I/O failure | Returns error, cache unaffected |
//! | `StorageError::Serialization` | JSON encode/decode | Load fails, cache unaffected |
//! | `StorageError::Corruption` | Poisoned lock | Returns error |
//! | `StorageError::Unavailable` | Backend cannot be reached | Returns error |

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::{Arc, RwLock};

// ─────────────────────────────────────────────────────────────────────────────
// Error Types
// ─────────────────────────────────────────────────────────────────────────────

/// Errors that can occur during store operations.
#[derive(Debug)]
pub enum StorageError {
    /// I/O error during file operations.
    Io(std::io::Error),
    /// Serialization or deserialization error.
    Serialization(String),
    /// Stored data or internal state is unusable.
    Corruption(String),
    /// Backend is not available (quota, private browsing, missing window).
    Unavailable(String),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::Io(e) => write!(f, "I/O error: {e}"),
            StorageError::Serialization(msg) => write!(f, "serialization error: {msg}"),
            StorageError::Corruption(msg) => write!(f, "storage corruption: {msg}"),
            StorageError::Unavailable(msg) => write!(f, "storage unavailable: {msg}"),
        }
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StorageError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for StorageError {
    fn from(e: std::io::Error) -> Self {
        StorageError::Io(e)
    }
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Unflushed per-key changes: `Some(value)` overwrites, `None` removes.
pub type Changes = BTreeMap<String, Option<String>>;

fn merge(entries: &mut HashMap<String, String>, changes: &Changes) {
    for (key, change) in changes {
        match change {
            Some(value) => {
                entries.insert(key.clone(), value.clone());
            }
            None => {
                entries.remove(key);
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Storage Backend Trait
// ─────────────────────────────────────────────────────────────────────────────

/// Trait for pluggable store backends.
///
/// Implementations must be thread-safe (`Send + Sync`) so a store can be
/// shared between a runner and its timer threads.
pub trait StorageBackend: Send + Sync {
    /// Human-readable name for logging.
    fn name(&self) -> &str;

    /// Load every stored entry. Returns an empty map on first run.
    fn load_all(&self) -> StorageResult<HashMap<String, String>>;

    /// Apply `changes` as one update. Keys not named in `changes` keep
    /// their stored values.
    fn apply(&self, changes: &Changes) -> StorageResult<()>;

    /// Remove every stored entry.
    fn clear(&self) -> StorageResult<()>;

    /// Check if the backend is available and functional.
    fn is_available(&self) -> bool {
        true
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Memory Storage (always available)
// ─────────────────────────────────────────────────────────────────────────────

/// In-memory backend for tests and single-process hosts.
#[derive(Default)]
pub struct MemoryStorage {
    data: RwLock<HashMap<String, String>>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create memory storage pre-populated with entries.
    #[must_use]
    pub fn with_entries<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            data: RwLock::new(
                entries
                    .into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
        }
    }
}

impl StorageBackend for MemoryStorage {
    fn name(&self) -> &str {
        "MemoryStorage"
    }

    fn load_all(&self) -> StorageResult<HashMap<String, String>> {
        let guard = self
            .data
            .read()
            .map_err(|_| StorageError::Corruption("lock poisoned".into()))?;
        Ok(guard.clone())
    }

    fn apply(&self, changes: &Changes) -> StorageResult<()> {
        let mut guard = self
            .data
            .write()
            .map_err(|_| StorageError::Corruption("lock poisoned".into()))?;
        merge(&mut guard, changes);
        Ok(())
    }

    fn clear(&self) -> StorageResult<()> {
        self.data
            .write()
            .map_err(|_| StorageError::Corruption("lock poisoned".into()))?
            .clear();
        Ok(())
    }
}

impl fmt::Debug for MemoryStorage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let count = self.data.read().map(|g| g.len()).unwrap_or(0);
        f.debug_struct("MemoryStorage")
            .field("entries", &count)
            .finish()
    }
}

/// Memory storage shared by several stores, standing in for one origin's
/// storage across page loads.
impl StorageBackend for Arc<MemoryStorage> {
    fn name(&self) -> &str {
        "MemoryStorage"
    }

    fn load_all(&self) -> StorageResult<HashMap<String, String>> {
        (**self).load_all()
    }

    fn apply(&self, changes: &Changes) -> StorageResult<()> {
        (**self).apply(changes)
    }

    fn clear(&self) -> StorageResult<()> {
        (**self).clear()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// File Storage (requires file-storage feature)
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(feature = "file-storage")]
mod file_storage {
    use super::*;
    use serde::{Deserialize, Serialize};
    use std::fs::{self, File};
    use std::io::{BufReader, BufWriter, Write};
    use std::path::{Path, PathBuf};

    /// On-disk format.
    #[derive(Serialize, Deserialize)]
    struct StoreFile {
        /// Format version for future migrations.
        format_version: u32,
        entries: HashMap<String, String>,
    }

    impl StoreFile {
        const FORMAT_VERSION: u32 = 1;
    }

    /// JSON file backend.
    ///
    /// ```json
    /// {
    ///   "format_version": 1,
    ///   "entries": { "debtAmount": "15000", "firstName": "Ana" }
    /// }
    /// ```
    ///
    /// Each flush re-reads the file, merges the changed keys, and writes the
    /// result to `{path}.tmp`, which is synced and renamed over `{path}`.
    pub struct FileStorage {
        path: PathBuf,
    }

    impl FileStorage {
        /// The file does not need to exist; it is created on first save.
        #[must_use]
        pub fn new(path: impl AsRef<Path>) -> Self {
            Self {
                path: path.as_ref().to_path_buf(),
            }
        }

        pub fn path(&self) -> &Path {
            &self.path
        }

        fn temp_path(&self) -> PathBuf {
            let mut tmp = self.path.clone();
            tmp.set_extension("json.tmp");
            tmp
        }

        fn write_entries(&self, entries: HashMap<String, String>) -> StorageResult<()> {
            if let Some(parent) = self.path.parent()
                && !parent.as_os_str().is_empty()
            {
                fs::create_dir_all(parent)?;
            }

            let count = entries.len();
            let file = StoreFile {
                format_version: StoreFile::FORMAT_VERSION,
                entries,
            };

            let tmp_path = self.temp_path();
            {
                let mut writer = BufWriter::new(File::create(&tmp_path)?);
                serde_json::to_writer_pretty(&mut writer, &file).map_err(|e| {
                    StorageError::Serialization(format!("failed to serialize store: {e}"))
                })?;
                writer.flush()?;
                writer.get_ref().sync_all()?;
            }
            fs::rename(&tmp_path, &self.path)?;

            tracing::debug!(path = %self.path.display(), entries = count, "saved store");
            Ok(())
        }
    }

    impl StorageBackend for FileStorage {
        fn name(&self) -> &str {
            "FileStorage"
        }

        fn load_all(&self) -> StorageResult<HashMap<String, String>> {
            if !self.path.exists() {
                return Ok(HashMap::new());
            }

            let reader = BufReader::new(File::open(&self.path)?);
            let file: StoreFile = serde_json::from_reader(reader).map_err(|e| {
                StorageError::Serialization(format!("failed to parse store file: {e}"))
            })?;

            if file.format_version != StoreFile::FORMAT_VERSION {
                tracing::warn!(
                    stored = file.format_version,
                    expected = StoreFile::FORMAT_VERSION,
                    "store file format version mismatch, ignoring stored entries"
                );
                return Ok(HashMap::new());
            }
            Ok(file.entries)
        }

        fn apply(&self, changes: &Changes) -> StorageResult<()> {
            let mut entries = self.load_all()?;
            merge(&mut entries, changes);
            self.write_entries(entries)
        }

        fn clear(&self) -> StorageResult<()> {
            if self.path.exists() {
                fs::remove_file(&self.path)?;
            }
            Ok(())
        }
    }

    impl fmt::Debug for FileStorage {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.debug_struct("FileStorage")
                .field("path", &self.path)
                .finish()
        }
    }
}

#[cfg(feature = "file-storage")]
pub use file_storage::FileStorage;

// ─────────────────────────────────────────────────────────────────────────────
// Local Storage (wasm32 only)
// ─────────────────────────────────────────────────────────────────────────────

/// Keys a shared-origin backend has loaded or written. Clearing removes
/// exactly these, so keys other code keeps in the origin survive.
#[cfg(any(target_arch = "wasm32", test))]
#[derive(Debug, Default)]
struct OwnedKeys(std::collections::BTreeSet<String>);

#[cfg(any(target_arch = "wasm32", test))]
impl OwnedKeys {
    fn note(&mut self, key: &str) {
        if !self.0.contains(key) {
            self.0.insert(key.to_string());
        }
    }

    fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    fn forget_all(&mut self) {
        self.0.clear();
    }
}

#[cfg(target_arch = "wasm32")]
mod local_storage {
    use super::*;

    /// Browser `localStorage` backend, scoped to the page origin.
    ///
    /// Changes go through `setItem`/`removeItem` one key at a time, so tabs
    /// of the same origin only overwrite the keys they changed. `clear`
    /// removes the keys this backend loaded or wrote; other keys of the
    /// origin are left alone.
    #[derive(Debug, Default)]
    pub struct LocalStorage {
        owned: RwLock<OwnedKeys>,
    }

    impl LocalStorage {
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        fn storage() -> StorageResult<web_sys::Storage> {
            web_sys::window()
                .ok_or_else(|| StorageError::Unavailable("no window".into()))?
                .local_storage()
                .map_err(|e| StorageError::Unavailable(format!("{e:?}")))?
                .ok_or_else(|| StorageError::Unavailable("localStorage disabled".into()))
        }
    }

    impl StorageBackend for LocalStorage {
        fn name(&self) -> &str {
            "LocalStorage"
        }

        fn load_all(&self) -> StorageResult<HashMap<String, String>> {
            let storage = Self::storage()?;
            let len = storage
                .length()
                .map_err(|e| StorageError::Unavailable(format!("{e:?}")))?;
            let mut entries = HashMap::new();
            for i in 0..len {
                let Ok(Some(key)) = storage.key(i) else {
                    continue;
                };
                if let Ok(Some(value)) = storage.get_item(&key) {
                    entries.insert(key, value);
                }
            }
            if let Ok(mut owned) = self.owned.write() {
                for key in entries.keys() {
                    owned.note(key);
                }
            }
            Ok(entries)
        }

        fn apply(&self, changes: &Changes) -> StorageResult<()> {
            let storage = Self::storage()?;
            let mut owned = self
                .owned
                .write()
                .map_err(|_| StorageError::Corruption("lock poisoned".into()))?;
            for (key, change) in changes {
                let result = match change {
                    Some(value) => storage.set_item(key, value),
                    None => storage.remove_item(key),
                };
                result.map_err(|e| StorageError::Unavailable(format!("{e:?}")))?;
                owned.note(key);
            }
            Ok(())
        }

        fn clear(&self) -> StorageResult<()> {
            let storage = Self::storage()?;
            let mut owned = self
                .owned
                .write()
                .map_err(|_| StorageError::Corruption("lock poisoned".into()))?;
            for key in owned.iter() {
                storage
                    .remove_item(key)
                    .map_err(|e| StorageError::Unavailable(format!("{e:?}")))?;
            }
            owned.forget_all();
            Ok(())
        }

        fn is_available(&self) -> bool {
            Self::storage().is_ok()
        }
    }
}

#[cfg(target_arch = "wasm32")]
pub use local_storage::LocalStorage;

// ─────────────────────────────────────────────────────────────────────────────
// Key-Value Store
// ─────────────────────────────────────────────────────────────────────────────

/// Shared string-keyed store.
///
/// Reads and writes hit the in-memory cache; [`flush`](Self::flush) pushes
/// the keys changed since the last load or flush to the backend and
/// [`load`](Self::load) refreshes the cache. The store
/// is `Send + Sync` and is normally shared through an [`Arc`].
///
/// ```ignore
/// let store = KeyValueStore::in_memory().shared();
/// store.set("debtAmount", "15000");
/// store.flush()?;
/// assert_eq!(store.get("debtAmount").as_deref(), Some("15000"));
/// ```
pub struct KeyValueStore {
    backend: Box<dyn StorageBackend>,
    cache: RwLock<HashMap<String, String>>,
    pending: RwLock<Changes>,
}

impl KeyValueStore {
    /// Does not load automatically; call [`load`](Self::load) first.
    #[must_use]
    pub fn new(backend: Box<dyn StorageBackend>) -> Self {
        Self {
            backend,
            cache: RwLock::new(HashMap::new()),
            pending: RwLock::new(Changes::new()),
        }
    }

    /// Ephemeral store for tests.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(Box::new(MemoryStorage::new()))
    }

    /// Store backed by a JSON file at `path`.
    #[cfg(feature = "file-storage")]
    #[must_use]
    pub fn with_file(path: impl AsRef<std::path::Path>) -> Self {
        Self::new(Box::new(FileStorage::new(path)))
    }

    /// Replace the cache with the backend's entries, dropping unflushed
    /// changes.
    pub fn load(&self) -> StorageResult<usize> {
        let entries = self.backend.load_all()?;
        let count = entries.len();

        *self
            .cache
            .write()
            .map_err(|_| StorageError::Corruption("cache lock poisoned".into()))? = entries;
        self.pending
            .write()
            .map_err(|_| StorageError::Corruption("pending lock poisoned".into()))?
            .clear();

        tracing::debug!(backend = %self.backend.name(), count, "loaded store");
        Ok(count)
    }

    /// Send the changed keys to the backend.
    ///
    /// Returns `Ok(true)` if data was written. On error the changes stay
    /// pending for the next flush.
    pub fn flush(&self) -> StorageResult<bool> {
        let mut pending = self
            .pending
            .write()
            .map_err(|_| StorageError::Corruption("pending lock poisoned".into()))?;
        if pending.is_empty() {
            return Ok(false);
        }

        self.backend.apply(&pending)?;
        tracing::trace!(backend = %self.backend.name(), keys = pending.len(), "flushed store");
        pending.clear();
        Ok(true)
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<String> {
        self.cache.read().ok()?.get(key).cloned()
    }

    /// Value for `key`, or `default` when unset.
    #[must_use]
    pub fn get_or(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or_else(|| default.to_string())
    }

    /// Overwrite `key`. Marks the key for the next flush.
    pub fn set(&self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        let Ok(mut cache) = self.cache.write() else {
            return;
        };
        tracing::trace!(key = %key, "store set");
        if let Ok(mut pending) = self.pending.write() {
            pending.insert(key.clone(), Some(value.clone()));
        }
        cache.insert(key, value);
    }

    /// Remove `key`, returning its previous value. Only a key that was
    /// present is marked for removal.
    pub fn remove(&self, key: &str) -> Option<String> {
        let mut cache = self.cache.write().ok()?;
        let result = cache.remove(key);
        if result.is_some()
            && let Ok(mut pending) = self.pending.write()
        {
            pending.insert(key.to_string(), None);
        }
        result
    }

    /// Clear the cache and the backend, dropping unflushed changes.
    pub fn clear(&self) -> StorageResult<()> {
        self.backend.clear()?;
        if let Ok(mut cache) = self.cache.write() {
            cache.clear();
        }
        if let Ok(mut pending) = self.pending.write() {
            pending.clear();
        }
        Ok(())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cache.read().map(|c| c.len()).unwrap_or(0)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Check if there are unflushed changes.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.pending.read().map(|p| !p.is_empty()).unwrap_or(false)
    }

    #[must_use]
    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    #[must_use]
    pub fn is_available(&self) -> bool {
        self.backend.is_available()
    }

    /// All keys, sorted.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .cache
            .read()
            .map(|c| c.keys().cloned().collect())
            .unwrap_or_default();
        keys.sort();
        keys
    }

    /// Wrap in Arc for shared ownership.
    #[must_use]
    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }
}

impl fmt::Debug for KeyValueStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyValueStore")
            .field("backend", &self.backend.name())
            .field("entries", &self.len())
            .field("dirty", &self.is_dirty())
            .finish()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
