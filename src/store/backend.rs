//! Key-value persistence backends
//!
//! A backend stores JSON values under string keys. Each `set` replaces the
//! whole value for its key: readers see either the previous value or the new
//! one, never a mix. `update` is the read-modify-write primitive; no other
//! writer can slip in between its read and its write.

use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use serde_json::{Map, Value};
use tracing::warn;

use crate::error::StoreError;

pub trait KeyValueBackend: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<Value>, StoreError>;

    /// Replace the value under `key`, whatever is stored now.
    fn set(&self, key: &str, value: Value) -> Result<(), StoreError>;

    /// Atomically read, transform and write back the value under `key`.
    ///
    /// `apply` gets the current value and returns the replacement, or `None`
    /// to leave it untouched. When reading or `apply` fails nothing is written.
    fn update(
        &self,
        key: &str,
        apply: &mut dyn FnMut(Option<Value>) -> Result<Option<Value>, StoreError>,
    ) -> Result<(), StoreError>;
}

/// In-process backend; contents are lost on drop.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    entries: RwLock<HashMap<String, Value>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned() -> StoreError {
    StoreError::Io(io::Error::new(io::ErrorKind::Other, "backend lock poisoned"))
}

impl KeyValueBackend for MemoryBackend {
    fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let entries = self.entries.read().map_err(|_| poisoned())?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        let mut entries = self.entries.write().map_err(|_| poisoned())?;
        entries.insert(key.to_string(), value);
        Ok(())
    }

    fn update(
        &self,
        key: &str,
        apply: &mut dyn FnMut(Option<Value>) -> Result<Option<Value>, StoreError>,
    ) -> Result<(), StoreError> {
        let mut entries = self.entries.write().map_err(|_| poisoned())?;
        if let Some(value) = apply(entries.get(key).cloned())? {
            entries.insert(key.to_string(), value);
        }
        Ok(())
    }
}

/// All keys live in one JSON object file.
///
/// Writers hold an advisory lock on `<file>.lock` for the whole
/// read-modify-write, so any number of `FileBackend`s (threads, FFI calls,
/// CLI processes) can share a path. Each write goes to its own temp file
/// which is then renamed over the original; readers take no lock.
#[derive(Debug, Clone)]
pub struct FileBackend {
    path: PathBuf,
}

impl FileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock_file(&self) -> Result<fd_lock::RwLock<fs::File>, StoreError> {
        let mut name = self.path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
        name.push(".lock");
        let lock_path = self.path.with_file_name(name);
        ensure_parent(&lock_path)?;

        let file = fs::OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(&lock_path)?;
        Ok(fd_lock::RwLock::new(file))
    }

    fn read_all(&self) -> Result<Map<String, Value>, StoreError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => return Err(e.into()),
        };
        if text.trim().is_empty() {
            return Ok(Map::new());
        }
        match serde_json::from_str::<Value>(&text)? {
            Value::Object(map) => Ok(map),
            other => Err(StoreError::Corrupt {
                key: self.path.display().to_string(),
                details: format!("expected a JSON object, found {}", json_kind(&other)),
            }),
        }
    }

    fn write_all(&self, all: Map<String, Value>) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec(&Value::Object(all))?;
        write_atomic(&self.path, &bytes)
    }
}

impl KeyValueBackend for FileBackend {
    fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.read_all()?.remove(key))
    }

    fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        let mut lock = self.lock_file()?;
        let _guard = lock.write()?;

        let mut all = match self.read_all() {
            Ok(all) => all,
            // unreadable content is replaced, not merged into
            Err(e @ (StoreError::Serde(_) | StoreError::Corrupt { .. })) => {
                warn!(path = %self.path.display(), error = %e, "replacing unreadable store file");
                Map::new()
            }
            Err(e) => return Err(e),
        };
        all.insert(key.to_string(), value);
        self.write_all(all)
    }

    fn update(
        &self,
        key: &str,
        apply: &mut dyn FnMut(Option<Value>) -> Result<Option<Value>, StoreError>,
    ) -> Result<(), StoreError> {
        let mut lock = self.lock_file()?;
        let _guard = lock.write()?;

        let mut all = self.read_all()?;
        if let Some(value) = apply(all.remove(key))? {
            all.insert(key.to_string(), value);
            self.write_all(all)?;
        }
        Ok(())
    }
}

fn ensure_parent(path: &Path) -> io::Result<&Path> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;
    Ok(dir)
}

/// Write `bytes` to `path` via a fresh temp file in the same directory and a
/// rename, so an interrupted write leaves the previous file untouched.
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    let dir = ensure_parent(path)?;
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| StoreError::Io(e.error))?;
    Ok(())
}

pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
