//! File-backed key/value persistence.
//!
//! A single JSON file holds every flag the [`washboard_core::SubscriptionStore`]
//! keeps. Writes go through a temp file plus rename so a power cut leaves
//! either the old or the new file, never a torn one. A corrupt or missing
//! file degrades to an empty map; persistence failures are logged and the
//! in-memory state stays authoritative for the session.

use std::{
    collections::HashMap,
    fs, io,
    path::{Path, PathBuf},
};

use washboard_core::KvStore;

/// Durable [`KvStore`] over one JSON file.
#[derive(Debug)]
pub struct FileKv {
    path: PathBuf,
    values: HashMap<String, String>,
}

impl FileKv {
    /// Open the store at `path`, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error when the parent directory cannot be created. An
    /// unreadable or corrupt file is not an error; it degrades to empty.
    pub fn open(path: impl Into<PathBuf>) -> io::Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let values = load_values(&path);
        Ok(Self { path, values })
    }

    fn persist(&self) {
        let encoded = match serde_json::to_vec_pretty(&self.values) {
            Ok(encoded) => encoded,
            Err(err) => {
                tracing::warn!(%err, "failed to encode persisted flags");
                return;
            }
        };
        let tmp = self.path.with_extension("tmp");
        let result = fs::write(&tmp, &encoded).and_then(|()| fs::rename(&tmp, &self.path));
        if let Err(err) = result {
            tracing::warn!(%err, path = %self.path.display(), "failed to persist flags");
        }
    }
}

fn load_values(path: &Path) -> HashMap<String, String> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return HashMap::new(),
        Err(err) => {
            tracing::warn!(%err, path = %path.display(), "failed to read persisted flags");
            return HashMap::new();
        }
    };
    match serde_json::from_str(&raw) {
        Ok(values) => values,
        Err(err) => {
            tracing::warn!(%err, path = %path.display(), "corrupt flag file, starting empty");
            HashMap::new()
        }
    }
}

impl KvStore for FileKv {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.values.insert(key.to_owned(), value.to_owned());
        self.persist();
    }

    fn remove(&mut self, key: &str) {
        if self.values.remove(key).is_some() {
            self.persist();
        }
    }
}
