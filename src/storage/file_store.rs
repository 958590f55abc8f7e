use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use crate::error::StorageError;
use crate::storage::KeyValueStore;

/// One `<key>.json` file per key under a base directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    base: PathBuf,
}

impl FileStore {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.base.join(format!("{}.json", key))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key);
        match fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::Io { path, source }),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        fs::create_dir_all(&self.base).map_err(|source| StorageError::Io {
            path: self.base.clone(),
            source,
        })?;
        let path = self.path_for(key);
        // Write-then-rename so readers never see a half-written file.
        let tmp = self.base.join(format!(".{}.json.tmp", key));
        fs::write(&tmp, value).map_err(|source| StorageError::Io {
            path: tmp.clone(),
            source,
        })?;
        fs::rename(&tmp, &path).map_err(|source| StorageError::Io { path, source })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    fn temp_dir() -> PathBuf {
        env::temp_dir().join(format!("calendar_reminder_fs_{}", uuid::Uuid::new_v4()))
    }

    #[test]
    fn missing_key_reads_as_none() {
        let store = FileStore::new(temp_dir());
        assert!(store.get("calendar-events").unwrap().is_none());
    }

    #[test]
    fn set_creates_directory_and_overwrites() {
        let dir = temp_dir();
        let mut store = FileStore::new(&dir);
        store.set("acknowledged-events", "[1]").unwrap();
        store.set("acknowledged-events", "[1,2]").unwrap();

        assert_eq!(store.get("acknowledged-events").unwrap().as_deref(), Some("[1,2]"));
        assert!(dir.join("acknowledged-events.json").exists());
        assert!(!dir.join(".acknowledged-events.json.tmp").exists());
        let _ = fs::remove_dir_all(dir);
    }
}
