//! Filesystem storage backend (native only)
//!
//! One file per key inside a directory. Writes go to a temp file first and
//! are renamed into place so a crash never leaves a half-written document.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::Storage;
use crate::error::StateResult;

#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Open (creating if needed) a storage directory
    pub fn open(dir: impl AsRef<Path>) -> StateResult<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        log::debug!("File storage at {}", dir.display());
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn item_path(&self, key: &str) -> PathBuf {
        let name: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.dir.join(format!("{name}.json"))
    }
}

impl Storage for FileStorage {
    fn get_item(&self, key: &str) -> StateResult<Option<String>> {
        match fs::read_to_string(self.item_path(key)) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set_item(&self, key: &str, value: &str) -> StateResult<()> {
        let path = self.item_path(key);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn remove_item(&self, key: &str) -> StateResult<()> {
        match fs::remove_file(self.item_path(key)) {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "keepsake-{}-{}",
            name,
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn test_set_get_remove() {
        let dir = scratch_dir("set-get");
        let storage = FileStorage::open(&dir).unwrap();

        assert_eq!(storage.get_item("appState").unwrap(), None);
        storage.set_item("appState", "{\"a\":1}").unwrap();
        assert_eq!(
            storage.get_item("appState").unwrap().as_deref(),
            Some("{\"a\":1}")
        );

        storage.remove_item("appState").unwrap();
        assert_eq!(storage.get_item("appState").unwrap(), None);
        // removing twice is fine
        storage.remove_item("appState").unwrap();

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_keys_are_sanitized() {
        let dir = scratch_dir("sanitize");
        let storage = FileStorage::open(&dir).unwrap();
        storage.set_item("../escape", "x").unwrap();
        assert!(dir.join("___escape.json").exists());
        let _ = fs::remove_dir_all(&dir);
    }
}
