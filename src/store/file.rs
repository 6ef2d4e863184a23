//! File-backed store.
//!
//! The file is a flat TOML table of `name = "value"` pairs. It is re-read on
//! every lookup so edits take effect without a restart.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use super::{SecretStore, StoreError};

#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    /// Open a store, failing early if the file cannot be read.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        fs::metadata(&path).map_err(|source| StoreError::Unreadable {
            path: path.clone(),
            source,
        })?;
        Ok(Self { path })
    }

    fn load(&self) -> Option<HashMap<String, String>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Secrets file unreadable");
                return None;
            }
        };
        match toml::from_str(&content) {
            Ok(table) => Some(table),
            Err(e) => {
                // toml's message quotes source lines, which may hold secrets.
                tracing::warn!(
                    path = %self.path.display(),
                    span = ?e.span(),
                    "Secrets file is not a table of strings"
                );
                None
            }
        }
    }
}

impl SecretStore for FileStore {
    fn get_secret(&self, name: &str) -> Option<String> {
        self.load()?.remove(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    static FILE_COUNTER: AtomicU32 = AtomicU32::new(0);

    fn temp_file(content: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "keymasterd-store-{}-{}.toml",
            std::process::id(),
            FILE_COUNTER.fetch_add(1, Ordering::Relaxed)
        ));
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn reads_named_secret() {
        let path = temp_file("github_token = \"ghp_abc\"\n\"my key\" = \"v2\"\n");
        let store = FileStore::open(&path).unwrap();

        assert_eq!(store.get_secret("github_token").as_deref(), Some("ghp_abc"));
        assert_eq!(store.get_secret("my key").as_deref(), Some("v2"));
        assert_eq!(store.get_secret("absent"), None);
        fs::remove_file(path).unwrap();
    }

    #[test]
    fn picks_up_edits_without_reopening() {
        let path = temp_file("a = \"1\"\n");
        let store = FileStore::open(&path).unwrap();
        assert_eq!(store.get_secret("b"), None);

        fs::write(&path, "a = \"1\"\nb = \"2\"\n").unwrap();
        assert_eq!(store.get_secret("b").as_deref(), Some("2"));
        fs::remove_file(path).unwrap();
    }

    #[test]
    fn malformed_file_reads_as_missing() {
        let path = temp_file("not toml at all = = =");
        let store = FileStore::open(&path).unwrap();
        assert_eq!(store.get_secret("not"), None);
        fs::remove_file(path).unwrap();
    }

    #[test]
    fn missing_file_fails_to_open() {
        let err = FileStore::open("/nonexistent/keymasterd/secrets.toml").unwrap_err();
        assert!(matches!(err, StoreError::Unreadable { .. }));
    }
}
