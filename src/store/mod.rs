//! Secret store subsystem.
//!
//! # Data Flow
//! ```text
//! AuthGate (after a successful challenge)
//!     → SecretStore::get_secret(name)
//!     → keychain.rs (macOS generic passwords)
//!       | file.rs (TOML table, re-read per lookup)
//!       | memory.rs (tests, embedding)
//!     → Some(value) | None
//! ```
//!
//! # Design Decisions
//! - Retrieval only: no enumeration, no write path
//! - Backend failures read as "not found" and are logged without the value
//! - No caching: every lookup goes to the backend

pub mod file;
pub mod keychain;
pub mod memory;

use std::path::PathBuf;
use std::sync::Arc;

use crate::config::{StoreBackend, StoreConfig};

pub use file::FileStore;
pub use keychain::KeychainStore;
pub use memory::MemoryStore;

/// Read access to protected secrets, keyed by name.
pub trait SecretStore: Send + Sync {
    /// Returns the value stored under `name`, if any.
    fn get_secret(&self, name: &str) -> Option<String>;
}

/// Error type for opening a store backend.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("secrets file {path} is not readable: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("store.path is required for the file backend")]
    MissingPath,

    #[error("the keychain backend is not available on this platform")]
    Unsupported,
}

/// Open the backend selected in the configuration.
pub fn open(config: &StoreConfig) -> Result<Arc<dyn SecretStore>, StoreError> {
    match config.backend {
        StoreBackend::File => {
            let path = config.path.clone().ok_or(StoreError::MissingPath)?;
            Ok(Arc::new(FileStore::open(path)?))
        }
        StoreBackend::Keychain => Ok(Arc::new(KeychainStore::new(&config.service)?)),
    }
}
