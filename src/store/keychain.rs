//! Platform keychain store.
//!
//! On macOS secrets are generic passwords filed under the configured
//! service name, with the key name as the account. Other platforms have no
//! keychain backend and refuse to open one.

use super::{SecretStore, StoreError};

#[derive(Debug, Clone)]
pub struct KeychainStore {
    service: String,
}

impl KeychainStore {
    pub fn new(service: &str) -> Result<Self, StoreError> {
        if !platform::SUPPORTED {
            return Err(StoreError::Unsupported);
        }
        Ok(Self {
            service: service.to_string(),
        })
    }
}

impl SecretStore for KeychainStore {
    fn get_secret(&self, name: &str) -> Option<String> {
        platform::get_secret(&self.service, name)
    }
}

// ============================================================================
// macOS implementation using security-framework
// ============================================================================

#[cfg(target_os = "macos")]
mod platform {
    use security_framework::passwords::get_generic_password;

    pub const SUPPORTED: bool = true;

    /// `errSecItemNotFound`.
    const ITEM_NOT_FOUND: i32 = -25300;

    pub fn get_secret(service: &str, account: &str) -> Option<String> {
        match get_generic_password(service, account) {
            Ok(bytes) => match String::from_utf8(bytes) {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::warn!(service, key = account, "Keychain item is not valid UTF-8");
                    None
                }
            },
            Err(e) if e.code() == ITEM_NOT_FOUND => None,
            Err(e) => {
                tracing::warn!(service, key = account, error = %e, "Keychain lookup failed");
                None
            }
        }
    }
}

#[cfg(not(target_os = "macos"))]
mod platform {
    pub const SUPPORTED: bool = false;

    pub fn get_secret(_service: &str, _account: &str) -> Option<String> {
        None
    }
}
