//! User-presence gate.
//!
//! # Data Flow
//! ```text
//! Route::Key(name)
//!     → AuthGate::unlock (render reason from template)
//!     → Authenticator::authenticate (fresh challenge, blocks)
//!         daemon:   PromptDispatcher → worker thread → CommandAuthenticator
//!         one-shot: CommandAuthenticator directly
//!     → SecretStore::get_secret (only after success)
//!     → Outcome::SecretFound | SecretMissing | Forbidden
//! ```
//!
//! # Design Decisions
//! - Exactly one challenge per request; no result is cached anywhere
//! - The store is never consulted before the challenge succeeds
//! - Forbidden carries the challenge failure, never a secret

pub mod authenticator;
pub mod dispatcher;

use std::sync::Arc;

pub use authenticator::{sanitize_reason, Authenticator, ChallengeError, CommandAuthenticator};
pub use dispatcher::PromptDispatcher;

use crate::config::ChallengeConfig;
use crate::http::Outcome;
use crate::store::SecretStore;

/// Challenge-then-lookup for a single key request.
#[derive(Clone)]
pub struct AuthGate {
    challenge: ChallengeConfig,
    authenticator: Arc<dyn Authenticator>,
    store: Arc<dyn SecretStore>,
}

impl AuthGate {
    pub fn new(
        challenge: ChallengeConfig,
        authenticator: Arc<dyn Authenticator>,
        store: Arc<dyn SecretStore>,
    ) -> Self {
        Self {
            challenge,
            authenticator,
            store,
        }
    }

    /// Challenge the user for `key` and, on success, read it from the store.
    ///
    /// Blocks until the authenticator resolves.
    pub fn unlock(&self, key: &str) -> Outcome {
        let reason = self.challenge.reason_for(key);
        tracing::info!(key, "Requesting user presence");

        if let Err(e) = self.authenticator.authenticate(&reason) {
            tracing::warn!(key, error = %e, "User presence not confirmed");
            return Outcome::Forbidden(e.to_string());
        }

        match self.store.get_secret(key) {
            Some(value) => {
                tracing::info!(key, "Secret released");
                Outcome::SecretFound(value)
            }
            None => {
                tracing::info!(key, "Secret not found");
                Outcome::SecretMissing
            }
        }
    }
}

impl std::fmt::Debug for AuthGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthGate")
            .field("reason_template", &self.challenge.reason_template)
            .finish_non_exhaustive()
    }
}
