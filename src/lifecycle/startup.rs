//! Startup orchestration.
//!
//! # Responsibilities
//! - Open the configured secret store
//! - Build the step-up authenticator for the execution model in use
//! - Assemble the shared pipeline
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Subsystems initialize in order, not concurrently

use std::sync::Arc;

use crate::config::KeymasterConfig;
use crate::gate::{Authenticator, CommandAuthenticator, PromptDispatcher};
use crate::pipeline::Pipeline;
use crate::store::{self, StoreError};

/// Where user-presence challenges execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptMode {
    /// On a worker thread per challenge; callers block on a per-request reply.
    Dispatched,
    /// On the calling thread (single-request processes).
    Inline,
}

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("secret store: {0}")]
    Store(#[from] StoreError),

    #[error("challenge.command is empty")]
    NoChallengeCommand,

    #[error("failed to start prompt thread: {0}")]
    PromptThread(#[source] std::io::Error),
}

/// Build the pipeline and its collaborators from a validated configuration.
pub fn build_pipeline(
    config: &KeymasterConfig,
    mode: PromptMode,
) -> Result<Pipeline, StartupError> {
    let store = store::open(&config.store)?;
    tracing::info!(backend = ?config.store.backend, "Secret store opened");

    let helper = CommandAuthenticator::from_argv(&config.challenge.command)
        .ok_or(StartupError::NoChallengeCommand)?;
    let authenticator: Arc<dyn Authenticator> = match mode {
        PromptMode::Inline => Arc::new(helper),
        PromptMode::Dispatched => {
            Arc::new(PromptDispatcher::spawn(Arc::new(helper)).map_err(StartupError::PromptThread)?)
        }
    };

    if config.auth.credentials().is_none() {
        tracing::warn!("Basic-Auth disabled; any local client may request secrets");
    }

    Ok(Pipeline::new(config, authenticator, store))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreBackend;

    #[test]
    fn missing_secrets_file_is_fatal() {
        let mut config = KeymasterConfig::default();
        config.store.backend = StoreBackend::File;
        config.store.path = Some("/nonexistent/keymasterd/secrets.toml".into());

        let err = build_pipeline(&config, PromptMode::Inline).unwrap_err();
        assert!(matches!(err, StartupError::Store(StoreError::Unreadable { .. })));
    }

    #[test]
    fn empty_challenge_command_is_fatal() {
        let path = std::env::temp_dir().join(format!("keymasterd-startup-{}.toml", std::process::id()));
        std::fs::write(&path, "").unwrap();

        let mut config = KeymasterConfig::default();
        config.store.backend = StoreBackend::File;
        config.store.path = Some(path.clone());
        config.challenge.command.clear();

        let err = build_pipeline(&config, PromptMode::Dispatched).unwrap_err();
        assert!(matches!(err, StartupError::NoChallengeCommand));
        std::fs::remove_file(path).unwrap();
    }
}
