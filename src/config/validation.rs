//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Credentials are configured as a pair or not at all
//! - Validate value ranges (timeouts > 0, poll interval within the timeout)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: KeymasterConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use crate::config::schema::{KeymasterConfig, StoreBackend};

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("auth.username and auth.password must be set together")]
    PartialCredentials,

    #[error("auth.realm must not be empty")]
    EmptyRealm,

    #[error("challenge.command must name a program")]
    EmptyChallengeCommand,

    #[error("store.path is required for the file backend")]
    MissingStorePath,

    #[error("store.service must not be empty for the keychain backend")]
    EmptyKeychainService,

    #[error("input.timeout_ms must be greater than zero")]
    ZeroInputTimeout,

    #[error("input.poll_interval_ms must be greater than zero and at most input.timeout_ms")]
    InvalidPollInterval,

    #[error("input.max_header_bytes must be greater than zero")]
    ZeroHeaderLimit,
}

/// Check a loaded configuration for semantic errors.
pub fn validate_config(config: &KeymasterConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let has_user = config.auth.username.as_deref().is_some_and(|u| !u.is_empty());
    let has_pass = config.auth.password.as_deref().is_some_and(|p| !p.is_empty());
    if has_user != has_pass {
        errors.push(ValidationError::PartialCredentials);
    }
    if config.auth.realm.trim().is_empty() {
        errors.push(ValidationError::EmptyRealm);
    }

    if config.challenge.command.first().map_or(true, |p| p.trim().is_empty()) {
        errors.push(ValidationError::EmptyChallengeCommand);
    }

    match config.store.backend {
        StoreBackend::File if config.store.path.is_none() => {
            errors.push(ValidationError::MissingStorePath);
        }
        StoreBackend::Keychain if config.store.service.is_empty() => {
            errors.push(ValidationError::EmptyKeychainService);
        }
        _ => {}
    }

    if config.input.timeout_ms == 0 {
        errors.push(ValidationError::ZeroInputTimeout);
    }
    if config.input.poll_interval_ms == 0
        || (config.input.timeout_ms > 0 && config.input.poll_interval_ms > config.input.timeout_ms)
    {
        errors.push(ValidationError::InvalidPollInterval);
    }
    if config.input.max_header_bytes == 0 {
        errors.push(ValidationError::ZeroHeaderLimit);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file_backed() -> KeymasterConfig {
        let mut config = KeymasterConfig::default();
        config.store.backend = StoreBackend::File;
        config.store.path = Some("/tmp/secrets.toml".into());
        config
    }

    #[test]
    fn accepts_open_access_config() {
        assert_eq!(validate_config(&file_backed()), Ok(()));
    }

    #[test]
    fn rejects_half_configured_credentials() {
        let mut config = file_backed();
        config.auth.username = Some("admin".into());
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors, vec![ValidationError::PartialCredentials]);
    }

    #[test]
    fn reports_every_problem() {
        let mut config = file_backed();
        config.store.path = None;
        config.input.timeout_ms = 0;
        config.challenge.command.clear();

        let errors = validate_config(&config).unwrap_err();
        assert!(errors.contains(&ValidationError::MissingStorePath));
        assert!(errors.contains(&ValidationError::ZeroInputTimeout));
        assert!(errors.contains(&ValidationError::EmptyChallengeCommand));
    }

    #[test]
    fn poll_interval_must_fit_in_timeout() {
        let mut config = file_backed();
        config.input.timeout_ms = 100;
        config.input.poll_interval_ms = 500;
        assert_eq!(
            validate_config(&config).unwrap_err(),
            vec![ValidationError::InvalidPollInterval]
        );
    }
}
