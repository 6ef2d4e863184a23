//! Configuration loading from disk, the environment, and command-line overrides.
//!
//! Precedence, lowest first: built-in defaults, TOML file, environment,
//! command-line arguments.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::schema::KeymasterConfig;
use crate::config::validation::{validate_config, ValidationError};

pub const ENV_CONFIG: &str = "KEYMASTERD_CONFIG";
pub const ENV_HOST: &str = "KEYMASTERD_HOST";
pub const ENV_PORT: &str = "KEYMASTERD_PORT";
pub const ENV_USERNAME: &str = "KEYMASTERD_USERNAME";
pub const ENV_PASSWORD: &str = "KEYMASTERD_PASSWORD";
pub const ENV_REALM: &str = "KEYMASTERD_REALM";
pub const ENV_REASON: &str = "KEYMASTERD_REASON";
pub const ENV_STORE: &str = "KEYMASTERD_STORE";
pub const ENV_SECRETS_FILE: &str = "KEYMASTERD_SECRETS_FILE";
pub const ENV_KEYCHAIN_SERVICE: &str = "KEYMASTERD_KEYCHAIN_SERVICE";

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid value for {var}: {message}")]
    Env { var: &'static str, message: String },

    #[error("validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Values supplied on the command line. `None` leaves the lower layers alone.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub reason: Option<String>,
}

impl ConfigOverrides {
    fn apply(&self, config: &mut KeymasterConfig) {
        if let Some(host) = &self.host {
            config.listener.host = host.clone();
        }
        if let Some(port) = self.port {
            config.listener.port = port;
        }
        if let Some(username) = &self.username {
            config.auth.username = Some(username.clone());
        }
        if let Some(password) = &self.password {
            config.auth.password = Some(password.clone());
        }
        if let Some(reason) = &self.reason {
            config.challenge.reason_template = reason.clone();
        }
    }
}

/// Parse a TOML configuration file without validating it.
pub fn read_config_file(path: &Path) -> Result<KeymasterConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Overlay `KEYMASTERD_*` variables obtained through `lookup`.
///
/// Empty values are treated as unset.
pub fn apply_env<F>(config: &mut KeymasterConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let var = |name: &str| lookup(name).filter(|v| !v.is_empty());

    if let Some(host) = var(ENV_HOST) {
        config.listener.host = host;
    }
    if let Some(port) = var(ENV_PORT) {
        config.listener.port = port.trim().parse().map_err(|e| ConfigError::Env {
            var: ENV_PORT,
            message: format!("{e}"),
        })?;
    }
    if let Some(username) = var(ENV_USERNAME) {
        config.auth.username = Some(username);
    }
    if let Some(password) = var(ENV_PASSWORD) {
        config.auth.password = Some(password);
    }
    if let Some(realm) = var(ENV_REALM) {
        config.auth.realm = realm;
    }
    if let Some(reason) = var(ENV_REASON) {
        config.challenge.reason_template = reason;
    }
    if let Some(backend) = var(ENV_STORE) {
        config.store.backend = backend
            .parse()
            .map_err(|message| ConfigError::Env { var: ENV_STORE, message })?;
    }
    if let Some(path) = var(ENV_SECRETS_FILE) {
        config.store.path = Some(PathBuf::from(path));
    }
    if let Some(service) = var(ENV_KEYCHAIN_SERVICE) {
        config.store.service = service;
    }
    Ok(())
}

/// Build the daemon configuration: file, then environment, then arguments.
pub fn load_config(
    path: Option<&Path>,
    overrides: &ConfigOverrides,
) -> Result<KeymasterConfig, ConfigError> {
    let mut config = match path {
        Some(path) => read_config_file(path)?,
        None => KeymasterConfig::default(),
    };
    apply_env(&mut config, |name| std::env::var(name).ok())?;
    overrides.apply(&mut config);

    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Build the configuration from the environment alone.
///
/// Used by the one-shot handler, which has no argument surface.
/// `KEYMASTERD_CONFIG` may still point at a file to start from.
pub fn load_from_env() -> Result<KeymasterConfig, ConfigError> {
    let path = std::env::var(ENV_CONFIG).ok().filter(|p| !p.is_empty());
    load_config(path.as_deref().map(Path::new), &ConfigOverrides::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::StoreBackend;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn env_overrides_defaults() {
        let mut config = KeymasterConfig::default();
        apply_env(
            &mut config,
            env(&[
                (ENV_HOST, "0.0.0.0"),
                (ENV_PORT, "9100"),
                (ENV_USERNAME, "admin"),
                (ENV_PASSWORD, "secret123"),
                (ENV_STORE, "file"),
                (ENV_SECRETS_FILE, "/etc/keymasterd/secrets.toml"),
            ]),
        )
        .unwrap();

        assert_eq!(config.listener.bind_address(), "0.0.0.0:9100");
        assert_eq!(config.auth.credentials(), Some(("admin", "secret123")));
        assert_eq!(config.store.backend, StoreBackend::File);
        assert_eq!(
            config.store.path.as_deref(),
            Some(Path::new("/etc/keymasterd/secrets.toml"))
        );
    }

    #[test]
    fn empty_env_values_are_ignored() {
        let mut config = KeymasterConfig::default();
        apply_env(&mut config, env(&[(ENV_USERNAME, ""), (ENV_REASON, "")])).unwrap();
        assert_eq!(config, KeymasterConfig::default());
    }

    #[test]
    fn bad_port_is_reported() {
        let mut config = KeymasterConfig::default();
        let err = apply_env(&mut config, env(&[(ENV_PORT, "http")])).unwrap_err();
        assert!(matches!(err, ConfigError::Env { var: ENV_PORT, .. }));
    }

    #[test]
    fn overrides_win_over_env() {
        let mut config = KeymasterConfig::default();
        apply_env(&mut config, env(&[(ENV_PORT, "9100")])).unwrap();
        ConfigOverrides {
            port: Some(9200),
            reason: Some("unlock {key}".into()),
            ..ConfigOverrides::default()
        }
        .apply(&mut config);

        assert_eq!(config.listener.port, 9200);
        assert_eq!(config.challenge.reason_for("db"), "unlock db");
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = read_config_file(Path::new("/nonexistent/keymasterd.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
