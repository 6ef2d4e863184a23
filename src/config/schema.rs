//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the daemon.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Placeholder substituted with the decoded key name in the reason template.
pub const KEY_PLACEHOLDER: &str = "{key}";

/// Placeholder substituted with the prompt reason in challenge command arguments.
pub const REASON_PLACEHOLDER: &str = "{reason}";

/// Root configuration for keymasterd.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct KeymasterConfig {
    /// Listener configuration (bind host and port).
    pub listener: ListenerConfig,

    /// Network credential (Basic-Auth) settings.
    pub auth: AuthConfig,

    /// User-presence challenge settings.
    pub challenge: ChallengeConfig,

    /// Secret store backend.
    pub store: StoreConfig,

    /// Request head assembly limits.
    pub input: InputConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind host (e.g., "127.0.0.1").
    pub host: String,

    /// Bind port.
    pub port: u16,

    /// How long in-flight connections may keep running after a shutdown signal.
    pub shutdown_grace_secs: u64,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 7878,
            shutdown_grace_secs: 10,
        }
    }
}

impl ListenerConfig {
    /// The `host:port` string handed to the socket layer.
    pub fn bind_address(&self) -> String {
        // Bare IPv6 literals need brackets to form a socket address.
        if self.host.contains(':') && !self.host.starts_with('[') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }
}

/// Basic-Auth configuration.
///
/// The network credential stage is active only when both `username` and
/// `password` are set and non-empty.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct AuthConfig {
    pub username: Option<String>,
    pub password: Option<String>,

    /// Realm advertised in the `WWW-Authenticate` challenge.
    pub realm: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            username: None,
            password: None,
            realm: "Keymasterd".to_string(),
        }
    }
}

impl AuthConfig {
    /// Returns the configured credential pair when Basic-Auth is enabled.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (self.username.as_deref(), self.password.as_deref()) {
            (Some(user), Some(pass)) if !user.is_empty() && !pass.is_empty() => Some((user, pass)),
            _ => None,
        }
    }
}

/// User-presence challenge configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ChallengeConfig {
    /// Prompt reason shown to the user. `{key}` is replaced by the key name.
    pub reason_template: String,

    /// Helper program and arguments that perform the challenge.
    /// `{reason}` in any argument is replaced by the prompt reason.
    pub command: Vec<String>,
}

impl Default for ChallengeConfig {
    fn default() -> Self {
        Self {
            reason_template: format!("Keymasterd wants to read the secret \"{KEY_PLACEHOLDER}\""),
            command: default_challenge_command(),
        }
    }
}

impl ChallengeConfig {
    /// Render the prompt reason for a decoded key name.
    pub fn reason_for(&self, key: &str) -> String {
        self.reason_template.replace(KEY_PLACEHOLDER, key)
    }
}

#[cfg(target_os = "macos")]
fn default_challenge_command() -> Vec<String> {
    vec![
        "osascript".to_string(),
        "-e".to_string(),
        format!("do shell script \"true\" with prompt \"{REASON_PLACEHOLDER}\" with administrator privileges"),
    ]
}

#[cfg(not(target_os = "macos"))]
fn default_challenge_command() -> Vec<String> {
    vec!["pkexec".to_string(), "/bin/true".to_string()]
}

/// Secret store backend selection.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Platform keychain (macOS only).
    Keychain,
    /// TOML file of `name = "value"` pairs.
    File,
}

impl Default for StoreBackend {
    fn default() -> Self {
        if cfg!(target_os = "macos") {
            StoreBackend::Keychain
        } else {
            StoreBackend::File
        }
    }
}

impl std::str::FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "keychain" => Ok(StoreBackend::Keychain),
            "file" => Ok(StoreBackend::File),
            other => Err(format!("unknown store backend '{other}'")),
        }
    }
}

/// Secret store configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: StoreBackend,

    /// Keychain service name the secrets are filed under.
    pub service: String,

    /// Secrets file for the file backend.
    pub path: Option<PathBuf>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            service: "keymasterd".to_string(),
            path: None,
        }
    }
}

/// Limits for assembling a request head from a byte stream.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct InputConfig {
    /// Overall ceiling for receiving a complete head (one-shot mode).
    pub timeout_ms: u64,

    /// Wait between read attempts.
    pub poll_interval_ms: u64,

    /// Largest accepted request head.
    pub max_header_bytes: usize,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 5_000,
            poll_interval_ms: 50,
            max_header_bytes: 16 * 1024,
        }
    }
}

impl InputConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}
