//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! optional TOML file (KEYMASTERD_CONFIG / --config)
//!     → loader.rs (parse & deserialize)
//!     → loader.rs (KEYMASTERD_* environment overlay)
//!     → loader.rs (command-line overrides, daemon only)
//!     → validation.rs (semantic checks)
//!     → KeymasterConfig (validated, immutable)
//!     → shared via Arc with every connection
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, load_from_env, ConfigError, ConfigOverrides};
pub use schema::{
    AuthConfig, ChallengeConfig, InputConfig, KeymasterConfig, ListenerConfig, StoreBackend,
    StoreConfig,
};
