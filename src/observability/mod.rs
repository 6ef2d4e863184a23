//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → tracing events with structured fields
//!       (connection_id, peer_addr, key, status)
//!     → logging.rs (EnvFilter + fmt layer on stderr)
//! ```

pub mod logging;
