//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Parsed request (any path except /health):
//!     → basic_auth.rs (network credential, when configured)
//!     → 401 + WWW-Authenticate on any failure
//!     → Pass to routing
//! ```
//!
//! # Design Decisions
//! - Fail closed: absent, malformed and wrong credentials all reject
//! - A single rejection shape so the response is no credential oracle
//! - Credentials never appear in Debug output or logs

pub mod basic_auth;

pub use basic_auth::BasicAuth;
