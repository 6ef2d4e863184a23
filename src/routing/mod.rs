//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Parsed Request (method, path, headers)
//!     → router.rs (method check, /health, credential check, /key/<name>)
//!     → Return: Route::Health | Route::Key(name) | Route::Reject(outcome)
//! ```
//!
//! # Design Decisions
//! - Two fixed routes, no configuration
//! - No regex in hot path (prefix matching only)
//! - Deterministic: same input always matches same route

pub mod router;

pub use router::{Route, Router};
