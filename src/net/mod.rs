//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! bind host:port
//!     → listener.rs (bind once; failure is fatal before any accept)
//!     → listener.rs (accept loop source)
//!     → connection.rs (id, in-flight tracking for shutdown drain)
//!     → Hand off to the HTTP daemon driver
//!
//! Connection States:
//!     Accepted → Handling → Closed
//! ```
//!
//! # Design Decisions
//! - Accept is unbounded; a stalled challenge occupies one connection only
//! - Each connection tracked so shutdown can wait for in-flight requests
//! - No TLS: termination belongs to a reverse proxy in front

pub mod connection;
pub mod listener;

pub use connection::{ConnectionGuard, ConnectionId, ConnectionTracker};
pub use listener::{Listener, ListenerError};
