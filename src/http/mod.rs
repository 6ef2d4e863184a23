//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection (server.rs) | stdin (oneshot.rs)
//!     → request.rs (assemble head, parse request line + headers)
//!     → pipeline (route, credential check, user-presence gate)
//!     → response.rs (encode status, headers, body)
//!     → TCP connection | stdout
//! ```

pub mod oneshot;
pub mod request;
pub mod response;
pub mod server;

pub use oneshot::OneShot;
pub use request::{read_head, HeadLimits, InputError, ParseError, Request};
pub use response::{Outcome, Response};
pub use server::HttpServer;
