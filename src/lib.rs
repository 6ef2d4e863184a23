//! keymasterd: hands out a single named secret over local HTTP after a
//! network credential check and an interactive user-presence challenge.

// Core subsystems
pub mod config;
pub mod http;
pub mod net;
pub mod pipeline;
pub mod routing;

// Access control
pub mod gate;
pub mod security;
pub mod store;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;

pub use config::KeymasterConfig;
pub use http::{HttpServer, OneShot};
pub use lifecycle::Shutdown;
pub use pipeline::Pipeline;
