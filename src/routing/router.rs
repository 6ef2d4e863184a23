//! Route lookup.
//!
//! # Responsibilities
//! - Reject non-GET methods
//! - Serve `/health` ahead of any credential check
//! - Apply the network credential to everything else
//! - Extract and percent-decode the key name from `/key/<name>`
//!
//! # Design Decisions
//! - Immutable after construction (shared across connections without locks)
//! - Unknown paths are 404 and sit behind the credential check, so route
//!   existence is not visible to unauthenticated callers
//! - Explicit `Route` result rather than calling handlers directly

use percent_encoding::percent_decode_str;

use crate::http::{Outcome, Request};
use crate::security::BasicAuth;

pub const HEALTH_PATH: &str = "/health";
pub const KEY_PREFIX: &str = "/key/";

/// Where a request goes next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// Liveness check; answered without the gate or the store.
    Health,
    /// Secret request for a decoded key name; must pass the auth gate.
    Key(String),
    /// Answered immediately.
    Reject(Outcome),
}

#[derive(Debug, Clone)]
pub struct Router {
    basic_auth: BasicAuth,
}

impl Router {
    pub fn new(basic_auth: BasicAuth) -> Self {
        Self { basic_auth }
    }

    pub fn route(&self, request: &Request) -> Route {
        if request.method() != "GET" {
            return Route::Reject(Outcome::MethodNotAllowed);
        }

        let path = strip_query(request.path());
        if path == HEALTH_PATH {
            return Route::Health;
        }

        if !self.basic_auth.check(request) {
            return Route::Reject(Outcome::Unauthorized);
        }

        match path.strip_prefix(KEY_PREFIX) {
            Some("") => Route::Reject(Outcome::BadRequest("missing key name".to_string())),
            Some(encoded) => match percent_decode_str(encoded).decode_utf8() {
                Ok(name) => Route::Key(name.into_owned()),
                Err(_) => Route::Reject(Outcome::BadRequest(
                    "key name is not valid UTF-8".to_string(),
                )),
            },
            None => Route::Reject(Outcome::NotFound),
        }
    }
}

fn strip_query(target: &str) -> &str {
    target.split_once('?').map_or(target, |(path, _)| path)
}
