//! The request pipeline shared by both drivers.
//!
//! ```text
//! raw head bytes
//!     → Request::parse     (400 on a bad request line)
//!     → Router::route      (405 / health / 401 / 400 / 404 / key)
//!     → AuthGate::unlock   (key routes only; blocks on the challenge)
//!     → Response::from_outcome
//! ```
//!
//! Drivers differ only in where the bytes come from and go to.

use std::sync::Arc;

use crate::config::KeymasterConfig;
use crate::gate::{AuthGate, Authenticator};
use crate::http::{Outcome, Request, Response};
use crate::routing::{Route, Router};
use crate::security::BasicAuth;
use crate::store::SecretStore;

#[derive(Debug)]
pub struct Pipeline {
    router: Router,
    gate: AuthGate,
    realm: String,
}

impl Pipeline {
    pub fn new(
        config: &KeymasterConfig,
        authenticator: Arc<dyn Authenticator>,
        store: Arc<dyn SecretStore>,
    ) -> Self {
        Self {
            router: Router::new(BasicAuth::from_config(&config.auth)),
            gate: AuthGate::new(config.challenge.clone(), authenticator, store),
            realm: config.auth.realm.clone(),
        }
    }

    /// Run one request head through the pipeline.
    ///
    /// May block for as long as the user-presence challenge takes.
    pub fn handle(&self, raw: &[u8]) -> Response {
        let outcome = match Request::parse(raw) {
            Ok(request) => self.dispatch(&request),
            Err(e) => {
                tracing::debug!(error = %e, "Rejecting unparseable request");
                Outcome::BadRequest(e.to_string())
            }
        };
        self.respond(outcome)
    }

    /// Route a parsed request to its outcome.
    pub fn dispatch(&self, request: &Request) -> Outcome {
        let outcome = match self.router.route(request) {
            Route::Health => Outcome::Healthy,
            Route::Key(name) => self.gate.unlock(&name),
            Route::Reject(outcome) => outcome,
        };
        tracing::debug!(
            method = request.method(),
            path = request.path(),
            version = request.version(),
            status = outcome.status(),
            "Request handled"
        );
        outcome
    }

    /// Encode an outcome, including ones produced outside the pipeline
    /// such as input assembly failures.
    pub fn respond(&self, outcome: Outcome) -> Response {
        Response::from_outcome(outcome, &self.realm)
    }
}
