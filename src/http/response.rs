//! Response construction and serialization.
//!
//! # Responsibilities
//! - Map every pipeline outcome to a status, headers and body
//! - Serialize the response onto the wire
//!
//! # Design Decisions
//! - Total over `Outcome`: every variant encodes, nothing can fail here
//! - `Content-Length` is computed from the body, never supplied by callers
//! - `Connection: close` on every response; one request per connection
//! - 404 bodies are identical for unknown routes and missing secrets

use std::fmt;

/// Result of running one request through the pipeline.
#[derive(Clone, PartialEq, Eq)]
pub enum Outcome {
    /// `/health` liveness check.
    Healthy,
    /// The user approved the challenge and the store holds the key.
    SecretFound(String),
    /// The user approved the challenge but the store has no such key.
    SecretMissing,
    /// No route matched the path.
    NotFound,
    /// Missing or wrong network credential.
    Unauthorized,
    /// The user-presence challenge failed.
    Forbidden(String),
    BadRequest(String),
    MethodNotAllowed,
}

impl Outcome {
    pub fn status(&self) -> u16 {
        match self {
            Outcome::Healthy | Outcome::SecretFound(_) => 200,
            Outcome::BadRequest(_) => 400,
            Outcome::Unauthorized => 401,
            Outcome::Forbidden(_) => 403,
            Outcome::SecretMissing | Outcome::NotFound => 404,
            Outcome::MethodNotAllowed => 405,
        }
    }
}

// Hand-written so the secret never reaches a log line through `{:?}`.
impl fmt::Debug for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Healthy => f.write_str("Healthy"),
            Outcome::SecretFound(_) => f.write_str("SecretFound(<redacted>)"),
            Outcome::SecretMissing => f.write_str("SecretMissing"),
            Outcome::NotFound => f.write_str("NotFound"),
            Outcome::Unauthorized => f.write_str("Unauthorized"),
            Outcome::Forbidden(reason) => f.debug_tuple("Forbidden").field(reason).finish(),
            Outcome::BadRequest(reason) => f.debug_tuple("BadRequest").field(reason).finish(),
            Outcome::MethodNotAllowed => f.write_str("MethodNotAllowed"),
        }
    }
}

/// Fixed reason phrase for a status code.
pub fn reason_phrase(status: u16) -> &'static str {
    match status {
        200 => "OK",
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        405 => "Method Not Allowed",
        _ => "Unknown",
    }
}

pub const TEXT_PLAIN: &str = "text/plain";

/// A response ready to be written to the client.
#[derive(Clone, PartialEq, Eq)]
pub struct Response {
    status: u16,
    content_type: &'static str,
    extra_headers: Vec<(String, String)>,
    body: Vec<u8>,
}

impl Response {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            content_type: TEXT_PLAIN,
            extra_headers: Vec::new(),
            body: body.into(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_headers.push((name.into(), value.into()));
        self
    }

    /// Encode an outcome. `realm` is advertised on 401 responses.
    pub fn from_outcome(outcome: Outcome, realm: &str) -> Self {
        let status = outcome.status();
        match outcome {
            Outcome::Healthy => Self::new(status, "OK"),
            Outcome::SecretFound(value) => Self::new(status, value),
            Outcome::SecretMissing | Outcome::NotFound => Self::new(status, "Not Found"),
            Outcome::Unauthorized => Self::new(status, "Unauthorized")
                .with_header("WWW-Authenticate", format!("Basic realm=\"{realm}\"")),
            Outcome::Forbidden(reason) => Self::new(status, format!("Forbidden: {reason}")),
            Outcome::BadRequest(reason) => Self::new(status, format!("Bad Request: {reason}")),
            Outcome::MethodNotAllowed => {
                Self::new(status, "Method Not Allowed").with_header("Allow", "GET")
            }
        }
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.extra_headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Serialize status line, headers and body.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut head = format!(
            "HTTP/1.1 {} {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n",
            self.status,
            reason_phrase(self.status),
            self.content_type,
            self.body.len(),
        );
        for (name, value) in &self.extra_headers {
            head.push_str(name);
            head.push_str(": ");
            head.push_str(value);
            head.push_str("\r\n");
        }
        head.push_str("\r\n");

        let mut out = head.into_bytes();
        out.extend_from_slice(&self.body);
        out
    }
}

impl fmt::Debug for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Response")
            .field("status", &self.status)
            .field("extra_headers", &self.extra_headers)
            .field("body_len", &self.body.len())
            .finish()
    }
}
