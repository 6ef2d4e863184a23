//! HTTP Basic credential check (RFC 7617).
//!
//! Every failure collapses into a single rejection so callers cannot tell
//! a missing header from a wrong password.

use base64::{engine::general_purpose::STANDARD, Engine};

use crate::config::AuthConfig;
use crate::http::Request;

const SCHEME: &str = "basic ";

/// Network credential stage.
#[derive(Clone)]
pub struct BasicAuth {
    /// `user:pass` as the client is expected to send it, `None` when disabled.
    expected: Option<String>,
}

impl BasicAuth {
    pub fn from_config(config: &AuthConfig) -> Self {
        Self {
            expected: config
                .credentials()
                .map(|(user, pass)| format!("{user}:{pass}")),
        }
    }

    /// A stage that lets every request through.
    pub fn disabled() -> Self {
        Self { expected: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.expected.is_some()
    }

    /// Returns true when the request may proceed.
    pub fn check(&self, request: &Request) -> bool {
        let Some(expected) = &self.expected else {
            return true;
        };
        match request.header("authorization").and_then(decode_credentials) {
            Some(presented) => presented.as_bytes() == expected.as_bytes(),
            None => false,
        }
    }
}

impl std::fmt::Debug for BasicAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BasicAuth")
            .field("enabled", &self.is_enabled())
            .finish()
    }
}

/// Decode the `user:pass` pair carried by a Basic `Authorization` value.
fn decode_credentials(header: &str) -> Option<String> {
    let scheme = header.get(..SCHEME.len())?;
    if !scheme.eq_ignore_ascii_case(SCHEME) {
        return None;
    }
    let token = header[SCHEME.len()..].trim();
    let decoded = STANDARD.decode(token).ok()?;
    let credentials = String::from_utf8(decoded).ok()?;
    credentials.contains(':').then_some(credentials)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn auth() -> BasicAuth {
        BasicAuth::from_config(&AuthConfig {
            username: Some("admin".into()),
            password: Some("secret123".into()),
            ..AuthConfig::default()
        })
    }

    fn request_with(authorization: Option<&str>) -> Request {
        let mut raw = String::from("GET /key/x HTTP/1.1\r\n");
        if let Some(value) = authorization {
            raw.push_str(&format!("Authorization: {value}\r\n"));
        }
        raw.push_str("\r\n");
        Request::parse(raw.as_bytes()).unwrap()
    }

    fn basic(credentials: &str) -> String {
        format!("Basic {}", STANDARD.encode(credentials))
    }

    #[test]
    fn accepts_matching_credentials() {
        assert!(auth().check(&request_with(Some(&basic("admin:secret123")))));
    }

    #[test]
    fn scheme_is_case_insensitive() {
        let value = format!("bAsIc {}", STANDARD.encode("admin:secret123"));
        assert!(auth().check(&request_with(Some(&value))));
    }

    #[test]
    fn rejects_wrong_or_missing_credentials() {
        let auth = auth();
        assert!(!auth.check(&request_with(None)));
        assert!(!auth.check(&request_with(Some(&basic("admin:wrong")))));
        assert!(!auth.check(&request_with(Some(&basic("Admin:secret123")))));
        assert!(!auth.check(&request_with(Some("Bearer abc"))));
        assert!(!auth.check(&request_with(Some("Basic !!!not-base64"))));
        assert!(!auth.check(&request_with(Some(&basic("adminsecret123")))));
        assert!(!auth.check(&request_with(Some("Basic"))));
    }

    #[test]
    fn password_may_contain_colons() {
        let auth = BasicAuth::from_config(&AuthConfig {
            username: Some("admin".into()),
            password: Some("a:b:c".into()),
            ..AuthConfig::default()
        });
        assert!(auth.check(&request_with(Some(&basic("admin:a:b:c")))));
    }

    #[test]
    fn disabled_stage_passes_everything() {
        let auth = BasicAuth::from_config(&AuthConfig::default());
        assert!(!auth.is_enabled());
        assert!(auth.check(&request_with(None)));
        assert!(BasicAuth::disabled().check(&request_with(Some("garbage"))));
    }

    #[test]
    fn debug_hides_credentials() {
        assert!(!format!("{:?}", auth()).contains("secret123"));
    }
}
