//! Request head assembly and parsing.
//!
//! # Responsibilities
//! - Accumulate bytes from a stream until the blank line ending the head
//! - Split the request line into method, path and protocol
//! - Collect headers into a lowercase-keyed map
//!
//! # Design Decisions
//! - Only the request line is fatal; malformed header lines are skipped
//! - The path is kept raw; the router decodes the segment it extracts
//! - No body is read: the protocol only carries bodiless GETs

use std::collections::HashMap;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::time::Instant;

use crate::http::response::Outcome;

/// Blank line terminating an HTTP/1.1 request head.
pub const HEAD_TERMINATOR: &[u8] = b"\r\n\r\n";

const READ_CHUNK: usize = 1024;

/// A parsed, immutable request head.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    method: String,
    path: String,
    version: String,
    headers: HashMap<String, String>,
}

/// The request line could not be split into method, path and protocol.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("malformed request line")]
pub struct ParseError;

impl Request {
    /// Parse a request head.
    pub fn parse(raw: &[u8]) -> Result<Self, ParseError> {
        let text = String::from_utf8_lossy(raw);
        let mut lines = text.split("\r\n");

        let request_line = lines.next().ok_or(ParseError)?;
        let mut tokens = request_line.split_whitespace();
        let (method, path, version) = match (tokens.next(), tokens.next(), tokens.next(), tokens.next()) {
            (Some(method), Some(path), Some(version), None) => (method, path, version),
            _ => return Err(ParseError),
        };

        let mut headers = HashMap::new();
        for line in lines {
            if line.is_empty() {
                break;
            }
            let Some((name, value)) = line.split_once(':') else {
                continue;
            };
            let name = name.trim();
            if name.is_empty() {
                continue;
            }
            headers.insert(name.to_ascii_lowercase(), value.trim().to_string());
        }

        Ok(Self {
            method: method.to_string(),
            path: path.to_string(),
            version: version.to_string(),
            headers,
        })
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    /// The raw, still percent-encoded request target.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Look up a header by name, case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }
}

/// Why a request head could not be assembled from a stream.
#[derive(Debug, thiserror::Error)]
pub enum InputError {
    #[error("stream ended before the request head was complete")]
    Incomplete,

    #[error("request head not received within {0:?}")]
    Timeout(Duration),

    #[error("request head exceeds {0} bytes")]
    TooLarge(usize),

    #[error("read failed: {0}")]
    Io(#[from] std::io::Error),
}

impl InputError {
    /// The response owed to the client when assembly fails.
    pub fn to_outcome(&self) -> Outcome {
        Outcome::BadRequest(self.to_string())
    }
}

/// Limits applied while assembling a request head.
#[derive(Debug, Clone, Copy)]
pub struct HeadLimits {
    /// Largest accepted head, terminator included.
    pub max_bytes: usize,
    /// Overall ceiling. `None` waits as long as the peer keeps the stream open.
    pub timeout: Option<Duration>,
    /// Longest single wait for more bytes before the ceiling is rechecked.
    pub poll_interval: Duration,
}

/// Read from `reader` until the head terminator arrives.
///
/// Bytes after the terminator are discarded. With a ceiling set, each wait
/// for data is bounded by the poll interval and the time remaining, so a
/// silent or trickling peer cannot hold the caller past the ceiling.
pub async fn read_head<R>(reader: &mut R, limits: &HeadLimits) -> Result<Vec<u8>, InputError>
where
    R: AsyncRead + Unpin,
{
    let started = Instant::now();
    let mut buf = Vec::with_capacity(READ_CHUNK);
    let mut chunk = [0u8; READ_CHUNK];

    loop {
        let n = match limits.timeout {
            Some(ceiling) => {
                let remaining = ceiling
                    .checked_sub(started.elapsed())
                    .filter(|left| !left.is_zero())
                    .ok_or(InputError::Timeout(ceiling))?;
                let wait = remaining.min(limits.poll_interval);
                match tokio::time::timeout(wait, reader.read(&mut chunk)).await {
                    Ok(read) => read?,
                    Err(_) => continue,
                }
            }
            None => reader.read(&mut chunk).await?,
        };

        if n == 0 {
            return Err(InputError::Incomplete);
        }

        // The terminator may straddle the previous chunk boundary.
        let search_from = buf.len().saturating_sub(HEAD_TERMINATOR.len() - 1);
        buf.extend_from_slice(&chunk[..n]);

        if let Some(pos) = find_terminator(&buf[search_from..]) {
            let end = search_from + pos + HEAD_TERMINATOR.len();
            if end > limits.max_bytes {
                return Err(InputError::TooLarge(limits.max_bytes));
            }
            buf.truncate(end);
            return Ok(buf);
        }

        if buf.len() >= limits.max_bytes {
            return Err(InputError::TooLarge(limits.max_bytes));
        }
    }
}

fn find_terminator(haystack: &[u8]) -> Option<usize> {
    haystack
        .windows(HEAD_TERMINATOR.len())
        .position(|window| window == HEAD_TERMINATOR)
}
