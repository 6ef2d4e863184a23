//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{mpsc, Arc, Mutex};
use std::time::Duration;

use base64::{engine::general_purpose::STANDARD, Engine};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::task::JoinHandle;

use keymasterd::config::KeymasterConfig;
use keymasterd::gate::{Authenticator, ChallengeError, PromptDispatcher};
use keymasterd::http::HttpServer;
use keymasterd::lifecycle::Shutdown;
use keymasterd::net::Listener;
use keymasterd::store::{MemoryStore, SecretStore};
use keymasterd::Pipeline;

pub const USER: &str = "admin";
pub const PASS: &str = "secret123";

/// Authenticator stub with a fixed answer that counts its challenges.
pub struct CountingAuthenticator {
    allow: bool,
    calls: AtomicUsize,
}

impl CountingAuthenticator {
    pub fn allowing() -> Arc<Self> {
        Arc::new(Self {
            allow: true,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn denying() -> Arc<Self> {
        Arc::new(Self {
            allow: false,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Authenticator for CountingAuthenticator {
    fn authenticate(&self, _reason: &str) -> Result<(), ChallengeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.allow {
            Ok(())
        } else {
            Err(ChallengeError::Declined)
        }
    }
}

/// Authenticator that holds its first challenge open until the test
/// releases it. Later challenges succeed at once.
pub struct HeldAuthenticator {
    entered: AtomicUsize,
    release: Mutex<mpsc::Receiver<bool>>,
}

impl HeldAuthenticator {
    pub fn new() -> (Arc<Self>, mpsc::Sender<bool>) {
        let (tx, rx) = mpsc::channel();
        let auth = Arc::new(Self {
            entered: AtomicUsize::new(0),
            release: Mutex::new(rx),
        });
        (auth, tx)
    }

    pub fn entered(&self) -> usize {
        self.entered.load(Ordering::SeqCst)
    }
}

impl Authenticator for HeldAuthenticator {
    fn authenticate(&self, _reason: &str) -> Result<(), ChallengeError> {
        if self.entered.fetch_add(1, Ordering::SeqCst) > 0 {
            return Ok(());
        }
        match self.release.lock().unwrap().recv_timeout(Duration::from_secs(10)) {
            Ok(true) => Ok(()),
            Ok(false) => Err(ChallengeError::Declined),
            Err(_) => Err(ChallengeError::Failed("test never released the challenge".into())),
        }
    }
}

pub fn store() -> Arc<MemoryStore> {
    Arc::new(MemoryStore::new().with_secret("github_token", "ghp_abc"))
}

pub fn guarded_config() -> KeymasterConfig {
    let mut config = KeymasterConfig::default();
    config.listener.port = 0;
    config.listener.shutdown_grace_secs = 1;
    config.auth.username = Some(USER.into());
    config.auth.password = Some(PASS.into());
    config
}

pub fn open_config() -> KeymasterConfig {
    let mut config = guarded_config();
    config.auth.username = None;
    config.auth.password = None;
    config
}

pub fn basic(user: &str, pass: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{user}:{pass}")))
}

pub fn get(path: &str, authorization: Option<&str>) -> String {
    match authorization {
        Some(value) => format!("GET {path} HTTP/1.1\r\nHost: localhost\r\nAuthorization: {value}\r\n\r\n"),
        None => format!("GET {path} HTTP/1.1\r\nHost: localhost\r\n\r\n"),
    }
}

/// A daemon running on an ephemeral port.
pub struct Daemon {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub handle: JoinHandle<()>,
}

/// Start the daemon with challenges dispatched to worker threads.
pub async fn start_daemon(
    config: KeymasterConfig,
    authenticator: Arc<dyn Authenticator>,
    store: Arc<dyn SecretStore>,
) -> Daemon {
    let dispatcher = PromptDispatcher::spawn(authenticator).unwrap();
    let pipeline = Pipeline::new(&config, Arc::new(dispatcher), store);

    let listener = Listener::bind(&config.listener).await.unwrap();
    let addr = listener.local_addr();

    let shutdown = Shutdown::new();
    let server = HttpServer::new(&config, pipeline);
    let signal = shutdown.subscribe();
    let handle = tokio::spawn(async move { server.run(listener, signal).await });

    Daemon {
        addr,
        shutdown,
        handle,
    }
}

/// Send raw bytes and read until the server closes the connection.
pub async fn raw_exchange(addr: SocketAddr, request: &[u8]) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(request).await.unwrap();

    let mut response = Vec::new();
    tokio::time::timeout(Duration::from_secs(5), stream.read_to_end(&mut response))
        .await
        .expect("response timed out")
        .unwrap();
    String::from_utf8(response).unwrap()
}

/// Split a response into status line, headers, and body.
pub fn split_response(response: &str) -> (&str, &str, &str) {
    let (head, body) = response.split_once("\r\n\r\n").expect("no head terminator");
    let (status_line, headers) = head.split_once("\r\n").unwrap_or((head, ""));
    (status_line, headers, body)
}
