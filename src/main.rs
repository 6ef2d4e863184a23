//! keymasterd daemon.
//!
//! # Architecture Overview
//!
//! ```text
//!                 ┌──────────────────────────────────────────────────────────┐
//!                 │                        KEYMASTERD                        │
//!                 │                                                          │
//!  GET /key/name  │  ┌──────────┐   ┌─────────┐   ┌─────────┐   ┌─────────┐  │
//!  ───────────────┼─▶│   net    │──▶│ request │──▶│ routing │──▶│  gate   │  │
//!                 │  │ listener │   │  parse  │   │ + basic │   │         │  │
//!                 │  └──────────┘   └─────────┘   │  auth   │   └────┬────┘  │
//!                 │                               └─────────┘        │       │
//!                 │                                    worker thread ▼       │
//!                 │                                  ┌──────────────────┐    │
//!                 │                                  │  Authenticator   │    │
//!                 │                                  │ (user presence)  │    │
//!                 │                                  └────────┬─────────┘    │
//!                 │                                           ▼              │
//!  200 <secret>   │  ┌──────────┐                    ┌──────────────────┐    │
//!  ◀──────────────┼──│ response │◀───────────────────│   SecretStore    │    │
//!                 │  │  encode  │                    └──────────────────┘    │
//!                 │  └──────────┘                                            │
//!                 └──────────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use keymasterd::config::{load_config, ConfigOverrides, KeymasterConfig};
use keymasterd::http::HttpServer;
use keymasterd::lifecycle::{build_pipeline, signals, PromptMode, Shutdown};
use keymasterd::net::Listener;
use keymasterd::observability::logging;

/// How long runtime teardown waits for blocking work (e.g. an abandoned prompt).
const RUNTIME_TEARDOWN: Duration = Duration::from_secs(1);

#[derive(Parser)]
#[command(name = "keymasterd", version)]
#[command(about = "Serve secrets over local HTTP behind Basic-Auth and a user-presence check", long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long, env = "KEYMASTERD_CONFIG")]
    config: Option<PathBuf>,

    /// Bind host
    #[arg(long)]
    host: Option<String>,

    /// Bind port
    #[arg(short, long)]
    port: Option<u16>,

    /// Basic-Auth username (requires --password)
    #[arg(long, requires = "password")]
    username: Option<String>,

    /// Basic-Auth password (requires --username)
    #[arg(long, requires = "username")]
    password: Option<String>,

    /// Prompt reason template; `{key}` is replaced by the key name
    #[arg(long)]
    reason: Option<String>,
}

impl Cli {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            host: self.host.clone(),
            port: self.port,
            username: self.username.clone(),
            password: self.password.clone(),
            reason: self.reason.clone(),
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    logging::init(logging::DEFAULT_FILTER);

    tracing::info!("keymasterd v{} starting", env!("CARGO_PKG_VERSION"));

    let config = load_config(cli.config.as_deref(), &cli.overrides()).map_err(|e| {
        tracing::error!(error = %e, "Invalid configuration");
        e
    })?;

    tracing::info!(
        bind_address = %config.listener.bind_address(),
        basic_auth = config.auth.credentials().is_some(),
        store = ?config.store.backend,
        "Configuration loaded"
    );

    let runtime = tokio::runtime::Runtime::new()?;
    let result = runtime.block_on(serve(config));
    runtime.shutdown_timeout(RUNTIME_TEARDOWN);

    if let Err(e) = &result {
        tracing::error!(error = %e, "keymasterd failed");
    }
    result
}

async fn serve(config: KeymasterConfig) -> Result<(), Box<dyn std::error::Error>> {
    let pipeline = build_pipeline(&config, PromptMode::Dispatched)?;
    let listener = Listener::bind(&config.listener).await?;

    let shutdown = Shutdown::new();
    signals::spawn_handler(shutdown.clone());

    HttpServer::new(&config, pipeline)
        .run(listener, shutdown.subscribe())
        .await;

    tracing::info!("Shutdown complete");
    Ok(())
}
