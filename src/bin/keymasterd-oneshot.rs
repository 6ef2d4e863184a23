//! keymasterd one-shot handler for socket activation (inetd, systemd
//! `Accept=yes`, launchd `inetdCompatibility`).
//!
//! stdin/stdout are the accepted connection. Configuration comes from the
//! environment only; logs go to stderr.

use keymasterd::config::load_from_env;
use keymasterd::http::OneShot;
use keymasterd::lifecycle::{build_pipeline, PromptMode};
use keymasterd::observability::logging;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init("keymasterd=warn");

    let config = load_from_env().map_err(|e| {
        tracing::error!(error = %e, "Invalid configuration");
        e
    })?;
    let pipeline = build_pipeline(&config, PromptMode::Inline).map_err(|e| {
        tracing::error!(error = %e, "Startup failed");
        e
    })?;
    let handler = OneShot::new(&config, pipeline);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let result = runtime.block_on(async {
        let mut stdin = tokio::io::stdin();
        let mut stdout = tokio::io::stdout();
        handler.run(&mut stdin, &mut stdout).await
    });
    // A stdin read may still be parked on a blocking thread; do not wait for it.
    runtime.shutdown_background();

    let status = result?;
    tracing::debug!(status, "Request served");
    Ok(())
}
