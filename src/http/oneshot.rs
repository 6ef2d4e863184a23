//! One-shot driver for socket-activated processes.
//!
//! The supervisor owns the socket and hands the process a connected
//! stdin/stdout pair. The process reads one request head within a fixed
//! ceiling, answers it, and exits.
//!
//! ```text
//! ReadInput (bounded) → Process → WriteOutput → Exit
//! ```

use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};

use crate::config::KeymasterConfig;
use crate::http::request::{read_head, HeadLimits};
use crate::pipeline::Pipeline;

pub struct OneShot {
    pipeline: Arc<Pipeline>,
    limits: HeadLimits,
}

impl OneShot {
    pub fn new(config: &KeymasterConfig, pipeline: Pipeline) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            limits: HeadLimits {
                max_bytes: config.input.max_header_bytes,
                timeout: Some(config.input.timeout()),
                poll_interval: config.input.poll_interval(),
            },
        }
    }

    /// Serve exactly one request from `input` to `output`.
    ///
    /// Returns the status code written. A head that does not arrive complete
    /// within the ceiling is answered with 400 without being parsed.
    pub async fn run<R, W>(&self, input: &mut R, output: &mut W) -> std::io::Result<u16>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let response = match read_head(input, &self.limits).await {
            Ok(head) => {
                let pipeline = Arc::clone(&self.pipeline);
                tokio::task::spawn_blocking(move || pipeline.handle(&head))
                    .await
                    .map_err(std::io::Error::other)?
            }
            Err(e) => {
                tracing::warn!(error = %e, "No complete request on input");
                self.pipeline.respond(e.to_outcome())
            }
        };

        output.write_all(&response.to_bytes()).await?;
        output.flush().await?;
        Ok(response.status())
    }
}
