//! Hand-off of challenges to prompt threads.
//!
//! Interactive prompts run apart from the networking runtime. A long-lived
//! dispatch thread receives each challenge and starts a worker thread for
//! it, so a prompt nobody answers holds only its own request. Each call
//! creates a single-use reply channel; its worker fills it once and the
//! calling connection blocks on it.

use std::sync::Arc;
use std::thread;

use tokio::sync::{mpsc, oneshot};

use super::authenticator::{Authenticator, ChallengeError};

const WORKER_NAME: &str = "keymasterd-challenge";

struct PromptJob {
    reason: String,
    reply: oneshot::Sender<Result<(), ChallengeError>>,
}

/// An [`Authenticator`] that runs every challenge on its own prompt thread.
///
/// `authenticate` blocks the calling thread, so it must run on a blocking
/// thread, never directly on an async task.
#[derive(Clone)]
pub struct PromptDispatcher {
    jobs: mpsc::UnboundedSender<PromptJob>,
}

impl PromptDispatcher {
    /// Start the dispatch thread around `inner`.
    ///
    /// The thread exits once every dispatcher handle has been dropped.
    /// Workers already running finish their challenge.
    pub fn spawn(inner: Arc<dyn Authenticator>) -> std::io::Result<Self> {
        let (jobs, mut queue) = mpsc::unbounded_channel::<PromptJob>();

        thread::Builder::new()
            .name("keymasterd-prompt".to_string())
            .spawn(move || {
                while let Some(job) = queue.blocking_recv() {
                    run_worker(Arc::clone(&inner), job);
                }
                tracing::debug!("Prompt dispatch thread stopped");
            })?;

        Ok(Self { jobs })
    }
}

/// Run one challenge on a fresh worker thread.
///
/// If the worker cannot start, the reply is dropped and the caller sees
/// [`ChallengeError::Unavailable`].
fn run_worker(inner: Arc<dyn Authenticator>, job: PromptJob) {
    let spawned = thread::Builder::new()
        .name(WORKER_NAME.to_string())
        .spawn(move || {
            let result = inner.authenticate(&job.reason);
            if job.reply.send(result).is_err() {
                tracing::debug!("Challenge resolved after its connection went away");
            }
        });

    if let Err(e) = spawned {
        tracing::error!(error = %e, "Failed to start challenge worker");
    }
}

impl Authenticator for PromptDispatcher {
    fn authenticate(&self, reason: &str) -> Result<(), ChallengeError> {
        let (reply, result) = oneshot::channel();
        self.jobs
            .send(PromptJob {
                reason: reason.to_string(),
                reply,
            })
            .map_err(|_| ChallengeError::Unavailable("prompt thread has stopped".to_string()))?;

        result.blocking_recv().map_err(|_| {
            ChallengeError::Unavailable("challenge worker dropped the challenge".to_string())
        })?
    }
}
