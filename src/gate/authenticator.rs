//! Step-up authenticators.
//!
//! An [`Authenticator`] presents one interactive user-presence challenge per
//! call and blocks until it resolves. Implementations must not remember a
//! previous success.

use std::process::{Command, Stdio};

use crate::config::schema::REASON_PLACEHOLDER;

/// Environment variable carrying the rendered reason to the helper.
pub const PROMPT_REASON_ENV: &str = "KEYMASTERD_PROMPT_REASON";

/// Why a user-presence challenge did not succeed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChallengeError {
    #[error("user declined the challenge")]
    Declined,

    #[error("authentication unavailable: {0}")]
    Unavailable(String),

    #[error("authentication failed: {0}")]
    Failed(String),
}

/// Synchronous user-presence challenge.
pub trait Authenticator: Send + Sync {
    /// Present a fresh challenge explaining `reason` and wait for the result.
    fn authenticate(&self, reason: &str) -> Result<(), ChallengeError>;
}

/// Runs an OS helper program as the challenge.
///
/// Exit status 0 means the user authenticated. `pkexec /bin/true` (polkit)
/// and an `osascript` administrator prompt are the stock helpers.
#[derive(Debug, Clone)]
pub struct CommandAuthenticator {
    program: String,
    args: Vec<String>,
}

impl CommandAuthenticator {
    /// Build from an argv list; `None` when the list is empty.
    pub fn from_argv(argv: &[String]) -> Option<Self> {
        let (program, args) = argv.split_first()?;
        Some(Self {
            program: program.clone(),
            args: args.to_vec(),
        })
    }

    fn command(&self, reason: &str) -> Command {
        let reason = sanitize_reason(reason);
        let mut command = Command::new(&self.program);
        command
            .args(self.args.iter().map(|arg| arg.replace(REASON_PLACEHOLDER, &reason)))
            .env(PROMPT_REASON_ENV, &reason)
            // stdout may be the client socket in one-shot mode.
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        command
    }
}

impl Authenticator for CommandAuthenticator {
    fn authenticate(&self, reason: &str) -> Result<(), ChallengeError> {
        let status = self.command(reason).status().map_err(|e| {
            ChallengeError::Unavailable(format!("cannot run {}: {e}", self.program))
        })?;

        if status.success() {
            return Ok(());
        }
        match status.code() {
            Some(code) => {
                tracing::debug!(program = %self.program, code, "Challenge helper refused");
                Err(ChallengeError::Declined)
            }
            None => Err(ChallengeError::Failed(format!(
                "{} terminated by signal",
                self.program
            ))),
        }
    }
}

/// Make a reason safe to embed in a quoted helper argument.
///
/// Key names come from the network, so quotes, backslashes and control
/// characters are removed before substitution.
pub fn sanitize_reason(reason: &str) -> String {
    reason
        .chars()
        .filter(|c| !c.is_control() && *c != '\\')
        .map(|c| if c == '"' { '\'' } else { c })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn sanitize_strips_quote_breakers() {
        assert_eq!(
            sanitize_reason("read \"a\\\" & do shell script \"rm\"\n"),
            "read 'a' & do shell script 'rm'"
        );
    }

    #[test]
    fn empty_argv_has_no_authenticator() {
        assert!(CommandAuthenticator::from_argv(&[]).is_none());
    }

    #[test]
    fn reason_is_substituted_into_arguments() {
        let auth = CommandAuthenticator::from_argv(&argv(&["helper", "--why={reason}"])).unwrap();
        let command = auth.command("read \"db\"");
        let args: Vec<String> = command
            .get_args()
            .map(|arg| arg.to_string_lossy().into_owned())
            .collect();
        assert_eq!(args, vec!["--why=read 'db'".to_string()]);
    }

    #[test]
    fn helper_sees_rendered_reason_under_its_own_name() {
        let auth = CommandAuthenticator::from_argv(&argv(&["helper"])).unwrap();
        let command = auth.command("read \"db\"");
        let envs: Vec<(String, Option<String>)> = command
            .get_envs()
            .map(|(k, v)| {
                (
                    k.to_string_lossy().into_owned(),
                    v.map(|v| v.to_string_lossy().into_owned()),
                )
            })
            .collect();

        assert_eq!(
            envs,
            vec![(PROMPT_REASON_ENV.to_string(), Some("read 'db'".to_string()))]
        );
        assert_ne!(PROMPT_REASON_ENV, crate::config::loader::ENV_REASON);
    }

    #[cfg(unix)]
    #[test]
    fn exit_status_decides_outcome() {
        let ok = CommandAuthenticator::from_argv(&argv(&["true"])).unwrap();
        assert_eq!(ok.authenticate("x"), Ok(()));

        let declined = CommandAuthenticator::from_argv(&argv(&["false"])).unwrap();
        assert_eq!(declined.authenticate("x"), Err(ChallengeError::Declined));
    }

    #[test]
    fn missing_helper_is_unavailable() {
        let auth =
            CommandAuthenticator::from_argv(&argv(&["/nonexistent/keymasterd-helper"])).unwrap();
        assert!(matches!(
            auth.authenticate("x"),
            Err(ChallengeError::Unavailable(_))
        ));
    }
}
