use thiserror::Error;

/// Error taxonomy for SCM operations and the promotion workflow.
///
/// `Config` and `NoChanges` are fatal and never retried. `Command` failures
/// may be retried, but only by the promotion orchestrator and only for the
/// merge/push phase of an attempt.
#[derive(Error, Debug)]
pub enum ScmError {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("SCM operation failed: {message}")]
    Scm { message: String },

    #[error("Command failed with exit code {exit_code}: {stderr}\nCommand={command}")]
    Command {
        stderr: String,
        command: String,
        exit_code: i32,
    },

    #[error("The change handler did not produce any file modifications")]
    NoChanges,

    #[error("Promotion failed after {attempts} attempts: {source}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        source: Box<ScmError>,
    },

    #[error("IO error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },
}

impl ScmError {
    pub fn config_error(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn scm_error(message: impl Into<String>) -> Self {
        Self::Scm {
            message: message.into(),
        }
    }

    pub fn command_failed(
        stderr: impl Into<String>,
        command: impl Into<String>,
        exit_code: i32,
    ) -> Self {
        Self::Command {
            stderr: stderr.into(),
            command: command.into(),
            exit_code,
        }
    }

    pub fn retries_exhausted(attempts: u32, source: ScmError) -> Self {
        Self::RetriesExhausted {
            attempts,
            source: Box::new(source),
        }
    }

    pub fn io_error(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source,
        }
    }

    /// True for failure categories that must never be retried.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Config { .. } | Self::NoChanges | Self::RetriesExhausted { .. }
        )
    }
}

impl From<std::io::Error> for ScmError {
    fn from(error: std::io::Error) -> Self {
        Self::io_error("IO operation failed", error)
    }
}
