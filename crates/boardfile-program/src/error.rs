//! Programmer error types.

use std::path::PathBuf;
use std::time::Duration;

/// Errors raised while parsing or rendering a descriptor template.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TemplateError {
    /// The template references a placeholder with no value.
    #[error("no value for placeholder {{{{{name}}}}}")]
    MissingPlaceholder { name: String },

    /// `{{` without a matching `}}`.
    #[error("unterminated placeholder at byte {offset}")]
    Unterminated { offset: usize },

    /// `{{}}` or a name with characters outside `[A-Za-z0-9_]`.
    #[error("invalid placeholder name '{name}' at byte {offset}")]
    InvalidName { name: String, offset: usize },
}

/// Errors that can occur while preparing or running a programmer.
#[derive(Debug, thiserror::Error)]
pub enum ProgramError {
    /// Descriptor template error.
    #[error(transparent)]
    Template(#[from] TemplateError),

    /// The bitstream path cannot be used.
    #[error("invalid bitstream path '{}': {reason}", path.display())]
    InvalidPath { path: PathBuf, reason: &'static str },

    /// The descriptor file could not be written.
    #[error("cannot write descriptor {}: {source}", path.display())]
    WriteDescriptor {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The external tool could not be started.
    #[error("failed to start '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The external tool did not finish in time and was killed.
    ///
    /// Nothing is assumed about the device state afterwards.
    #[error("'{program}' did not finish within {}s and was killed", after.as_secs())]
    Timeout {
        program: String,
        after: Duration,
        stdout: String,
        stderr: String,
    },

    /// The platform declares no programmer.
    #[error("platform '{platform}' has no programmer configured")]
    NoProgrammer { platform: String },

    /// I/O error while waiting on the external tool.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for programmer operations.
pub type Result<T> = std::result::Result<T, ProgramError>;
