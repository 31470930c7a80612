//! Error types for warden-sources.

use thiserror::Error;

/// Result type for adapter operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors talking to the inventory and database tooling.
#[derive(Debug, Error)]
pub enum Error {
    /// The program could not be started at all
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The program ran and failed
    #[error("`{command}` failed ({status}): {stderr}")]
    CommandFailed {
        command: String,
        status: String,
        stderr: String,
    },

    /// Output did not have the expected shape
    #[error("unexpected output from {what}: {detail}")]
    Malformed { what: String, detail: String },

    /// Output was not decodable JSON
    #[error("invalid JSON from {what}: {source}")]
    Json {
        what: String,
        #[source]
        source: serde_json::Error,
    },

    /// An output pattern failed to compile
    #[error("invalid output pattern: {0}")]
    Pattern(#[from] regex::Error),

    /// The database answered a write with `ok != 1`
    #[error("{what} rejected: {message}")]
    Rejected { what: String, message: String },
}

impl Error {
    pub(crate) fn malformed(what: impl Into<String>, detail: impl Into<String>) -> Self {
        Error::Malformed {
            what: what.into(),
            detail: detail.into(),
        }
    }
}
