//! Error taxonomy for repository operations.
//!
//! Every operation returns these as values; the transport layer renders them
//! as human-readable strings identifying the offending path or repository.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("'{path}' does not exist")]
    NotFound { path: String },

    #[error("'{path}' is not a file")]
    NotAFile { path: String },

    #[error("'{path}' is not a valid {format} document")]
    UnsupportedFormat { path: String, format: &'static str },

    #[error("'{name}' is not a valid repository. Available repositories: {available}")]
    UnknownRepository { name: String, available: String },

    #[error("{0}")]
    InvalidArgument(String),

    #[error("could not read '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
