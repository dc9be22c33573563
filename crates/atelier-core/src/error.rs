use std::path::PathBuf;
use thiserror::Error;

/// Failures a generation attempt or an edit can surface to the user.
#[derive(Debug, Error)]
pub enum StudioError {
    #[error("cannot read reference file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("credential selection failed: {0}")]
    Credential(String),
    #[error("the service rejected the selected credential: {0}")]
    CredentialRejected(String),
    #[error("generation failed: {0}")]
    Service(String),
    #[error("a generation is already in progress")]
    Busy,
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl StudioError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StudioError::Io {
            path: path.into(),
            source,
        }
    }

    /// Message shown to the user once the attempt is over.
    pub fn user_message(&self) -> String {
        match self {
            StudioError::CredentialRejected(_) => {
                "The selected API key was rejected. Pick another key and try again.".to_string()
            }
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, StudioError>;
