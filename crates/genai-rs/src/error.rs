use thiserror::Error;

const NOT_FOUND_MARKER: &str = "Requested entity was not found";

#[derive(Debug, Error)]
pub enum GenAiError {
    #[error("configuration error: {0}")]
    Config(String),
    #[error("missing api key: {0}")]
    MissingApiKey(String),
    #[error("{}", describe_http(.status, .message))]
    Http {
        status: Option<u16>,
        message: String,
    },
    #[error("parse error: {0}")]
    Parse(String),
    #[error("operation failed: {0}")]
    Operation(String),
}

impl GenAiError {
    pub fn status(status: u16, message: impl Into<String>) -> Self {
        GenAiError::Http {
            status: Some(status),
            message: message.into(),
        }
    }

    /// The service could not find the requested entity. For Gemini this is how
    /// a key without access to the model is reported.
    pub fn is_not_found(&self) -> bool {
        match self {
            GenAiError::Http { status, message } => {
                *status == Some(404) || message.contains(NOT_FOUND_MARKER)
            }
            GenAiError::Operation(message) => message.contains(NOT_FOUND_MARKER),
            _ => false,
        }
    }
}

impl From<reqwest::Error> for GenAiError {
    fn from(err: reqwest::Error) -> Self {
        GenAiError::Http {
            status: err.status().map(|s| s.as_u16()),
            message: err.to_string(),
        }
    }
}

fn describe_http(status: &Option<u16>, message: &str) -> String {
    match status {
        Some(code) => format!("http {code}: {message}"),
        None => format!("http error: {message}"),
    }
}

pub type Result<T> = std::result::Result<T, GenAiError>;
