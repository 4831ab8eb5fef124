//! Error types for the HTTP engine.

use std::path::PathBuf;

use thiserror::Error;
use wt_story::EngineError;

/// Result type for HTTP engine operations.
pub type HttpResult<T> = Result<T, HttpError>;

/// Errors talking to the completion server.
#[derive(Debug, Error)]
pub enum HttpError {
    /// The HTTP client could not be built.
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    /// The server could not be reached or the connection broke.
    #[error("could not reach {url}: {source}")]
    Connect {
        /// Endpoint that was called.
        url: String,
        /// Underlying transport error.
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with a non-success status.
    #[error("server returned {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, possibly empty.
        body: String,
    },

    /// The response body was not what an OpenAI-compatible server sends.
    #[error("malformed response: {0}")]
    Decode(String),

    /// The requested model is not among the served ones.
    #[error("model '{model}' is not served (available: {available})")]
    UnknownModel {
        /// Requested identifier.
        model: String,
        /// Comma-separated served identifiers.
        available: String,
    },

    /// A completion was requested before a model was loaded.
    #[error("no model loaded")]
    NotLoaded,
}

impl HttpError {
    /// Convert a failure during model loading.
    pub fn into_load_error(self) -> EngineError {
        EngineError::Load(self.to_string())
    }
}

impl From<HttpError> for EngineError {
    fn from(err: HttpError) -> Self {
        EngineError::Request(err.to_string())
    }
}

/// Errors reading an engine configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read {path}: {source}")]
    Read {
        /// Path that was read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The file is not a valid configuration.
    #[error("invalid config {path}: {source}")]
    Parse {
        /// Path that was parsed.
        path: PathBuf,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_to_request_error() {
        let err: EngineError = HttpError::Status {
            status: 503,
            body: "loading".into(),
        }
        .into();
        assert_eq!(
            err,
            EngineError::Request("server returned 503: loading".to_string())
        );
    }

    #[test]
    fn load_error_keeps_message() {
        let err = HttpError::UnknownModel {
            model: "big".into(),
            available: "tiny, small".into(),
        }
        .into_load_error();
        assert_eq!(
            err.to_string(),
            "model 'big' is not served (available: tiny, small)"
        );
    }
}
