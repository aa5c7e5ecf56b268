use reqwest::StatusCode;
use std::time::Duration;
use thiserror::Error;

/// Error types that can occur when generating text
#[derive(Error, Debug)]
pub enum GenerationError {
    /// Authentication or authorization errors
    #[error("Auth Error: {0}")]
    AuthError(String),

    /// Invalid request parameters or format
    #[error("Invalid Request: {0}")]
    InvalidRequest(String),

    /// Rate limiting, timeouts and server-side failures worth retrying
    #[error("Transient Error: {message}")]
    Transient {
        message: String,
        retry_after: Option<Duration>,
    },

    /// Errors returned by the backend
    #[error("Provider Error: {0}")]
    ProviderError(String),

    /// The response body did not have the expected shape
    #[error("Response Format Error: {0}")]
    ResponseFormat(String),
}

impl GenerationError {
    pub fn is_transient(&self) -> bool {
        matches!(self, GenerationError::Transient { .. })
    }

    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            GenerationError::Transient { retry_after, .. } => *retry_after,
            _ => None,
        }
    }

    /// Map a non-success HTTP status onto the error taxonomy.
    pub(crate) fn from_status(
        provider: &str,
        status: StatusCode,
        retry_after: Option<Duration>,
        body: &str,
    ) -> Self {
        if status == StatusCode::TOO_MANY_REQUESTS
            || status == StatusCode::REQUEST_TIMEOUT
            || status.is_server_error()
        {
            return GenerationError::Transient {
                message: format!("{provider} returned {status}: {body}"),
                retry_after,
            };
        }
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                GenerationError::AuthError(format!("{provider} returned {status}: {body}"))
            }
            StatusCode::BAD_REQUEST | StatusCode::NOT_FOUND | StatusCode::UNPROCESSABLE_ENTITY => {
                GenerationError::InvalidRequest(format!("{provider} returned {status}: {body}"))
            }
            _ => GenerationError::ProviderError(format!("{provider} returned {status}: {body}")),
        }
    }
}

/// Converts reqwest HTTP errors into GenerationErrors
impl From<reqwest::Error> for GenerationError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() || err.is_connect() || err.is_request() {
            GenerationError::Transient {
                message: err.to_string(),
                retry_after: None,
            }
        } else if err.is_decode() {
            GenerationError::ResponseFormat(err.to_string())
        } else {
            GenerationError::ProviderError(err.to_string())
        }
    }
}

impl From<serde_json::Error> for GenerationError {
    fn from(err: serde_json::Error) -> Self {
        GenerationError::ResponseFormat(format!(
            "{} at line {} column {}",
            err,
            err.line(),
            err.column()
        ))
    }
}

/// Result type for generation calls
pub type GenerationResult<T> = Result<T, GenerationError>;

/// Delta-seconds `Retry-After` header, if present.
pub(crate) fn parse_retry_after(headers: &reqwest::header::HeaderMap) -> Option<Duration> {
    headers
        .get(reqwest::header::RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}
