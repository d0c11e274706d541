use http::StatusCode;
use serde_json::Value;
use thiserror::Error;

/// Result type alias for gamepass operations
pub type Result<T, E = GamepassError> = std::result::Result<T, E>;

/// Network-level failures talking to the upstream platform. These never carry
/// a status code; an upstream that answered at all is reported through
/// [`crate::upstream::UpstreamResponse`] instead.
#[derive(Error, Debug)]
pub enum UpstreamError {
    #[error("Upstream timeout for {0}")]
    Timeout(String),

    #[error("Upstream request failed for {0}: {1}")]
    RequestFailed(String, String),
}

/// Failures setting up or running the HTTP service.
#[derive(Error, Debug)]
pub enum ServeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid API key header name: {0}")]
    InvalidHeader(String),

    #[error("could not build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// Errors surfaced by the gamepass operations and mapped onto HTTP responses
/// by the api layer.
#[derive(Error, Debug)]
pub enum GamepassError {
    /// Malformed or missing request parameters.
    #[error("{0}")]
    InvalidInput(String),

    /// Upstream answered with a non-success status.
    #[error("upstream responded with status {status}")]
    Upstream { status: StatusCode, body: Value },

    /// No response from upstream at all.
    #[error("upstream request failed")]
    Network(#[from] UpstreamError),

    #[error("API key is not configured; set GAMEPASS_API_KEY or gamepass.api_key")]
    MissingApiKey,
}

impl GamepassError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        GamepassError::InvalidInput(message.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            GamepassError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            GamepassError::Upstream { status, .. } => {
                if status.is_client_error() || status.is_server_error() {
                    *status
                } else {
                    StatusCode::BAD_GATEWAY
                }
            }
            GamepassError::Network(_) | GamepassError::MissingApiKey => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            GamepassError::invalid_input("userId is required").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            GamepassError::Upstream {
                status: StatusCode::TOO_MANY_REQUESTS,
                body: Value::Null,
            }
            .status_code(),
            StatusCode::TOO_MANY_REQUESTS
        );
        // A redirect is not something we can forward as an error status
        assert_eq!(
            GamepassError::Upstream {
                status: StatusCode::MOVED_PERMANENTLY,
                body: Value::Null,
            }
            .status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            GamepassError::Network(UpstreamError::Timeout("apis.example.com".into()))
                .status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            GamepassError::MissingApiKey.status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_network_message_is_generic() {
        let err = GamepassError::from(UpstreamError::RequestFailed(
            "10.0.0.1".into(),
            "connection refused".into(),
        ));
        assert_eq!(err.to_string(), "upstream request failed");
    }
}
