//! Backend error types.
//!
//! Every call to an external generation backend resolves to
//! `Result<_, BackendError>`; callers decide whether a failure is fatal
//! (it almost never is).

use serde::de::DeserializeOwned;

/// Error from a backend call.
#[derive(Debug)]
pub struct BackendError {
    /// The kind of error
    pub kind: BackendErrorKind,
    /// HTTP status code, if applicable
    pub status_code: Option<u16>,
    /// Error message
    pub message: String,
}

impl BackendError {
    /// Create a rate limit error.
    pub fn rate_limited(message: String) -> Self {
        Self {
            kind: BackendErrorKind::RateLimited,
            status_code: Some(429),
            message,
        }
    }

    /// Create a server error.
    pub fn server_error(status_code: u16, message: String) -> Self {
        Self {
            kind: BackendErrorKind::ServerError,
            status_code: Some(status_code),
            message,
        }
    }

    /// Create a client error (bad request, auth, etc.).
    pub fn client_error(status_code: u16, message: String) -> Self {
        Self {
            kind: BackendErrorKind::ClientError,
            status_code: Some(status_code),
            message,
        }
    }

    /// Create a network error.
    pub fn network_error(message: String) -> Self {
        Self {
            kind: BackendErrorKind::NetworkError,
            status_code: None,
            message,
        }
    }

    /// Create a parse error.
    pub fn parse_error(message: String) -> Self {
        Self {
            kind: BackendErrorKind::ParseError,
            status_code: None,
            message,
        }
    }

    /// The backend answered but reported `success: false`.
    pub fn rejected(message: String) -> Self {
        Self {
            kind: BackendErrorKind::Rejected,
            status_code: None,
            message,
        }
    }

    /// Map an HTTP failure status onto an error.
    pub fn from_status(status_code: u16, body: &str) -> Self {
        let message = crate::util::truncate_chars(body, 500).to_string();
        match classify_http_status(status_code) {
            BackendErrorKind::RateLimited => Self::rate_limited(message),
            BackendErrorKind::ClientError => Self::client_error(status_code, message),
            _ => Self::server_error(status_code, message),
        }
    }
}

impl From<reqwest::Error> for BackendError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::network_error(format!("Request timeout: {}", e))
        } else if e.is_connect() {
            Self::network_error(format!("Connection failed: {}", e))
        } else if e.is_decode() {
            Self::parse_error(format!("Failed to decode response: {}", e))
        } else {
            Self::network_error(format!("Request failed: {}", e))
        }
    }
}

impl std::fmt::Display for BackendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.status_code {
            Some(code) => write!(f, "{} (HTTP {}): {}", self.kind, code, self.message),
            None => write!(f, "{}: {}", self.kind, self.message),
        }
    }
}

impl std::error::Error for BackendError {}

/// Classification of backend errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendErrorKind {
    /// Rate limited (429)
    RateLimited,
    /// Server error (5xx)
    ServerError,
    /// Client error (4xx other than 429)
    ClientError,
    /// Network error (connection failed, timeout)
    NetworkError,
    /// Response parsing error
    ParseError,
    /// Backend reported an unsuccessful generation
    Rejected,
}

impl std::fmt::Display for BackendErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendErrorKind::RateLimited => write!(f, "Rate limited"),
            BackendErrorKind::ServerError => write!(f, "Server error"),
            BackendErrorKind::ClientError => write!(f, "Client error"),
            BackendErrorKind::NetworkError => write!(f, "Network error"),
            BackendErrorKind::ParseError => write!(f, "Parse error"),
            BackendErrorKind::Rejected => write!(f, "Rejected"),
        }
    }
}

/// Parse HTTP status code into error kind.
pub fn classify_http_status(status: u16) -> BackendErrorKind {
    match status {
        429 => BackendErrorKind::RateLimited,
        400..=499 => BackendErrorKind::ClientError,
        _ => BackendErrorKind::ServerError,
    }
}

/// Read a JSON body, turning non-2xx statuses into errors.
pub(crate) async fn read_json<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, BackendError> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        return Err(BackendError::from_status(status.as_u16(), &body));
    }

    serde_json::from_str(&body).map_err(|e| {
        BackendError::parse_error(format!(
            "Failed to parse response: {}, body: {}",
            e,
            crate::util::truncate_chars(&body, 200)
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_status_classification() {
        assert_eq!(classify_http_status(429), BackendErrorKind::RateLimited);
        assert_eq!(classify_http_status(500), BackendErrorKind::ServerError);
        assert_eq!(classify_http_status(503), BackendErrorKind::ServerError);
        assert_eq!(classify_http_status(400), BackendErrorKind::ClientError);
        assert_eq!(classify_http_status(404), BackendErrorKind::ClientError);
    }

    #[test]
    fn test_display_includes_status() {
        let err = BackendError::from_status(503, "model is loading");
        assert_eq!(err.to_string(), "Server error (HTTP 503): model is loading");

        let err = BackendError::rejected("no code".to_string());
        assert_eq!(err.to_string(), "Rejected: no code");
    }
}
