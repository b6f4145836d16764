//! Remote API error taxonomy

use thiserror::Error;

use super::api_types::ErrorDetail;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// Transport failure: connection refused, timeout, reset.
    #[error("Network error: {0}")]
    Network(String),

    /// HTTP 429. Distinct from a rejection so callers never imply the
    /// user's input was wrong.
    #[error("Service temporarily unavailable, please try again shortly")]
    RateLimited,

    /// No active session on the backend.
    #[error("Unauthorized - please login again")]
    Unauthorized,

    /// 4xx carrying the backend's `detail` message.
    #[error("{detail}")]
    Rejected { status: u16, detail: String },

    #[error("Server error ({status}): {detail}")]
    Server { status: u16, detail: String },

    #[error("Invalid response from server: {0}")]
    Decode(String),
}

impl ApiError {
    /// Map a non-success status and its body to an error.
    pub fn from_status(status: u16, body: &str) -> Self {
        match status {
            429 => ApiError::RateLimited,
            401 | 403 => ApiError::Unauthorized,
            400..=499 => ApiError::Rejected {
                status,
                detail: extract_detail(body),
            },
            _ => ApiError::Server {
                status,
                detail: extract_detail(body),
            },
        }
    }

    /// Worth retrying without user intervention.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ApiError::Network(_)
                | ApiError::RateLimited
                | ApiError::Server { .. }
        )
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else {
            ApiError::Network(err.to_string())
        }
    }
}

fn extract_detail(body: &str) -> String {
    match serde_json::from_str::<ErrorDetail>(body) {
        Ok(parsed) => parsed.detail,
        Err(_) if body.trim().is_empty() => "Unknown error".to_string(),
        Err(_) => body.trim().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limit_is_its_own_kind() {
        assert_eq!(ApiError::from_status(429, ""), ApiError::RateLimited);
        assert!(ApiError::RateLimited.is_transient());
    }

    #[test]
    fn client_errors_surface_backend_detail() {
        let err = ApiError::from_status(
            400,
            r#"{"detail": "Solo puedes depositar $100 más"}"#,
        );
        assert_eq!(err.to_string(), "Solo puedes depositar $100 más");
        assert!(!err.is_transient());
    }

    #[test]
    fn falls_back_to_raw_body() {
        let err = ApiError::from_status(502, "bad gateway");
        assert_eq!(
            err,
            ApiError::Server {
                status: 502,
                detail: "bad gateway".into()
            }
        );
        assert_eq!(ApiError::from_status(401, ""), ApiError::Unauthorized);
    }
}
