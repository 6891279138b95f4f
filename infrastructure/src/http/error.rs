//! Error types for the HTTP adapter

use debate_application::ApiError;
use debate_application::ports::debate_api::DEFAULT_API_ERROR_MESSAGE;
use thiserror::Error;

/// Errors raised while talking to the debate server over HTTP
#[derive(Error, Debug)]
pub enum HttpError {
    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("{message} (HTTP {status})")]
    Status { status: u16, message: String },

    #[error("Failed to decode {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

impl HttpError {
    /// Build a status error from a non-success response body.
    ///
    /// The message comes from the body's `message` field when present.
    pub fn from_status(status: u16, body: &str) -> Self {
        let message = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_ERROR_MESSAGE.to_string());
        HttpError::Status { status, message }
    }
}

impl From<HttpError> for ApiError {
    fn from(error: HttpError) -> Self {
        match error {
            HttpError::Request(e) if e.is_timeout() => ApiError::Timeout,
            HttpError::Request(e) if e.is_decode() => ApiError::InvalidResponse(e.to_string()),
            HttpError::Request(e) => ApiError::Network(e.to_string()),
            HttpError::Client(e) => ApiError::Network(e.to_string()),
            HttpError::Status { status, message } => ApiError::Status { status, message },
            HttpError::Decode { path, source } => {
                ApiError::InvalidResponse(format!("{}: {}", path, source))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_message_from_body() {
        let error = HttpError::from_status(400, r#"{"message":"Debate already finalized"}"#);
        assert_eq!(
            ApiError::from(error),
            ApiError::Status {
                status: 400,
                message: "Debate already finalized".to_string()
            }
        );
    }

    #[test]
    fn test_status_message_fallback() {
        for body in ["", "<html>oops</html>", r#"{"error":"x"}"#, r#"{"message":""}"#] {
            let error = HttpError::from_status(500, body);
            assert_eq!(ApiError::from(error).message(), DEFAULT_API_ERROR_MESSAGE);
        }
    }

    #[test]
    fn test_decode_error_maps_to_invalid_response() {
        let source = serde_json::from_str::<u32>("\"x\"").unwrap_err();
        let error = HttpError::Decode {
            path: "/debates/d1/status".to_string(),
            source,
        };
        assert!(matches!(ApiError::from(error), ApiError::InvalidResponse(m) if m.starts_with("/debates/d1/status")));
    }
}
