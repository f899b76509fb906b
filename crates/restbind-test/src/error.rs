//! Test error types.

use thiserror::Error;

/// Errors that can occur while building a test request or reading its
/// response.
#[derive(Debug, Error)]
pub enum TestError {
    /// The request URI does not parse.
    #[error("invalid uri '{uri}': {reason}")]
    InvalidUri {
        /// The rejected URI.
        uri: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A header name or value is invalid.
    #[error("invalid header '{name}': {reason}")]
    InvalidHeader {
        /// The header name as given.
        name: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The response body is not valid UTF-8.
    #[error("response body is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    /// JSON serialization or deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = TestError::InvalidHeader {
            name: "bad header".into(),
            reason: "invalid HTTP header name".into(),
        };
        assert_eq!(
            err.to_string(),
            "invalid header 'bad header': invalid HTTP header name"
        );
    }

    #[test]
    fn test_json_source() {
        let json_err = serde_json::from_str::<u8>("x").unwrap_err();
        let err = TestError::from(json_err);
        assert!(std::error::Error::source(&err).is_some());
    }
}
