use thiserror::Error;

/// Errors that can occur talking to the REST API
#[derive(Debug, Error)]
pub enum ApiError {
    /// Non-success HTTP status
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// Connection, DNS or TLS failure
    #[error("transport error: {0}")]
    Transport(String),

    /// Body was not the expected JSON
    #[error("malformed response: {0}")]
    Decode(String),
}

impl From<ureq::Error> for ApiError {
    fn from(e: ureq::Error) -> Self {
        match e {
            ureq::Error::Status(status, response) => {
                let fallback = response.status_text().to_string();
                let body = response.into_string().unwrap_or_default();
                ApiError::Status {
                    status,
                    message: error_message(&body).unwrap_or(fallback),
                }
            }
            ureq::Error::Transport(transport) => ApiError::Transport(transport.to_string()),
        }
    }
}

/// Pull the message out of an API error body (`{"status":403,"err":"Invalid token"}`)
pub(crate) fn error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    ["err", "message", "error"]
        .iter()
        .find_map(|key| value.get(*key).and_then(|v| v.as_str()))
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_from_body() {
        assert_eq!(
            error_message(r#"{"status":403,"err":"Invalid token"}"#).as_deref(),
            Some("Invalid token")
        );
        assert_eq!(error_message(r#"{"message":"Not found"}"#).as_deref(), Some("Not found"));
        assert_eq!(error_message("<html>"), None);
    }

    #[test]
    fn test_display() {
        let err = ApiError::Status {
            status: 404,
            message: "Not found".to_string(),
        };
        assert_eq!(err.to_string(), "HTTP 404: Not found");
    }
}
