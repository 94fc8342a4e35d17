use poem::http::StatusCode;
use serde_json::Value;

/// Failure of an orchestrated call to one of the outbound providers.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Bad or missing input from the caller.
    #[error("{0}")]
    Validation(String),

    /// The provider answered but gave nothing usable.
    #[error("{0}")]
    UpstreamContent(String),

    /// The provider rejected the upload or send.
    #[error("{message}")]
    UpstreamFailure { message: String, details: Value },

    #[error("{0}")]
    Transport(String),

    /// A required credential is missing; nothing was sent.
    #[error("{0}")]
    Configuration(String),
}

impl ServiceError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServiceError::Validation(_) => StatusCode::BAD_REQUEST,
            ServiceError::UpstreamContent(_) | ServiceError::UpstreamFailure { .. } => {
                StatusCode::BAD_GATEWAY
            }
            ServiceError::Transport(_) | ServiceError::Configuration(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ServiceError::Validation(_) => "ValidationError",
            ServiceError::UpstreamContent(_) => "UpstreamContentError",
            ServiceError::UpstreamFailure { .. } => "UpstreamFailure",
            ServiceError::Transport(_) => "TransportError",
            ServiceError::Configuration(_) => "ConfigurationError",
        }
    }

    pub fn details(&self) -> Option<&Value> {
        match self {
            ServiceError::UpstreamFailure { details, .. } => Some(details),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ServiceError {
    fn from(err: reqwest::Error) -> Self {
        ServiceError::Transport(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ServiceError::Validation("no message".to_string()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ServiceError::UpstreamContent("empty".to_string()).status(),
            StatusCode::BAD_GATEWAY
        );
        let failure = ServiceError::UpstreamFailure {
            message: "upload failed".to_string(),
            details: json!({"error": {"message": "bad signature"}}),
        };
        assert_eq!(failure.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(failure.details(), Some(&json!({"error": {"message": "bad signature"}})));
        assert_eq!(
            ServiceError::Transport("connection reset".to_string()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ServiceError::Configuration("missing key".to_string()).kind(),
            "ConfigurationError"
        );
    }
}
