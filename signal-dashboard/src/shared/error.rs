use thiserror::Error;

/// All errors generated in `signal-dashboard`.
#[derive(Debug, Clone, Eq, PartialEq, Error)]
pub enum DashboardError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("malformed message: {0}")]
    MalformedMessage(String),

    #[error("{0}")]
    Validation(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl From<tokio_tungstenite::tungstenite::Error> for DashboardError {
    fn from(value: tokio_tungstenite::tungstenite::Error) -> Self {
        Self::Connection(value.to_string())
    }
}

impl From<serde_json::Error> for DashboardError {
    fn from(value: serde_json::Error) -> Self {
        Self::MalformedMessage(value.to_string())
    }
}

impl From<url::ParseError> for DashboardError {
    fn from(value: url::ParseError) -> Self {
        Self::Config(format!("invalid url: {value}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_tungstenite_error_is_connection() {
        struct TestCase {
            input: tokio_tungstenite::tungstenite::Error,
            expected: DashboardError,
        }

        let tests = vec![
            TestCase {
                input: tokio_tungstenite::tungstenite::Error::ConnectionClosed,
                expected: DashboardError::Connection(
                    "Connection closed normally".to_string(),
                ),
            },
            TestCase {
                input: tokio_tungstenite::tungstenite::Error::AlreadyClosed,
                expected: DashboardError::Connection(
                    "Trying to work with closed connection".to_string(),
                ),
            },
        ];

        for (index, test) in tests.into_iter().enumerate() {
            assert_eq!(DashboardError::from(test.input), test.expected, "TC{index} failed");
        }
    }

    #[test]
    fn test_from_serde_error_is_malformed() {
        let err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        assert!(matches!(
            DashboardError::from(err),
            DashboardError::MalformedMessage(_)
        ));
    }

    #[test]
    fn test_validation_display_is_bare_message() {
        let err = DashboardError::Validation("Please enter a valid amount".to_string());
        assert_eq!(err.to_string(), "Please enter a valid amount");
    }
}
