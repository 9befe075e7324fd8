use thiserror::Error;

/// Convenience result alias for `zone-monitor`.
pub type Result<T> = std::result::Result<T, MonitorError>;

/// All errors generated in `zone-monitor`.
#[derive(Debug, Clone, Eq, PartialEq, Error)]
pub enum MonitorError {
    #[error("trade monitor request failed: {0}")]
    Transport(String),

    #[error("trade monitor responded with HTTP {0}")]
    Status(u16),

    #[error("failed to parse trade monitor response: {0}")]
    Parse(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl From<reqwest::Error> for MonitorError {
    fn from(value: reqwest::Error) -> Self {
        if value.is_decode() {
            Self::Parse(value.to_string())
        } else if let Some(status) = value.status() {
            Self::Status(status.as_u16())
        } else {
            Self::Transport(value.to_string())
        }
    }
}

impl From<serde_json::Error> for MonitorError {
    fn from(value: serde_json::Error) -> Self {
        Self::Parse(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_monitor_error_display() {
        struct TestCase {
            input: MonitorError,
            expected: &'static str,
        }

        let tests = vec![
            TestCase {
                // TC0: network failure
                input: MonitorError::Transport("connection refused".to_string()),
                expected: "trade monitor request failed: connection refused",
            },
            TestCase {
                // TC1: non-2xx response
                input: MonitorError::Status(503),
                expected: "trade monitor responded with HTTP 503",
            },
            TestCase {
                // TC2: bad configuration
                input: MonitorError::Config("POLL_INTERVAL_SECS must be > 0".to_string()),
                expected: "invalid configuration: POLL_INTERVAL_SECS must be > 0",
            },
        ];

        for (index, test) in tests.into_iter().enumerate() {
            assert_eq!(test.input.to_string(), test.expected, "TC{} failed", index);
        }
    }

    #[test]
    fn test_json_error_is_parse() {
        let error = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        assert!(matches!(MonitorError::from(error), MonitorError::Parse(_)));
    }

}
