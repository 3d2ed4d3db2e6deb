use std::error::Error as StdError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TwinklyError {
    /// The request never produced an HTTP response (refused, timed out, DNS, proxy).
    #[error("network error: {0}")]
    Network(#[source] Box<dyn StdError + Send + Sync>),
    /// Login reached the device but the response did not carry a usable token.
    #[error("authentication failed: {0}")]
    Authentication(String),
    #[error("device rejected {endpoint} ({status}): {body}")]
    Device {
        endpoint: String,
        status: u16,
        body: String,
    },
    #[error("frame has {actual} pixels but the movie expects {expected}")]
    FrameLength { expected: usize, actual: usize },
    #[error("invalid pixel '{0}': expected r,g,b with each channel in 0..=255")]
    InvalidPixel(String),
    #[error("unknown device mode '{0}'")]
    UnknownMode(String),
    #[error("config error: {0}")]
    Config(String),
    #[error("failed to encode request body: {0}")]
    Encode(#[from] serde_json::Error),
}

impl TwinklyError {
    pub fn network(source: impl StdError + Send + Sync + 'static) -> Self {
        TwinklyError::Network(Box::new(source))
    }

    /// Status code the device answered with, if it answered at all.
    pub fn device_status(&self) -> Option<u16> {
        match self {
            TwinklyError::Device { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for TwinklyError {
    fn from(value: reqwest::Error) -> Self {
        TwinklyError::network(value)
    }
}

pub type Result<T> = std::result::Result<T, TwinklyError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn network_error_keeps_source() {
        let err = TwinklyError::network(io::Error::new(
            io::ErrorKind::ConnectionRefused,
            "connection refused",
        ));
        assert_eq!(err.to_string(), "network error: connection refused");
        assert!(StdError::source(&err).is_some());
        assert_eq!(err.device_status(), None);
    }

    #[test]
    fn device_error_reports_status() {
        let err = TwinklyError::Device {
            endpoint: "led/mode".into(),
            status: 401,
            body: "Unauthorized".into(),
        };
        assert_eq!(err.device_status(), Some(401));
        assert_eq!(
            err.to_string(),
            "device rejected led/mode (401): Unauthorized"
        );
    }
}
