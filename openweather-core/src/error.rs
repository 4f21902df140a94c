use std::fmt;

use thiserror::Error;

/// Coarse failure category surfaced to the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A required location segment was missing or blank.
    InvalidQuery,
    /// Transport failure or a non-2xx HTTP status.
    NetworkFailure,
    /// The response body could not be decoded.
    DecodeFailure,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvalidQuery => "invalid query",
            ErrorKind::NetworkFailure => "network failure",
            ErrorKind::DecodeFailure => "decode failure",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum WeatherError {
    #[error("Invalid location query: {0}")]
    InvalidQuery(String),

    #[error("Weather request failed: {0}")]
    NetworkFailure(String),

    #[error("Failed to decode weather response: {0}")]
    DecodeFailure(String),
}

impl WeatherError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            WeatherError::InvalidQuery(_) => ErrorKind::InvalidQuery,
            WeatherError::NetworkFailure(_) => ErrorKind::NetworkFailure,
            WeatherError::DecodeFailure(_) => ErrorKind::DecodeFailure,
        }
    }
}

impl From<serde_json::Error> for WeatherError {
    fn from(err: serde_json::Error) -> Self {
        WeatherError::DecodeFailure(err.to_string())
    }
}
