use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[serde(tag = "error")]
pub enum Error {
    #[error("authentication failed: {message}")]
    AuthenticationFailed { message: String },
    #[error("not found: {message}")]
    NotFound { message: String },
    #[error("invalid transition: {message}")]
    InvalidTransition { message: String },
    #[error("forbidden: {message}")]
    Forbidden { message: String },
    #[error("invalid rating: {rating} is outside 1..=5")]
    InvalidRating { rating: u8 },
    #[error("persistence unavailable: {message}")]
    PersistenceUnavailable { message: String },
    #[error("{kind}: {message}")]
    InternalError { kind: &'static str, message: String },
    #[error("{message}")]
    Unknown { message: String },
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn unknown<S: Into<String>>(msg: S) -> Error {
        Error::Unknown {
            message: msg.into(),
        }
    }

    pub fn not_found<S: Into<String>>(msg: S) -> Error {
        Error::NotFound {
            message: msg.into(),
        }
    }

    pub fn invalid_transition<S: Into<String>>(msg: S) -> Error {
        Error::InvalidTransition {
            message: msg.into(),
        }
    }

    /// Mutations that return one of these left the state untouched.
    pub fn is_ignored(&self) -> bool {
        matches!(
            self,
            Error::NotFound { .. }
                | Error::InvalidTransition { .. }
                | Error::Forbidden { .. }
                | Error::InvalidRating { .. }
        )
    }
}

impl From<std::io::Error> for Error {
    fn from(io: std::io::Error) -> Self {
        Self::PersistenceUnavailable {
            message: io.to_string(),
        }
    }
}

impl From<postcard::Error> for Error {
    fn from(err: postcard::Error) -> Self {
        Self::InternalError {
            kind: "SerializationError",
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::InternalError {
            kind: "SerializationError",
            message: err.to_string(),
        }
    }
}

impl From<std::string::FromUtf8Error> for Error {
    fn from(err: std::string::FromUtf8Error) -> Self {
        Self::InternalError {
            kind: "EncodingError",
            message: err.to_string(),
        }
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Unknown {
            message: err.to_string(),
        }
    }
}
