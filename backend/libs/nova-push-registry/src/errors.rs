use thiserror::Error;

/// Push registry client error types
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistrationError {
    #[error("Missing client configuration: {0}")]
    MissingConfiguration(&'static str),

    #[error("Invalid push server URL: {0}")]
    InvalidUrl(String),

    #[error("Missing device token")]
    MissingDeviceToken,

    #[error("problem with request: {0}")]
    Transport(String),

    #[error("Push server responded with status: {0}")]
    Server(u16),

    #[error("Failed to serialize device metadata: {0}")]
    Serialization(String),

    #[error("No Tokio runtime available to dispatch the request")]
    RuntimeUnavailable,
}

impl RegistrationError {
    /// HTTP status code carried by a server rejection
    pub fn status_code(&self) -> Option<u16> {
        match self {
            RegistrationError::Server(status) => Some(*status),
            _ => None,
        }
    }
}

impl From<RegistrationError> for String {
    fn from(err: RegistrationError) -> Self {
        err.to_string()
    }
}

/// Raw failure reported by an [`HttpTransport`](crate::transport::HttpTransport)
/// before a response could be read (refused connection, DNS, reset).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct TransportError(pub String);

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        Self(err.to_string())
    }
}

impl From<TransportError> for RegistrationError {
    fn from(err: TransportError) -> Self {
        RegistrationError::Transport(err.0)
    }
}
