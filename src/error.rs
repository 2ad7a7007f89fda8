//! Errors that can happen while fetching, storing or decoding portal data

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PortalError {
    /// Credentials are incomplete. The user must sign in again, retrying is pointless
    #[error("Unable to sign request: {0}")]
    Signing(String),

    /// Network, DNS or timeout failure. Reported with a status code of `-1`
    #[error("Transport error: {0}")]
    Transport(String),

    /// The server answered with something else than `200 OK`
    #[error("Unexpected HTTP status code {0}")]
    HttpStatus(u16),

    #[error("Malformed {resource} payload: {reason}")]
    MalformedPayload { resource: String, reason: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PortalError {
    pub fn malformed<R: ToString, S: ToString>(resource: R, reason: S) -> Self {
        Self::MalformedPayload {
            resource: resource.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Whether a later attempt may succeed without any user action
    pub fn is_retryable(&self) -> bool {
        match self {
            PortalError::Transport(_) | PortalError::HttpStatus(_) => true,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for PortalError {
    fn from(err: reqwest::Error) -> Self {
        PortalError::Transport(err.to_string())
    }
}

impl From<url::ParseError> for PortalError {
    fn from(err: url::ParseError) -> Self {
        PortalError::Transport(format!("invalid URL: {}", err))
    }
}

pub type Result<T> = std::result::Result<T, PortalError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signing_errors_are_not_retryable() {
        assert_eq!(PortalError::Signing("no token".into()).is_retryable(), false);
        assert!(PortalError::Transport("timed out".into()).is_retryable());
        assert!(PortalError::HttpStatus(503).is_retryable());
    }

    #[test]
    fn malformed_message() {
        let err = PortalError::malformed("avisos.json", "expected an object");
        assert_eq!(err.to_string(), "Malformed avisos.json payload: expected an object");
    }
}
