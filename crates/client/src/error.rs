//! Error classification for the data layer.
//!
//! [`RemoteError::is_transport`] is the only place that decides whether a
//! failed call may be served from the local store.

use thiserror::Error;

use formadmin_core::DomainError;

/// HTTP statuses treated as a well-formed rejection of the request itself.
pub const REJECTION_STATUSES: &[u16] = &[400, 401, 403, 409, 422];

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RemoteError {
    /// The request never got an HTTP answer (connect failure, timeout, reset).
    #[error("network error: {0}")]
    Network(String),

    /// The server answered with a status that says nothing about the request
    /// (5xx, missing endpoint, throttling).
    #[error("server unavailable ({status}): {message}")]
    Unavailable { status: u16, message: String },

    /// The server rejected the request (validation, credentials, conflict).
    #[error("rejected by server ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// A 2xx answer whose body did not have the expected shape (or could
    /// not be read).
    #[error("invalid response: {0}")]
    Decode(String),

    /// The request could not be built locally (bad base URL, client setup).
    #[error("client configuration error: {0}")]
    Config(String),
}

impl RemoteError {
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        if REJECTION_STATUSES.contains(&status) {
            Self::Rejected { status, message }
        } else {
            Self::Unavailable { status, message }
        }
    }

    /// Whether the local-store fallback may take over.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Unavailable { .. })
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Unavailable { status, .. } | Self::Rejected { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Error surfaced to callers of the repositories and services.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ShimError {
    /// Irrecoverable remote failure (rejection or malformed answer).
    #[error(transparent)]
    Remote(#[from] RemoteError),

    /// Local-store failure after fallback (not found, invalid input).
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("no active session")]
    Unauthenticated,

    #[error("invalid credentials")]
    InvalidCredentials,

    /// Authentication succeeded but the role is outside the synonym table.
    #[error("unrecognized role '{0}'")]
    UnrecognizedRole(String),

    #[error("demo mode is disabled")]
    DemoModeDisabled,

    #[error("session storage error: {0}")]
    Storage(String),
}

impl ShimError {
    pub fn storage(err: anyhow::Error) -> Self {
        Self::Storage(format!("{err:#}"))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Domain(DomainError::NotFound { .. }))
    }

    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::Remote(RemoteError::Rejected { .. }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_statuses() {
        assert!(!RemoteError::from_status(422, "name is required").is_transport());
        assert!(!RemoteError::from_status(400, "bad").is_transport());
        assert!(!RemoteError::from_status(401, "expired").is_transport());
        assert!(RemoteError::from_status(500, "boom").is_transport());
        assert!(RemoteError::from_status(503, "maintenance").is_transport());
        assert!(RemoteError::from_status(404, "no such endpoint").is_transport());
        assert!(RemoteError::Network("connection refused".into()).is_transport());
        assert!(!RemoteError::Decode("expected array".into()).is_transport());
        assert!(!RemoteError::Config("invalid URL".into()).is_transport());
    }

    #[test]
    fn exposes_status() {
        assert_eq!(RemoteError::from_status(422, "x").status(), Some(422));
        assert_eq!(RemoteError::Network("x".into()).status(), None);
    }
}
