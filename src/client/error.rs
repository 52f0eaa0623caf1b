//! Client-side error taxonomy. Every `ApiClient` call returns one of these instead of panicking.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    /// No HTTP response was obtained (connect failure, timeout, TLS).
    #[error("network error: {0}")]
    Network(#[source] reqwest::Error),
    /// The server answered with a non-success status.
    #[error("{message} (HTTP {status})")]
    Api { status: u16, code: String, message: String },
    #[error("unexpected response body: {0}")]
    Decode(String),
    /// Rejected locally; no request was sent.
    #[error("{0}")]
    Validation(String),
    #[error("not signed in")]
    NotSignedIn,
}

impl ClientError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }

    pub fn is_conflict(&self) -> bool {
        self.status() == Some(409)
    }

    /// Short text suitable for showing to the user.
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Api { message, .. } => message.clone(),
            ClientError::Network(_) => "Could not reach the server. Check your connection.".into(),
            other => other.to_string(),
        }
    }
}
