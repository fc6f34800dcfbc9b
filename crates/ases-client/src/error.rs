use crate::store::StoreError;

/// Errors surfaced to the caller of the client.
///
/// `Api` carries the server's `{kind, message}` verbatim; its `Display` is the
/// message alone so it can be shown to the user as-is.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("{message}")]
    Api {
        status: u16,
        kind: String,
        message: String,
    },
    #[error("network error: {0}")]
    Network(String),
    #[error("unexpected response: {0}")]
    Decode(String),
    /// Rejected before any network call.
    #[error("{0}")]
    Local(&'static str),
    #[error("Please wait {remaining_secs} seconds before requesting a new OTP")]
    Cooldown { remaining_secs: u64 },
    #[error("{action} is not available in the current session state")]
    InvalidState { action: &'static str },
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ClientError {
    pub fn network(err: reqwest::Error) -> Self {
        Self::Network(err.to_string())
    }

    /// Stable server error kind, when the error came from the server.
    pub fn kind(&self) -> Option<&str> {
        match self {
            Self::Api { kind, .. } => Some(kind),
            _ => None,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_invalid_token(&self) -> bool {
        self.kind() == Some("INVALID_TOKEN")
    }
}
