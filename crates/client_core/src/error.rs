use shared::error::ApiError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid api url: {0}")]
    Url(#[from] url::ParseError),
    #[error("api base url cannot carry path segments: {0}")]
    CannotBeABase(String),
    #[error("http transport error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("api returned {status}: {error}")]
    Status { status: u16, error: ApiError },
}

impl ClientError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Status { status, .. } => Some(*status),
            ClientError::Http(err) => err.status().map(|status| status.as_u16()),
            _ => None,
        }
    }

    pub fn requires_reauth(&self) -> bool {
        match self {
            ClientError::Status { error, .. } => error.requires_reauth(),
            _ => self.status() == Some(401),
        }
    }

    /// Transport-level failures the user can fix by checking their connection.
    pub fn is_network(&self) -> bool {
        match self {
            ClientError::Http(err) => err.is_connect() || err.is_timeout() || err.is_request(),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
