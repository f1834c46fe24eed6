//! Client-side session handling: an HTTP binding for the auth API, durable
//! token storage, and the session holder that ties them together.

pub mod api;
pub mod session;
pub mod storage;

pub use api::{AuthApi, HttpAuthApi};
pub use session::SessionHolder;
pub use storage::{FileTokenStorage, MemoryTokenStorage, TokenStorage};

use thiserror::Error;

pub type ClientResult<T> = Result<T, ClientError>;

/// Default API base, matching the server's mount point.
pub const DEFAULT_API_URL: &str = "http://localhost:5000/api/auth";

/// Name the token is persisted under.
pub const TOKEN_STORAGE_KEY: &str = "authToken";

#[derive(Debug, Error)]
pub enum ClientError {
    /// The server answered with an error envelope.
    #[error("{message}")]
    Api { status: u16, message: String },
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("token storage error: {0}")]
    Storage(#[from] std::io::Error),
    #[error("not authenticated")]
    NotAuthenticated,
}

impl ClientError {
    /// Message the server sent, if the failure came from an error envelope.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ClientError::Api { message, .. } => Some(message),
            _ => None,
        }
    }
}
