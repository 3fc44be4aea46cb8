use crate::domain::error::FieldError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    /// The server answered 401; the session has already been cleared.
    #[error("{0}")]
    Unauthorized(String),
    #[error("{message}")]
    Api {
        status: u16,
        message: String,
        errors: Vec<FieldError>,
    },
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Session storage error: {0}")]
    Storage(String),
    /// A form action was requested with no form open; nothing was sent.
    #[error("No bookmark form is open")]
    NoOpenForm,
}

impl ClientError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ClientError::Unauthorized(_))
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Unauthorized(_) => Some(401),
            ClientError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// The message the server sent, if it sent one.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ClientError::Unauthorized(message) | ClientError::Api { message, .. }
                if !message.is_empty() =>
            {
                Some(message.as_str())
            }
            _ => None,
        }
    }
}

impl From<anyhow::Error> for ClientError {
    fn from(err: anyhow::Error) -> Self {
        ClientError::Storage(format!("{:#}", err))
    }
}
