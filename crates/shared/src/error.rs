use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::ProductId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Network,
    NotFound,
    Server,
}

/// Failure of a single request against the remote product collection.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    #[error("network error: {0}")]
    Network(String),
    #[error("product {0} not found")]
    NotFound(ProductId),
    #[error("server returned {status}: {message}")]
    Server { status: u16, message: String },
    #[error("invalid response payload: {0}")]
    InvalidResponse(String),
}

impl GatewayError {
    pub fn server(status: u16, message: impl Into<String>) -> Self {
        Self::Server {
            status,
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Network(_) => ErrorKind::Network,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Server { .. } | Self::InvalidResponse(_) => ErrorKind::Server,
        }
    }

    pub fn user_message(&self) -> String {
        match self.kind() {
            ErrorKind::Network => {
                "Unable to reach the product service; check your connection and retry.".to_string()
            }
            ErrorKind::NotFound => "The product no longer exists.".to_string(),
            ErrorKind::Server => "The product service rejected the request.".to_string(),
        }
    }
}
