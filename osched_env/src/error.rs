//! Error types for the service abstraction.

use crate::types::Domain;
use thiserror::Error;

/// Errors that can occur while talking to the computation service.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ServiceError {
    /// Service unreachable, connection reset, TLS failure, etc.
    #[error("Transport error: {0}")]
    Transport(String),

    /// No response within the client-side ceiling
    #[error("Timeout after {0}ms")]
    Timeout(u64),

    /// Non-2xx response, with the server's detail message when it sent one
    #[error("Service rejected request ({status}): {}", .detail.as_deref().unwrap_or("no detail"))]
    Rejected { status: u16, detail: Option<String> },

    /// 2xx response whose body is not the expected payload
    #[error("Decode error: {0}")]
    Decode(String),
}

impl ServiceError {
    /// Creates a transport error.
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Creates a decode error.
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Creates a rejection carrying a server-supplied detail message.
    pub fn rejected(status: u16, detail: impl Into<String>) -> Self {
        Self::Rejected {
            status,
            detail: Some(detail.into()),
        }
    }

    /// Returns the single human-readable line shown to the user.
    ///
    /// The server's detail wins when present; everything else collapses to
    /// a generic per-domain failure message.
    pub fn user_message(&self, domain: Domain) -> String {
        match self {
            Self::Rejected {
                detail: Some(detail),
                ..
            } if !detail.trim().is_empty() => detail.clone(),
            _ => format!("{} simulation failed", domain.label()),
        }
    }
}
