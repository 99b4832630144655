//! Teams hand-off: refresh a Graph token and post a mention message to a channel.

pub mod auth;
pub mod send;

pub use auth::{refresh_access_token, AccessToken, GraphCredentials, GRAPH_SCOPE};
pub use send::{render_message, TeamsClient, TeamsSendReceipt, TeamsSendRequest};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TeamsError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("Teams send failed ({status} {code}): {message}")]
    SendFailed {
        status: u16,
        code: String,
        message: String,
    },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
}

impl TeamsError {
    /// Stable machine-readable category.
    pub fn kind(&self) -> &'static str {
        match self {
            TeamsError::Validation(_) => "validation_error",
            TeamsError::AuthenticationFailed(_) => "authentication_failed",
            TeamsError::Configuration(_) => "configuration_error",
            TeamsError::SendFailed { .. } => "teams_send_failed",
            TeamsError::Http(_) => "internal_server_error",
        }
    }

    /// HTTP-style status for callers that relay the failure.
    pub fn status(&self) -> u16 {
        match self {
            TeamsError::Validation(_) => 400,
            TeamsError::AuthenticationFailed(_) => 401,
            TeamsError::SendFailed { status, .. } => *status,
            TeamsError::Configuration(_) | TeamsError::Http(_) => 500,
        }
    }
}
