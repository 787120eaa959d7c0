use thiserror::Error;

use lyceum_net::ApiError;
use lyceum_shared::ValidationError;

/// Step of the identity chain that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityStep {
    CurrentPrincipal,
    UserId,
    Username,
}

impl std::fmt::Display for IdentityStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::CurrentPrincipal => "current user lookup",
            Self::UserId => "user id lookup",
            Self::Username => "username lookup",
        })
    }
}

/// Errors surfaced by the messaging module.
#[derive(Error, Debug)]
pub enum ClientError {
    /// The session could not be tied to a user. Sticky for the session.
    #[error("Identity unavailable ({step}): {reason}")]
    IdentityUnavailable { step: IdentityStep, reason: String },

    #[error("Invalid message: {0}")]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Api(#[from] ApiError),

    /// Only teachers have classrooms to pick recipients from.
    #[error("The recipient directory is only available to teachers")]
    NotTeacher,

    /// The same action is already in flight.
    #[error("Request already in progress")]
    Busy,
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ClientError>;
