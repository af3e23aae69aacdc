//! Module defining the errors which are exposed to the users of the crate

use crate::domain::{Money, UserId};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The caller is not a known user
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Known caller lacking the role or ownership the operation requires, or a blocked user moving money
    #[error("forbidden — user: {user}: {message}")]
    Forbidden { user: UserId, message: String },

    /// A referenced user, item, booking, complaint or deposit request does not exist
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: u32 },

    /// The operation is not valid from the current status (double accept, double pay, double rollback, ...)
    #[error("conflicting state — {entity} {id} is {status}: {message}")]
    ConflictingState {
        entity: &'static str,
        id: u32,
        status: String,
        message: String,
    },

    /// Balance guard failure
    #[error(
        "insufficient funds — user: {user}: requires {required}, available {available}, short by {shortfall}"
    )]
    InsufficientFunds {
        user: UserId,
        required: Money,
        available: Money,
        shortfall: Money,
    },

    /// Malformed input, e.g. a non-positive fine
    #[error("validation error: {0}")]
    Validation(String),

    /// Unexpected failure of the backing store
    #[error("storage error: {0}")]
    Storage(String),

    /// Invalid CSV in a replayed command log
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

pub(crate) fn forbidden(user: UserId, message: impl Into<String>) -> Error {
    Error::Forbidden {
        user,
        message: message.into(),
    }
}

pub(crate) fn not_found(entity: &'static str, id: impl Into<u32>) -> Error {
    Error::NotFound {
        entity,
        id: id.into(),
    }
}

pub(crate) fn conflicting_state(
    entity: &'static str,
    id: impl Into<u32>,
    status: impl ToString,
    message: impl Into<String>,
) -> Error {
    Error::ConflictingState {
        entity,
        id: id.into(),
        status: status.to_string(),
        message: message.into(),
    }
}

pub(crate) fn insufficient_funds(user: UserId, required: Money, available: Money) -> Error {
    Error::InsufficientFunds {
        user,
        required,
        available,
        shortfall: required - available,
    }
}

pub(crate) fn validation_error(message: impl Into<String>) -> Error {
    Error::Validation(message.into())
}
