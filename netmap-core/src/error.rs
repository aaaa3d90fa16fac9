use thiserror::Error;

/// Errors raised by the IP/CIDR primitives, the entity store and the
/// topology/routing services.
///
/// Routing-specific outcomes that are part of a `RoutingResult` (no route,
/// routing loop) are represented as `RoutingStatus::Error` variants (see
/// [`crate::routing`]) rather than as this `Error`, since they are expected
/// results of a query, not failures of the call itself.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("malformed IP or CIDR literal: `{0}`")]
    Format(String),

    #[error("validation failed on `{field}`: {message}")]
    Validation { field: String, message: String },

    #[error("{0} not found")]
    NotFound(String),
}

impl Error {
    pub fn format(literal: impl Into<String>) -> Self {
        Error::Format(literal.into())
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Error::NotFound(what.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
