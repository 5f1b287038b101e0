use serde::Serialize;
use thiserror::Error;

use crate::dsl::token::Token;
use crate::registry::Domain;

/// A recoverable, user-facing evaluation failure. Carries the offending
/// token where there is one, so a front end can point at the span.
#[derive(Debug, Clone, Error, Serialize)]
#[serde(tag = "code", content = "detail")]
pub enum CommandError {
    #[error("Unknown variable '{}'", .token.lexeme.value)]
    UnknownVariable { token: Token },
    #[error("Unknown global '{}'", .token.lexeme.value)]
    UnknownGlobal { token: Token },
    #[error("Unknown command '{}'", .token.lexeme.value)]
    UnknownCommand { token: Token },
    #[error("Expected {expected} parameters '{}'", .token.lexeme.value)]
    ExpectedParameters { expected: usize, token: Token },
    #[error("Invalid value for parameter {parameter}: expected {expected_type} '{}'", .token.lexeme.value)]
    InvalidParameter {
        parameter: String,
        expected_type: String,
        token: Token,
    },
    #[error("Expected target '{}'", .token.lexeme.value)]
    ExpectedTarget { token: Token },
    #[error("Invalid target: expected {expected_type} '{}'", .token.lexeme.value)]
    InvalidTarget { expected_type: String, token: Token },
    #[error("Unexpected token '{}'", .token.lexeme.value)]
    UnexpectedToken { token: Token },
    /// The expression did not reduce to a single value, or its brackets do not balance.
    #[error("Invalid command")]
    InvalidCommand,
    #[error("Command registry is not ready")]
    NotReady,
    /// A built-in command rejected its operands.
    #[error("{message} '{}'", .token.lexeme.value)]
    Operation { message: String, token: Token },
}

impl CommandError {
    pub fn token(&self) -> Option<&Token> {
        match self {
            Self::UnknownVariable { token }
            | Self::UnknownGlobal { token }
            | Self::UnknownCommand { token }
            | Self::ExpectedParameters { token, .. }
            | Self::InvalidParameter { token, .. }
            | Self::ExpectedTarget { token }
            | Self::InvalidTarget { token, .. }
            | Self::UnexpectedToken { token }
            | Self::Operation { token, .. } => Some(token),
            Self::InvalidCommand | Self::NotReady => None,
        }
    }
}

/// Failures while populating the registry.
#[derive(Debug, Clone, Error, Serialize)]
#[serde(tag = "code", content = "detail")]
pub enum RegistryError {
    #[error("{domain:?} already contains '{name}'")]
    Duplicate { domain: Domain, name: String },
    #[error("Unknown type '{name}'")]
    UnknownType { name: String },
    #[error("Loader failed: {message}")]
    Load { message: String },
    #[error("Discovery task failed: {message}")]
    Discovery { message: String },
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
