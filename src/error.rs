//! Error taxonomy shared by the model, the parsers and the serializer.

use thiserror::Error;

use crate::model::BoundaryKind;

pub type Result<T> = std::result::Result<T, FesError>;

#[derive(Debug, Error)]
pub enum FesError {
    /// A field value was rejected by one of its validators.
    #[error("validation error: {0}")]
    Validation(String),

    /// A slot was offered a node of the wrong kind.
    #[error("invalid expression: {0}")]
    InvalidExpression(String),

    /// Unrecognized operator name or malformed predicate.
    #[error("invalid operator: {0}")]
    InvalidOperator(String),

    #[error("invalid match action: {0:?}")]
    InvalidMatchAction(String),

    #[error("invalid boundary type: expected {expected} boundary, got {found}")]
    InvalidBoundaryType {
        expected: BoundaryKind,
        found: BoundaryKind,
    },

    #[error("document is invalid against schema {schema}: {reason}")]
    SchemaValidation { schema: String, reason: String },

    /// The input is not written in the syntax the parser handles.
    #[error("{syntax}: input is not in this syntax: {reason}")]
    SyntaxMismatch {
        syntax: &'static str,
        reason: String,
    },

    #[error("parse error: {0}")]
    Parse(String),

    #[error("unsupported feature: {0}")]
    Unsupported(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl FesError {
    /// True when a dispatcher may move on to the next registered syntax.
    pub fn is_syntax_mismatch(&self) -> bool {
        matches!(self, FesError::SyntaxMismatch { .. })
    }

    pub(crate) fn parse(message: impl Into<String>) -> Self {
        FesError::Parse(message.into())
    }

    pub(crate) fn validation(message: impl Into<String>) -> Self {
        FesError::Validation(message.into())
    }
}

impl From<config::ConfigError> for FesError {
    fn from(err: config::ConfigError) -> Self {
        FesError::Config(err.to_string())
    }
}
