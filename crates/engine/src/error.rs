use thiserror::Error;
use xpress_datatypes::DatatypeError;

/// The engine's error domain. Every variant is terminal for the call that
/// raised it; the engine never retries and never swallows an error.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    /// Unexpected symbol, unclosed construct, or unrecognized character.
    /// Raised during parsing, always with a 1-based source position.
    #[error("syntax error at line {line}, column {column}: {message}")]
    Syntax {
        message: String,
        /// The offending symbol, when one is available.
        symbol: Option<String>,
        line: usize,
        column: usize,
    },

    /// Undefined symbol, variable or prefix reference.
    #[error("name error: {0}")]
    Name(String),

    /// Operand of the wrong kind for an operator or function.
    #[error("type error: {0}")]
    Type(String),

    /// A well-formed but semantically invalid literal.
    #[error("value error: {0}")]
    Value(String),

    /// The node model violated a structural invariant (not a tree).
    #[error("structure error: {0}")]
    Structure(String),
}

impl EngineError {
    pub fn name(message: impl Into<String>) -> Self {
        Self::Name(message.into())
    }

    pub fn type_error(message: impl Into<String>) -> Self {
        Self::Type(message.into())
    }

    pub fn value(message: impl Into<String>) -> Self {
        Self::Value(message.into())
    }

    pub fn structure(message: impl Into<String>) -> Self {
        Self::Structure(message.into())
    }
}

impl From<DatatypeError> for EngineError {
    fn from(err: DatatypeError) -> Self {
        Self::Value(err.to_string())
    }
}
