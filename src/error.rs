// File: src/error.rs
//! Error taxonomy shared by the tree index, the projection models and the
//! file loaders around them.

use crate::core::types::LanguagePair;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProjectionError {
    /// Malformed Newick text. `offset` is a char offset into the input.
    #[error("Newick parse error at offset {offset}: {message}")]
    Parse { offset: usize, message: String },

    /// A language or node name that the tree (or learner) does not know.
    #[error("Not found: {name}")]
    NotFound { name: String },

    /// Sampling was requested from a model without any observation weight.
    #[error("Cannot sample from empty model for {pair}")]
    EmptyModel { pair: LanguagePair },

    /// Stability is undefined when the total observation weight is zero.
    #[error("Stability undefined for {pair}: total weight is zero")]
    DivideByZero { pair: LanguagePair },

    /// An operation that needs pruned tables ran before `finalize`.
    #[error("Model for {pair} has not been finalized")]
    NotFinalized { pair: LanguagePair },

    /// Warning-level: a symbol has no entry in a sound-class map.
    #[error("No sound class defined for '{symbol}'")]
    UnresolvedClass { symbol: String },

    /// Malformed line in a tab-separated input file.
    #[error("Invalid data at line {line}: {message}")]
    InvalidData { line: usize, message: String },

    /// Invalid command-line configuration.
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ProjectionError>;

impl ProjectionError {
    pub fn parse(offset: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            offset,
            message: message.into(),
        }
    }

    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound { name: name.into() }
    }

    pub fn invalid_data(line: usize, message: impl Into<String>) -> Self {
        Self::InvalidData {
            line,
            message: message.into(),
        }
    }
}
