//! Crate-level error type and `Result` alias.
//! Configuration problems are fatal to a run; every other variant describes a
//! per-file failure that the batch runner records and moves past.
use thiserror::Error;

use crate::io::ReliefError;
use crate::types::Stage;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unknown variable: {0}")]
    UnknownVariable(String),

    #[error("Unknown color ramp: {0}")]
    UnknownRamp(String),

    #[error("Cannot infer variable name from {file}; pass --variable to override")]
    VariableInference { file: String },

    #[error("Colorization failed: {0}")]
    Colorization(#[source] ReliefError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Overview generation failed: {0}")]
    Finish(#[source] ReliefError),
}

impl Error {
    pub fn config<E: std::fmt::Display>(e: E) -> Self {
        Error::Config(e.to_string())
    }

    /// Only configuration errors abort a whole invocation.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::Config(_))
    }

    /// Pipeline stage the error naturally belongs to, if any.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Error::Config(_) => None,
            Error::UnknownVariable(_) | Error::VariableInference { .. } => Some(Stage::Resolve),
            Error::UnknownRamp(_) => Some(Stage::Compile),
            Error::Colorization(_) => Some(Stage::Colorize),
            Error::Io(_) | Error::Finish(_) => Some(Stage::Finish),
        }
    }
}
