use thiserror::Error;

/// Application-specific errors for the CLI
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Missing required argument: {arg}")]
    MissingArgument { arg: String },

    #[error("No raster files found in {path}")]
    NoInputs { path: String },

    #[error("{failed} of {attempted} file(s) failed")]
    BatchFailed { failed: usize, attempted: usize },

    #[error(transparent)]
    Wxramp(#[from] wxramp::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
