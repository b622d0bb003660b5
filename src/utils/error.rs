use thiserror::Error;

/// Main error type for the zap command surface
#[derive(Debug, Error)]
pub enum ZapError {
    #[error("{0}")]
    Cli(#[from] clap::Error),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Output error: {0}")]
    Output(#[from] std::io::Error),
}

impl ZapError {
    /// True when the error came from argument parsing rather than a handler
    pub fn is_parse_error(&self) -> bool {
        matches!(self, ZapError::Cli(_))
    }
}

/// Result type alias for zap operations
pub type ZapResult<T> = Result<T, ZapError>;
