use thiserror::Error;

/// Main error type for the bandit benchmark
#[derive(Error, Debug)]
pub enum BanditError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Frame export error: {0}")]
    Frame(#[from] polars::error::PolarsError),

    // Price file errors
    #[error("Malformed price file: {0}")]
    MalformedPriceFile(String),

    #[error("Truncated price file: expected {expected} prices, found {found}")]
    TruncatedPriceFile { expected: u64, found: u64 },

    // Input validation errors
    #[error("Invalid dimensions: {0}")]
    InvalidDimensions(String),

    #[error("Invalid parameter {name}: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("Series length mismatch: oracle has {oracle} rounds, policy has {policy}")]
    LengthMismatch { oracle: usize, policy: usize },

    #[error("Local-extrema oracle only supports a capacity of one held item, got {0}")]
    UnsupportedCapacity(u32),

    // Reporting errors
    #[error("Plot process failed: {0}")]
    Plot(String),
}

/// Result type alias for BanditError
pub type Result<T> = std::result::Result<T, BanditError>;
