use polars::prelude::PolarsError;
use thiserror::Error;

/// Errors raised while loading transactions or computing aggregates.
#[derive(Error, Debug)]
pub enum SalesError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Polars error: {0}")]
    Polars(#[from] PolarsError),

    #[error("Required column not found: {0}")]
    MissingColumn(String),

    #[error("Grouping key not found in table: {0}")]
    InvalidKey(String),

    #[error("Cannot aggregate an empty table")]
    EmptyInput,

    #[error("Invalid aggregation: {0}")]
    InvalidAggregation(String),

    #[error("Unsupported file type: {0}")]
    UnsupportedFile(String),
}

impl SalesError {
    /// True for errors that make the input unusable (the dashboard cannot start).
    pub fn is_startup(&self) -> bool {
        matches!(
            self,
            Self::Io(_)
                | Self::Polars(_)
                | Self::MissingColumn(_)
                | Self::InvalidAggregation(_)
                | Self::UnsupportedFile(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, SalesError>;
