//! Error types for characteristic construction.

use thiserror::Error;

/// Result type for characteristic construction.
pub type Result<T> = std::result::Result<T, FactorError>;

/// Errors that can occur while building characteristics or factor portfolios.
#[derive(Debug, Error)]
pub enum FactorError {
    /// Not enough observations to compute the quantity
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    /// Invalid configuration parameter
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Polars error
    #[error("Polars error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),

    /// Data error
    #[error("Data error: {0}")]
    Data(#[from] premia_data::DataError),
}
