//! Model errors

use crate::covariance::CovarianceError;
use crate::regression::RegressionError;
use premia_data::DataError;
use premia_factors::FactorError;
use thiserror::Error;

/// Errors raised while preparing the panel or estimating premia
#[derive(Debug, Error)]
pub enum ModelError {
    /// Cross-sectional regression failure
    #[error("Regression error: {0}")]
    Regression(#[from] RegressionError),

    /// Newey-West estimation failure
    #[error("Covariance error: {0}")]
    Covariance(#[from] CovarianceError),

    /// Data access failure
    #[error("Data error: {0}")]
    Data(#[from] DataError),

    /// Characteristic computation failure
    #[error("Factor error: {0}")]
    Factor(#[from] FactorError),

    /// DataFrame failure
    #[error("Polars error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),

    /// Invalid configuration value
    #[error("{0}")]
    InvalidParameter(String),

    /// Nothing left to estimate
    #[error("Insufficient data: {0}")]
    InsufficientData(String),
}

/// Result alias for model operations
pub type Result<T> = std::result::Result<T, ModelError>;
