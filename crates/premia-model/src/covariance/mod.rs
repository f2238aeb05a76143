//! Time-series covariance estimation
//!
//! Heteroskedasticity and autocorrelation consistent covariance of the
//! monthly Fama-MacBeth slopes, used for their standard errors.

pub mod newey_west;

pub use newey_west::{NeweyWestConfig, NeweyWestEstimator};

use thiserror::Error;

/// Errors that can occur during covariance estimation
#[derive(Debug, Error)]
pub enum CovarianceError {
    /// Insufficient data for estimation
    #[error("Insufficient data: need at least {required} observations, got {actual}")]
    InsufficientData {
        /// Required number of observations
        required: usize,
        /// Actual number of observations
        actual: usize,
    },

    /// Invalid parameter
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}
