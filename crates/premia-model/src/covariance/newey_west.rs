//! Newey-West HAC (Heteroskedasticity and Autocorrelation Consistent) Covariance Estimator
//!
//! Monthly Fama-MacBeth slopes are serially correlated, so their standard
//! errors are computed from the long-run covariance of the series rather than
//! the sample covariance. Lagged cross-products enter with Bartlett weights:
//! ```text
//! Σ_NW = Σ_0 + Σ_{l=1}^{L} w_l * (Σ_l + Σ_l^T)
//! where:
//! - Σ_0 = (1/T) Σ_t (r_t - μ)(r_t - μ)^T
//! - Σ_l = (1/T) Σ_{t=l+1}^T (r_t - μ)(r_{t-l} - μ)^T
//! - w_l = 1 - l/(L+1) (Bartlett kernel weights)
//! - L = fixed lag count, or ceil(4*(T/100)^(2/9)) when automatic
//! ```
//!
//! The standard error of a column mean is `sqrt(Σ_NW[k,k] / T)`, which is
//! exactly the HAC standard error of the constant in a regression of the
//! column on an intercept alone.
//!
//! # References
//! - Newey, W. K., & West, K. D. (1987). "A Simple, Positive Semi-Definite,
//!   Heteroskedasticity and Autocorrelation Consistent Covariance Matrix."
//!   Econometrica, 55(3), 703-708.

use super::CovarianceError;
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

/// Newey-West covariance estimator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NeweyWestConfig {
    /// Minimum number of time periods required (default: 2)
    pub min_observations: usize,

    /// Number of lags to use for HAC adjustment (default: 6).
    /// When None, uses ceil(4*(T/100)^(2/9)) as recommended by Newey-West
    pub lags: Option<usize>,
}

impl Default for NeweyWestConfig {
    fn default() -> Self {
        Self {
            min_observations: 2,
            lags: Some(6),
        }
    }
}

/// Newey-West HAC covariance estimator
#[derive(Debug, Default)]
pub struct NeweyWestEstimator {
    config: NeweyWestConfig,
}

impl NeweyWestEstimator {
    /// Create a new Newey-West estimator with the given configuration
    pub const fn new(config: NeweyWestConfig) -> Self {
        Self { config }
    }

    /// Configuration in use.
    pub const fn config(&self) -> &NeweyWestConfig {
        &self.config
    }

    /// Lag length for a series of `n_periods`
    ///
    /// Formula when automatic: L = ceil(4 * (T/100)^(2/9))
    fn optimal_lags(&self, n_periods: usize) -> usize {
        self.config.lags.unwrap_or_else(|| {
            let t = n_periods as f64;
            let lags = 4.0 * (t / 100.0).powf(2.0 / 9.0);
            lags.ceil() as usize
        })
    }

    /// Bartlett kernel weight: w_l = 1 - l/(L+1) for l = 1, ..., L
    fn bartlett_weight(&self, lag: usize, max_lag: usize) -> f64 {
        if lag == 0 {
            1.0
        } else if lag <= max_lag {
            1.0 - (lag as f64) / (max_lag as f64 + 1.0)
        } else {
            0.0
        }
    }

    /// (1/T) Σ_{t=l}^{T-1} d_t d_{t-l}^T over demeaned rows `d`
    fn lagged_covariance(&self, demeaned: &Array2<f64>, lag: usize) -> Array2<f64> {
        let n_periods = demeaned.nrows();
        let current = demeaned.slice(ndarray::s![lag.., ..]);
        let lagged = demeaned.slice(ndarray::s![..n_periods - lag, ..]);
        current.t().dot(&lagged) / n_periods as f64
    }

    /// HAC covariance of the columns of `series` (T x K, one row per period)
    pub fn estimate(&self, series: &Array2<f64>) -> Result<Array2<f64>, CovarianceError> {
        let (n_periods, n_columns) = series.dim();

        if n_periods < self.config.min_observations.max(2) {
            return Err(CovarianceError::InsufficientData {
                required: self.config.min_observations.max(2),
                actual: n_periods,
            });
        }
        if series.iter().any(|v| !v.is_finite()) {
            return Err(CovarianceError::InvalidParameter(
                "series contains non-finite values".to_string(),
            ));
        }

        // Never use more lags than there are periods
        let max_lag = self.optimal_lags(n_periods).min(n_periods - 1);

        let Some(means) = series.mean_axis(Axis(0)) else {
            return Err(CovarianceError::InsufficientData {
                required: 1,
                actual: 0,
            });
        };
        let demeaned = series - &means.insert_axis(Axis(0));

        let mut cov = self.lagged_covariance(&demeaned, 0);
        for lag in 1..=max_lag {
            let weight = self.bartlett_weight(lag, max_lag);
            let cov_lag = self.lagged_covariance(&demeaned, lag);
            for i in 0..n_columns {
                for j in 0..n_columns {
                    cov[[i, j]] += weight * (cov_lag[[i, j]] + cov_lag[[j, i]]);
                }
            }
        }

        Ok(cov)
    }

    /// HAC standard errors of the column means: sqrt(diag(Σ_NW) / T)
    pub fn standard_errors(&self, series: &Array2<f64>) -> Result<Array1<f64>, CovarianceError> {
        let n_periods = series.nrows() as f64;
        let cov = self.estimate(series)?;
        Ok(cov.diag().mapv(|v| (v.max(0.0) / n_periods).sqrt()))
    }
}
