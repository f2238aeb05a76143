//! 12-1 Momentum
//!
//! For the i-th monthly observation of a security (in date order) the
//! characteristic is the compounded excess return of observations
//! `i - lookback .. i - skip`:
//!
//! ```text
//! MOM_i = prod_{k = i-12}^{i-2} (1 + r_k) - 1
//! ```
//!
//! Observations are counted by position within the security's history, so
//! gaps in the monthly series are not filled. Returns below -100% are floored
//! at -100%, so a wiped-out month pins the characteristic at -1.

use crate::error::{FactorError, Result};
use polars::prelude::*;
use premia_data::{CrspRecord, crsp_frame};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Configuration for the Momentum characteristic
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MomentumConfig {
    /// Number of months back where the window starts (default: 12)
    pub lookback: usize,
    /// Most recent months excluded from the window (default: 1)
    pub skip: usize,
}

impl Default for MomentumConfig {
    fn default() -> Self {
        Self {
            lookback: 12,
            skip: 1,
        }
    }
}

/// Momentum computes compounded past excess returns per security
#[derive(Debug)]
pub struct Momentum {
    config: MomentumConfig,
}

impl Momentum {
    /// Create the characteristic with the given configuration.
    pub const fn with_config(config: MomentumConfig) -> Self {
        Self { config }
    }

    /// Configuration in use.
    pub const fn config(&self) -> &MomentumConfig {
        &self.config
    }

    /// Characteristic name as used in regression output.
    pub const fn name(&self) -> &'static str {
        "momentum"
    }

    /// Fill `momentum` on every record, grouping by `permno` in date order.
    pub fn compute(&self, records: &mut [CrspRecord]) -> Result<()> {
        let MomentumConfig { lookback, skip } = self.config;
        if skip >= lookback {
            return Err(FactorError::InvalidParameter(format!(
                "momentum skip ({}) must be smaller than lookback ({})",
                skip, lookback
            )));
        }
        if records.is_empty() {
            return Ok(());
        }
        let window = lookback - skip;

        // 1. Log gross returns, floored at -100%
        // 2. Lag by skip + 1 months within each security
        // 3. Rolling sum over the window, compounded back
        let result = crsp_frame(records)?
            .lazy()
            .with_row_index("row", None)
            .sort(["permno", "date"], Default::default())
            .with_columns([when(col("ret_excess").lt(lit(-1.0)))
                .then(lit(-1.0))
                .otherwise(col("ret_excess"))
                .log1p()
                .alias("log_ret")])
            .with_columns([col("log_ret")
                .shift(lit((skip + 1) as i64))
                .over([col("permno")])
                .alias("lagged_log_ret")])
            .with_columns([(col("lagged_log_ret")
                .rolling_sum(RollingOptionsFixedWindow {
                    window_size: window,
                    min_periods: window,
                    ..Default::default()
                })
                .over([col("permno")])
                .exp()
                - lit(1.0))
                .alias("momentum")])
            .select([col("row").cast(DataType::Int64), col("momentum")])
            .collect()?;

        let rows = result.column("row")?.i64()?;
        let momentum = result.column("momentum")?.f64()?;

        let mut filled = 0usize;
        for (row, value) in rows.into_iter().zip(momentum.into_iter()) {
            let Some(row) = row else { continue };
            let value = value.filter(|v| v.is_finite());
            filled += usize::from(value.is_some());
            records[row as usize].momentum = value;
        }

        debug!(records = records.len(), filled, "computed momentum");
        Ok(())
    }
}

impl Default for Momentum {
    fn default() -> Self {
        Self::with_config(MomentumConfig::default())
    }
}
