//! Volatility factor-mimicking portfolio
//!
//! Each month, NYSE stocks set three breakpoints: the median market cap and
//! the 30th/70th percentiles of volatility. Every stock is placed in one of
//! six size/volatility portfolios:
//!
//! ```text
//!            vol <= p30   p30 < vol < p70   vol >= p70
//! small         S/L            S/M             S/H
//! big           B/L            B/M             B/H
//! ```
//!
//! and the factor is the average high-minus-low spread of the value-weighted
//! portfolio returns:
//!
//! ```text
//! VOL = 0.5 * ((S/H - S/L) + (B/H - B/L))
//! ```

use crate::error::{FactorError, Result};
use chrono::NaiveDate;
use polars::prelude::*;
use premia_data::{CrspRecord, Exchange, crsp_frame, date_column};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Configuration for the volatility factor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VolFactorConfig {
    /// Lower volatility percentile (default: 0.30)
    pub low: f64,
    /// Upper volatility percentile (default: 0.70)
    pub high: f64,
}

impl Default for VolFactorConfig {
    fn default() -> Self {
        Self {
            low: 0.30,
            high: 0.70,
        }
    }
}

/// Value-weighted return of one size/volatility portfolio in one month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioReturn {
    /// Month
    pub date: NaiveDate,
    /// Portfolio label, e.g. `S/H`
    pub portfolio: String,
    /// Value-weighted excess return
    pub vw_return: f64,
}

/// Volatility factor return for one month.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VolFactorReturn {
    /// Month
    pub date: NaiveDate,
    /// High-minus-low volatility return
    pub vol: f64,
}

/// Builds the volatility factor from a monthly panel
#[derive(Debug, Default)]
pub struct VolFactor {
    config: VolFactorConfig,
}

impl VolFactor {
    /// Create the factor with the given configuration.
    pub const fn with_config(config: VolFactorConfig) -> Self {
        Self { config }
    }

    /// Configuration in use.
    pub const fn config(&self) -> &VolFactorConfig {
        &self.config
    }

    /// Value-weighted returns of the six portfolios for every month.
    ///
    /// Months without NYSE market caps or NYSE volatilities have no
    /// breakpoints and are skipped.
    pub fn portfolio_returns(&self, records: &[CrspRecord]) -> Result<Vec<PortfolioReturn>> {
        let (low, high) = (self.config.low, self.config.high);
        if !(0.0 < low && low < high && high < 1.0) {
            return Err(FactorError::InvalidParameter(format!(
                "volatility breakpoints must satisfy 0 < low < high < 1, got {} and {}",
                low, high
            )));
        }

        let is_nyse = col("exchange").eq(lit(Exchange::Nyse.as_str()));

        // 1. Monthly NYSE breakpoints: median cap, low/high volatility
        // 2. Size and volatility buckets per stock
        // 3. Value-weighted return per month and portfolio
        let result = crsp_frame(records)?
            .lazy()
            .with_columns([
                when(is_nyse.clone())
                    .then(col("mktcap"))
                    .otherwise(lit(NULL))
                    .alias("nyse_mktcap"),
                when(is_nyse)
                    .then(col("volatility"))
                    .otherwise(lit(NULL))
                    .alias("nyse_volatility"),
            ])
            .with_columns([
                col("nyse_mktcap")
                    .quantile(lit(0.5), QuantileMethod::Linear)
                    .over([col("date")])
                    .alias("size_median"),
                col("nyse_volatility")
                    .quantile(lit(low), QuantileMethod::Linear)
                    .over([col("date")])
                    .alias("vol_low"),
                col("nyse_volatility")
                    .quantile(lit(high), QuantileMethod::Linear)
                    .over([col("date")])
                    .alias("vol_high"),
            ])
            .filter(
                col("size_median")
                    .is_not_null()
                    .and(col("vol_low").is_not_null())
                    .and(col("volatility").is_not_null())
                    .and(col("mktcap").gt(lit(0.0))),
            )
            .with_columns([
                when(col("mktcap").lt_eq(col("size_median")))
                    .then(lit("S"))
                    .otherwise(lit("B"))
                    .alias("size"),
                when(col("volatility").lt_eq(col("vol_low")))
                    .then(lit("L"))
                    .when(col("volatility").gt_eq(col("vol_high")))
                    .then(lit("H"))
                    .otherwise(lit("M"))
                    .alias("vol_bucket"),
                (col("mktcap") * col("ret_excess")).alias("weighted_ret"),
            ])
            .group_by([col("date"), col("size"), col("vol_bucket")])
            .agg([col("weighted_ret").sum(), col("mktcap").sum()])
            .with_columns([(col("weighted_ret") / col("mktcap")).alias("vw_return")])
            .sort(["date", "size", "vol_bucket"], Default::default())
            .collect()?;

        let dates = date_column(&result, "date")?;
        let sizes = result.column("size")?.str()?;
        let buckets = result.column("vol_bucket")?.str()?;
        let returns = result.column("vw_return")?.f64()?;

        let out: Vec<PortfolioReturn> = dates
            .into_iter()
            .zip(sizes.into_iter())
            .zip(buckets.into_iter())
            .zip(returns.into_iter())
            .filter_map(|(((date, size), bucket), vw_return)| {
                Some(PortfolioReturn {
                    date,
                    portfolio: format!("{}/{}", size?, bucket?),
                    vw_return: vw_return?,
                })
            })
            .collect();

        debug!(portfolios = out.len(), "computed volatility portfolio returns");
        Ok(out)
    }

    /// Monthly factor returns; months missing any of the four corner
    /// portfolios are dropped.
    pub fn compute(&self, records: &[CrspRecord]) -> Result<Vec<VolFactorReturn>> {
        let portfolios = self.portfolio_returns(records)?;

        let mut by_month: BTreeMap<NaiveDate, BTreeMap<&str, f64>> = BTreeMap::new();
        for p in &portfolios {
            by_month
                .entry(p.date)
                .or_default()
                .insert(p.portfolio.as_str(), p.vw_return);
        }

        let factor: Vec<VolFactorReturn> = by_month
            .into_iter()
            .filter_map(|(date, legs)| {
                let s_h = legs.get("S/H")?;
                let s_l = legs.get("S/L")?;
                let b_h = legs.get("B/H")?;
                let b_l = legs.get("B/L")?;
                Some(VolFactorReturn {
                    date,
                    vol: 0.5 * ((s_h - s_l) + (b_h - b_l)),
                })
            })
            .collect();

        if factor.is_empty() {
            return Err(FactorError::InsufficientData(
                "no month has all four corner volatility portfolios".to_string(),
            ));
        }
        debug!(months = factor.len(), "built volatility factor");
        Ok(factor)
    }
}
