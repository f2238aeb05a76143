//! Rolling Volatility
//!
//! Standard deviation of daily excess returns over a trailing window that
//! ends the day before the observation. Daily returns are floored at -100%
//! before the window is applied.

use crate::error::{FactorError, Result};
use chrono::NaiveDate;
use polars::prelude::*;
use premia_data::{CrspRecord, DailyReturn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// Configuration for the RollingVolatility characteristic
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VolatilityConfig {
    /// Rolling window size in trading days (default: 60)
    pub window: usize,
    /// Minimum number of observations (default: 20)
    pub min_periods: usize,
    /// Oldest daily value, in calendar days, that may stand in for a monthly
    /// observation date (default: 31)
    pub max_staleness_days: i64,
}

impl Default for VolatilityConfig {
    fn default() -> Self {
        Self {
            window: 60,
            min_periods: 20,
            max_staleness_days: 31,
        }
    }
}

/// Daily volatility estimate for one security.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DailyVolatility {
    /// Trading day
    pub date: NaiveDate,
    /// Volatility known at the start of the day
    pub volatility: Option<f64>,
}

/// RollingVolatility computes trailing daily-return volatility per security
#[derive(Debug)]
pub struct RollingVolatility {
    config: VolatilityConfig,
}

impl RollingVolatility {
    /// Create the characteristic with the given configuration.
    pub const fn with_config(config: VolatilityConfig) -> Self {
        Self { config }
    }

    /// Configuration in use.
    pub const fn config(&self) -> &VolatilityConfig {
        &self.config
    }

    /// Characteristic name as used in regression output.
    pub const fn name(&self) -> &'static str {
        "volatility"
    }

    /// Daily volatility series per `permno`, each sorted by date.
    pub fn daily(&self, daily: &[DailyReturn]) -> Result<HashMap<i64, Vec<DailyVolatility>>> {
        let window = self.config.window;
        let min_periods = self.config.min_periods;
        if min_periods == 0 || min_periods > window {
            return Err(FactorError::InvalidParameter(format!(
                "volatility min_periods ({}) must be in 1..={}",
                min_periods, window
            )));
        }

        let mut sorted = daily.to_vec();
        sorted.sort_by_key(|d| (d.permno, d.date));

        let permnos: Vec<i64> = sorted.iter().map(|d| d.permno).collect();
        let returns: Vec<f64> = sorted.iter().map(|d| d.ret_excess.max(-1.0)).collect();

        let df = DataFrame::new(vec![
            Series::new("permno".into(), permnos).into(),
            Series::new("ret_excess".into(), returns).into(),
        ])?;

        // 1. Lag returns by one day within each security
        // 2. Rolling sample standard deviation of the lagged returns
        let result = df
            .lazy()
            .with_columns([col("ret_excess")
                .shift(lit(1))
                .over([col("permno")])
                .alias("lagged_ret_excess")])
            .with_columns([col("lagged_ret_excess")
                .rolling_std(RollingOptionsFixedWindow {
                    window_size: window,
                    min_periods,
                    ..Default::default()
                })
                .over([col("permno")])
                .alias("volatility")])
            .collect()?;

        let volatility = result.column("volatility")?.f64()?;

        let mut series: HashMap<i64, Vec<DailyVolatility>> = HashMap::new();
        for (d, vol) in sorted.iter().zip(volatility.into_iter()) {
            series.entry(d.permno).or_default().push(DailyVolatility {
                date: d.date,
                volatility: vol.filter(|v| v.is_finite()),
            });
        }

        debug!(
            securities = series.len(),
            days = sorted.len(),
            "computed rolling daily volatility"
        );
        Ok(series)
    }

    /// Fill `volatility` on monthly records from daily returns.
    ///
    /// Each record takes the latest daily estimate dated on or before its own
    /// date, provided it is at most `max_staleness_days` old.
    pub fn compute(&self, records: &mut [CrspRecord], daily: &[DailyReturn]) -> Result<()> {
        let series = self.daily(daily)?;
        let mut matched = 0usize;

        for record in records.iter_mut() {
            record.volatility = series.get(&record.permno).and_then(|days| {
                let pos = days.partition_point(|d| d.date <= record.date);
                let day = days.get(pos.checked_sub(1)?)?;
                let age = (record.date - day.date).num_days();
                if age > self.config.max_staleness_days {
                    return None;
                }
                day.volatility
            });
            if record.volatility.is_some() {
                matched += 1;
            }
        }

        debug!(
            records = records.len(),
            matched, "assigned monthly volatility"
        );
        Ok(())
    }
}

impl Default for RollingVolatility {
    fn default() -> Self {
        Self::with_config(VolatilityConfig::default())
    }
}
