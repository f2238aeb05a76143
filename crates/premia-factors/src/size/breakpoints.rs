//! NYSE size breakpoints
//!
//! Stocks are bucketed by comparing their market cap against percentiles of
//! the NYSE market-cap distribution pooled over the whole sample:
//! at or above the upper percentile is `Large`, at or above the lower
//! percentile is `Small`, everything else is `Micro`.

use crate::error::{FactorError, Result};
use polars::prelude::*;
use premia_data::{CrspRecord, Exchange, SizeCategory, crsp_frame};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Percentiles used for the size buckets.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SizeBreakpoints {
    /// Lower percentile separating Micro from Small (default: 0.30)
    pub small: f64,
    /// Upper percentile separating Small from Large (default: 0.70)
    pub large: f64,
}

impl Default for SizeBreakpoints {
    fn default() -> Self {
        Self {
            small: 0.30,
            large: 0.70,
        }
    }
}

/// Market-cap thresholds resolved from a sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SizeThresholds {
    /// Market cap at the lower percentile
    pub small: f64,
    /// Market cap at the upper percentile
    pub large: f64,
}

impl SizeThresholds {
    /// Bucket a single market cap.
    pub fn classify(&self, mktcap: f64) -> SizeCategory {
        if mktcap >= self.large {
            SizeCategory::Large
        } else if mktcap >= self.small {
            SizeCategory::Small
        } else {
            SizeCategory::Micro
        }
    }
}

impl SizeBreakpoints {
    /// Validate the percentile pair.
    pub fn validate(&self) -> Result<()> {
        if !(0.0 < self.small && self.small < self.large && self.large < 1.0) {
            return Err(FactorError::InvalidParameter(format!(
                "size breakpoints must satisfy 0 < small < large < 1, got {} and {}",
                self.small, self.large
            )));
        }
        Ok(())
    }

    /// Resolve thresholds from the NYSE rows of `records`.
    pub fn thresholds(&self, records: &[CrspRecord]) -> Result<SizeThresholds> {
        self.validate()?;

        let result = crsp_frame(records)?
            .lazy()
            .filter(col("exchange").eq(lit(Exchange::Nyse.as_str())))
            .select([
                col("mktcap")
                    .quantile(lit(self.small), QuantileMethod::Linear)
                    .alias("small"),
                col("mktcap")
                    .quantile(lit(self.large), QuantileMethod::Linear)
                    .alias("large"),
            ])
            .collect()?;

        let small = result.column("small")?.f64()?.get(0);
        let large = result.column("large")?.f64()?.get(0);
        match (small, large) {
            (Some(small), Some(large)) => Ok(SizeThresholds { small, large }),
            _ => Err(FactorError::InsufficientData(
                "no NYSE market caps to compute size breakpoints".to_string(),
            )),
        }
    }
}

/// Assign `size_category` to every record from pooled NYSE breakpoints.
pub fn classify_by_size(
    records: &mut [CrspRecord],
    breakpoints: &SizeBreakpoints,
) -> Result<SizeThresholds> {
    let thresholds = breakpoints.thresholds(records)?;
    for record in records.iter_mut() {
        record.size_category = Some(thresholds.classify(record.mktcap));
    }
    debug!(
        small = thresholds.small,
        large = thresholds.large,
        "classified records by NYSE size breakpoints"
    );
    Ok(thresholds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rstest::rstest;

    fn record(permno: i64, exchange: Exchange, mktcap: f64) -> CrspRecord {
        CrspRecord {
            permno,
            gvkey: None,
            date: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
            exchange,
            size_category: None,
            mktcap,
            ret_excess: 0.0,
            momentum: None,
            volatility: None,
        }
    }

    #[rstest]
    #[case(5.0, SizeCategory::Micro)]
    #[case(40.0, SizeCategory::Small)]
    #[case(69.0, SizeCategory::Small)]
    #[case(70.0, SizeCategory::Large)]
    #[case(1000.0, SizeCategory::Large)]
    fn test_classify(#[case] mktcap: f64, #[case] expected: SizeCategory) {
        let thresholds = SizeThresholds {
            small: 30.0,
            large: 70.0,
        };
        assert_eq!(thresholds.classify(mktcap), expected);
    }

    #[test]
    fn test_only_nyse_sets_breakpoints() {
        // NYSE caps 10, 20, ..., 110 (11 values); p30 = 40, p70 = 80
        let mut records: Vec<CrspRecord> = (1..=11)
            .map(|i| record(i, Exchange::Nyse, 10.0 * i as f64))
            .collect();
        records.push(record(100, Exchange::Nasdaq, 1.0e6));
        records.push(record(101, Exchange::Nasdaq, 35.0));

        let thresholds = classify_by_size(&mut records, &SizeBreakpoints::default()).unwrap();
        assert!((thresholds.small - 40.0).abs() < 1e-9);
        assert!((thresholds.large - 80.0).abs() < 1e-9);

        assert_eq!(records[0].size_category, Some(SizeCategory::Micro));
        assert_eq!(records[3].size_category, Some(SizeCategory::Small));
        assert_eq!(records[7].size_category, Some(SizeCategory::Large));
        assert_eq!(records[11].size_category, Some(SizeCategory::Large));
        assert_eq!(records[12].size_category, Some(SizeCategory::Micro));
    }

    #[test]
    fn test_requires_nyse_rows() {
        let mut records = vec![record(1, Exchange::Nasdaq, 10.0)];
        assert!(matches!(
            classify_by_size(&mut records, &SizeBreakpoints::default()),
            Err(FactorError::InsufficientData(_))
        ));
    }

    #[test]
    fn test_invalid_breakpoints() {
        let bp = SizeBreakpoints {
            small: 0.8,
            large: 0.7,
        };
        assert!(bp.validate().is_err());
    }
}
