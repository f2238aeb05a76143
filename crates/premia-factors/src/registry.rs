//! Characteristic Registry
//!
//! Central list of the firm characteristics that enter the cross-sectional
//! regressions, in the order the regressors are laid out.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::FactorError;

/// Characteristic categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CharacteristicCategory {
    /// Market capitalization
    Size,
    /// Book-to-market
    Value,
    /// Operating profitability
    Quality,
    /// Asset growth
    Investment,
    /// Past returns (reversal and momentum)
    Momentum,
    /// Return volatility
    Volatility,
}

/// A regressor of the Fama-MacBeth cross-sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Characteristic {
    /// Log market cap
    LogMktcap,
    /// Log book-to-market
    LogBm,
    /// Operating profitability
    Op,
    /// Investment (asset growth)
    Inv,
    /// Current-month excess return
    RetExcess,
    /// 12-1 momentum
    Momentum,
    /// Rolling daily volatility
    Volatility,
}

impl Characteristic {
    /// All characteristics in regressor order.
    pub const fn all() -> [Self; 7] {
        [
            Self::LogMktcap,
            Self::LogBm,
            Self::Op,
            Self::Inv,
            Self::RetExcess,
            Self::Momentum,
            Self::Volatility,
        ]
    }

    /// Column name used in panels and result tables.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::LogMktcap => "log_mktcap",
            Self::LogBm => "log_bm",
            Self::Op => "op",
            Self::Inv => "inv",
            Self::RetExcess => "ret_excess",
            Self::Momentum => "momentum",
            Self::Volatility => "volatility",
        }
    }

    /// Category of the characteristic.
    pub const fn category(&self) -> CharacteristicCategory {
        match self {
            Self::LogMktcap => CharacteristicCategory::Size,
            Self::LogBm => CharacteristicCategory::Value,
            Self::Op => CharacteristicCategory::Quality,
            Self::Inv => CharacteristicCategory::Investment,
            Self::RetExcess | Self::Momentum => CharacteristicCategory::Momentum,
            Self::Volatility => CharacteristicCategory::Volatility,
        }
    }

    /// Brief description of what the characteristic measures.
    pub const fn description(&self) -> &'static str {
        match self {
            Self::LogMktcap => "Natural logarithm of market capitalization",
            Self::LogBm => "Log of book equity over market equity",
            Self::Op => "Operating profit scaled by book equity",
            Self::Inv => "Year-over-year growth in total assets",
            Self::RetExcess => "Excess return of the current month (short-term reversal)",
            Self::Momentum => "Cumulative excess return from t-12 to t-2",
            Self::Volatility => "Rolling standard deviation of daily excess returns",
        }
    }

    /// Whether the characteristic comes from Compustat fundamentals and is
    /// carried forward between annual filings.
    pub const fn is_fundamental(&self) -> bool {
        matches!(self, Self::LogBm | Self::Op | Self::Inv | Self::LogMktcap)
    }
}

impl fmt::Display for Characteristic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Characteristic {
    type Err = FactorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .into_iter()
            .find(|c| c.name() == s)
            .ok_or_else(|| FactorError::InvalidParameter(format!("Unknown characteristic: {}", s)))
    }
}

/// Get characteristics by category
pub fn characteristics_by_category(category: CharacteristicCategory) -> Vec<Characteristic> {
    Characteristic::all()
        .into_iter()
        .filter(|c| c.category() == category)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_regressor_order() {
        let names: Vec<&str> = Characteristic::all().iter().map(|c| c.name()).collect();
        assert_eq!(
            names,
            ["log_mktcap", "log_bm", "op", "inv", "ret_excess", "momentum", "volatility"]
        );
    }

    #[test]
    fn test_characteristics_by_category() {
        assert_eq!(
            characteristics_by_category(CharacteristicCategory::Momentum),
            vec![Characteristic::RetExcess, Characteristic::Momentum]
        );
        assert_eq!(characteristics_by_category(CharacteristicCategory::Value).len(), 1);
    }

    #[test]
    fn test_parse_round_trip() {
        for c in Characteristic::all() {
            assert_eq!(c.name().parse::<Characteristic>().unwrap(), c);
        }
        assert!("beta".parse::<Characteristic>().is_err());
    }

    #[test]
    fn test_fundamentals() {
        assert!(Characteristic::LogBm.is_fundamental());
        assert!(!Characteristic::Momentum.is_fundamental());
    }
}
