//! Typed panel rows.
//!
//! Field names follow the CRSP/Compustat column names so that CSV headers
//! and SQLite columns line up with the records one to one.

use crate::error::DataError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Market-capitalization bucket assigned from NYSE breakpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SizeCategory {
    /// Below the NYSE 30th percentile
    Micro,
    /// Between the NYSE 30th and 70th percentiles
    Small,
    /// At or above the NYSE 70th percentile
    Large,
}

impl SizeCategory {
    /// All categories, smallest first.
    pub const fn all() -> [Self; 3] {
        [Self::Micro, Self::Small, Self::Large]
    }

    /// Database and CSV representation.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Micro => "Micro",
            Self::Small => "Small",
            Self::Large => "Large",
        }
    }
}

impl FromStr for SizeCategory {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "micro" => Ok(Self::Micro),
            "small" => Ok(Self::Small),
            "large" => Ok(Self::Large),
            other => Err(DataError::Parse(format!("Invalid size category: {}", other))),
        }
    }
}

impl fmt::Display for SizeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Primary listing exchange of a CRSP security.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Exchange {
    /// New York Stock Exchange
    #[serde(rename = "NYSE")]
    Nyse,
    /// American Stock Exchange
    #[serde(rename = "AMEX")]
    Amex,
    /// NASDAQ
    #[serde(rename = "NASDAQ")]
    Nasdaq,
    /// Any other venue
    Other,
}

impl Exchange {
    /// Database and CSV representation.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Nyse => "NYSE",
            Self::Amex => "AMEX",
            Self::Nasdaq => "NASDAQ",
            Self::Other => "Other",
        }
    }

    /// Parse an exchange name; unknown names map to [`Exchange::Other`].
    pub fn from_name(s: &str) -> Self {
        match s.trim().to_ascii_uppercase().as_str() {
            "NYSE" => Self::Nyse,
            "AMEX" => Self::Amex,
            "NASDAQ" => Self::Nasdaq,
            _ => Self::Other,
        }
    }
}

impl fmt::Display for Exchange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One monthly CRSP observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrspRecord {
    /// CRSP permanent security identifier
    pub permno: i64,
    /// Compustat firm identifier from the CCM link, if linked this month
    pub gvkey: Option<String>,
    /// First day of the month
    pub date: NaiveDate,
    /// Listing exchange
    pub exchange: Exchange,
    /// Size bucket, assigned during import
    pub size_category: Option<SizeCategory>,
    /// Market capitalization in millions
    pub mktcap: f64,
    /// Monthly return in excess of the risk-free rate
    pub ret_excess: f64,
    /// 12-1 momentum
    pub momentum: Option<f64>,
    /// Rolling daily volatility
    pub volatility: Option<f64>,
}

/// Annual Compustat characteristics, one row per firm fiscal year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompustatRecord {
    /// Compustat firm identifier
    pub gvkey: String,
    /// Fiscal year end
    pub datadate: NaiveDate,
    /// Book equity
    pub be: Option<f64>,
    /// Operating profitability
    pub op: Option<f64>,
    /// Investment (asset growth)
    pub inv: Option<f64>,
}

/// Raw annual Compustat items used to build [`CompustatRecord`]s.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompustatFundamentals {
    /// Compustat firm identifier
    pub gvkey: String,
    /// Fiscal year end
    pub datadate: NaiveDate,
    /// Stockholders' equity
    pub seq: Option<f64>,
    /// Common equity
    pub ceq: Option<f64>,
    /// Preferred stock (carrying value)
    pub pstk: Option<f64>,
    /// Total assets
    pub at: Option<f64>,
    /// Total liabilities
    pub lt: Option<f64>,
    /// Deferred taxes and investment tax credit
    pub txditc: Option<f64>,
    /// Deferred taxes
    pub txdb: Option<f64>,
    /// Investment tax credit
    pub itcb: Option<f64>,
    /// Preferred stock (redemption value)
    pub pstkrv: Option<f64>,
    /// Preferred stock (liquidating value)
    pub pstkl: Option<f64>,
    /// Sales
    pub sale: Option<f64>,
    /// Cost of goods sold
    pub cogs: Option<f64>,
    /// Selling, general and administrative expenses
    pub xsga: Option<f64>,
    /// Interest expense
    pub xint: Option<f64>,
}

/// One daily CRSP excess return.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyReturn {
    /// CRSP permanent security identifier
    pub permno: i64,
    /// Trading day
    pub date: NaiveDate,
    /// Daily return in excess of the risk-free rate
    pub ret_excess: f64,
}
