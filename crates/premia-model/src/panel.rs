//! Regression panel
//!
//! One [`Observation`] per security-month with every regressor present,
//! kept sorted by `(date, permno)` so cross-sections are contiguous.

use chrono::NaiveDate;
use premia_data::SizeCategory;
use premia_factors::Characteristic;
use serde::{Deserialize, Serialize};

/// A complete security-month row of the Fama-MacBeth panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// CRSP security identifier
    pub permno: i64,
    /// Month of the characteristics
    pub date: NaiveDate,
    /// NYSE size bucket
    pub size_category: SizeCategory,
    /// Excess return of the following month (dependent variable)
    pub ret_excess_lead: f64,
    /// Current market cap, the WLS weight
    pub mktcap: f64,
    /// Log market cap at the last fundamentals date
    pub log_mktcap: f64,
    /// Log book-to-market
    pub log_bm: f64,
    /// Operating profitability
    pub op: f64,
    /// Investment
    pub inv: f64,
    /// Current-month excess return
    pub ret_excess: f64,
    /// 12-1 momentum
    pub momentum: f64,
    /// Rolling daily volatility
    pub volatility: f64,
}

impl Observation {
    /// Value of one regressor.
    pub const fn value(&self, characteristic: Characteristic) -> f64 {
        match characteristic {
            Characteristic::LogMktcap => self.log_mktcap,
            Characteristic::LogBm => self.log_bm,
            Characteristic::Op => self.op,
            Characteristic::Inv => self.inv,
            Characteristic::RetExcess => self.ret_excess,
            Characteristic::Momentum => self.momentum,
            Characteristic::Volatility => self.volatility,
        }
    }

    /// Whether every numeric field is finite.
    pub fn is_finite(&self) -> bool {
        [self.ret_excess_lead, self.mktcap]
            .into_iter()
            .chain(Characteristic::all().into_iter().map(|c| self.value(c)))
            .all(f64::is_finite)
    }
}

/// Monthly cross-sections of observations.
#[derive(Debug, Clone, Default)]
pub struct Panel {
    observations: Vec<Observation>,
}

impl Panel {
    /// Build a panel, sorting rows by date then security.
    pub fn new(mut observations: Vec<Observation>) -> Self {
        observations.sort_by_key(|o| (o.date, o.permno));
        Self { observations }
    }

    /// All rows in `(date, permno)` order.
    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.observations.len()
    }

    /// True when the panel has no rows.
    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// Rows grouped by month.
    pub fn cross_sections(&self) -> Vec<(NaiveDate, &[Observation])> {
        self.observations
            .chunk_by(|a, b| a.date == b.date)
            .map(|chunk| (chunk[0].date, chunk))
            .collect()
    }

    /// Distinct months in order.
    pub fn dates(&self) -> Vec<NaiveDate> {
        self.cross_sections().into_iter().map(|(d, _)| d).collect()
    }

    /// Keep only rows matching `keep`.
    pub fn retain(&mut self, keep: impl FnMut(&Observation) -> bool) {
        self.observations.retain(keep);
    }
}
