//! Fama-MacBeth Estimation
//!
//! Two passes over the panel:
//!
//! 1. A cross-sectional regression per month gives a vector of slopes
//!    `γ_t` (see [`crate::regression`]).
//! 2. For each coefficient, the time-series mean of `γ_t` is the price of
//!    risk and its Newey-West standard error gives the t-statistic.
//!
//! Reported premia are `100 * mean(γ)` and `mean(γ) / se_NW(γ)`, rounded to
//! three decimals.

use crate::covariance::{NeweyWestConfig, NeweyWestEstimator};
use crate::error::{ModelError, Result};
use crate::panel::Panel;
use crate::prepare::{PrepareConfig, prepare_panel};
use crate::regression::{CrossSectionRegression, INTERCEPT};
use chrono::NaiveDate;
use ndarray::{Array2, ArrayView1, Axis};
use premia_data::{CompustatRecord, CrspRecord};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Fama-MacBeth configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FamaMacBethConfig {
    /// Panel preparation
    pub prepare: PrepareConfig,
    /// Cross-sectional estimator (default: WLS)
    pub regression: CrossSectionRegression,
    /// Newey-West settings for the time-series standard errors
    pub newey_west: NeweyWestConfig,
}

/// Estimated price of risk for one coefficient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskPremium {
    /// Coefficient name (`Intercept` or a characteristic)
    pub factor: String,
    /// `100 * mean` of the monthly estimates
    pub risk_premium: f64,
    /// Mean over its Newey-West standard error
    pub t_stat_newey_west: f64,
}

/// Monthly cross-sectional estimates (T x K).
#[derive(Debug, Clone)]
pub struct PremiaSeries {
    /// Months with a successful regression
    pub dates: Vec<NaiveDate>,
    /// Coefficient names, one per column
    pub factors: Vec<String>,
    /// One row per month, one column per coefficient
    pub estimates: Array2<f64>,
}

impl PremiaSeries {
    /// Number of months.
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    /// True when no month was estimated.
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Monthly estimates of one coefficient.
    pub fn column(&self, factor: &str) -> Option<ArrayView1<'_, f64>> {
        let idx = self.factors.iter().position(|f| f == factor)?;
        Some(self.estimates.column(idx))
    }
}

/// Output of a Fama-MacBeth run
#[derive(Debug, Clone)]
pub struct FamaMacBethResult {
    /// Monthly estimates
    pub series: PremiaSeries,
    /// Summary rows, `Intercept` first then by name
    pub premia: Vec<RiskPremium>,
    /// Months whose regression failed
    pub skipped: Vec<NaiveDate>,
}

impl FamaMacBethResult {
    /// Summary row for one coefficient.
    pub fn premium(&self, factor: &str) -> Option<&RiskPremium> {
        self.premia.iter().find(|p| p.factor == factor)
    }
}

/// Round half away from zero to three decimals.
pub fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

/// Fama-MacBeth estimator
#[derive(Debug, Default)]
pub struct FamaMacBeth {
    config: FamaMacBethConfig,
}

impl FamaMacBeth {
    /// Create an estimator with the given configuration
    pub const fn new(config: FamaMacBethConfig) -> Self {
        Self { config }
    }

    /// Configuration in use.
    pub const fn config(&self) -> &FamaMacBethConfig {
        &self.config
    }

    /// Build the regression panel with this estimator's preparation settings.
    pub fn prepare(&self, crsp: &[CrspRecord], compustat: &[CompustatRecord]) -> Result<Panel> {
        prepare_panel(crsp, compustat, &self.config.prepare)
    }

    /// Prepare the panel and run the estimation.
    pub fn estimate(
        &self,
        crsp: &[CrspRecord],
        compustat: &[CompustatRecord],
    ) -> Result<FamaMacBethResult> {
        let panel = self.prepare(crsp, compustat)?;
        self.run(&panel)
    }

    /// Run both passes over a prepared panel.
    pub fn run(&self, panel: &Panel) -> Result<FamaMacBethResult> {
        let sections = panel.cross_sections();
        if sections.is_empty() {
            return Err(ModelError::InsufficientData(
                "the regression panel is empty".to_string(),
            ));
        }

        let regression = self.config.regression;
        let fits: Vec<_> = sections
            .par_iter()
            .map(|(date, rows)| (*date, regression.fit(rows)))
            .collect();

        let factors = CrossSectionRegression::coefficient_names();
        let mut dates = Vec::with_capacity(fits.len());
        let mut flat = Vec::with_capacity(fits.len() * factors.len());
        let mut skipped = Vec::new();
        for (date, fit) in fits {
            match fit {
                Ok(gamma) => {
                    dates.push(date);
                    flat.extend(gamma.iter().copied());
                }
                Err(e) => {
                    warn!(%date, error = %e, "skipping cross-section");
                    skipped.push(date);
                }
            }
        }

        if dates.is_empty() {
            return Err(ModelError::InsufficientData(format!(
                "none of the {} cross-sectional regressions succeeded",
                skipped.len()
            )));
        }

        let estimates = Array2::from_shape_vec((dates.len(), factors.len()), flat)
            .map_err(|e| ModelError::InvalidParameter(e.to_string()))?;
        debug!(
            months = dates.len(),
            skipped = skipped.len(),
            "estimated monthly cross-sections"
        );

        let Some(means) = estimates.mean_axis(Axis(0)) else {
            return Err(ModelError::InsufficientData("no monthly estimates".to_string()));
        };
        let standard_errors =
            NeweyWestEstimator::new(self.config.newey_west.clone()).standard_errors(&estimates)?;

        let mut premia: Vec<RiskPremium> = factors
            .iter()
            .zip(means.iter().zip(standard_errors.iter()))
            .map(|(factor, (&mean, &se))| RiskPremium {
                factor: factor.clone(),
                risk_premium: round3(100.0 * mean),
                t_stat_newey_west: round3(mean / se),
            })
            .collect();
        premia.sort_by(|a, b| {
            (a.factor != INTERCEPT, &a.factor).cmp(&(b.factor != INTERCEPT, &b.factor))
        });

        info!(
            months = dates.len(),
            observations = panel.len(),
            regression = ?regression,
            "Fama-MacBeth estimation complete"
        );

        Ok(FamaMacBethResult {
            series: PremiaSeries {
                dates,
                factors,
                estimates,
            },
            premia,
            skipped,
        })
    }
}
