//! Building the stored panel from raw inputs.
//!
//! Monthly CRSP rows arrive with returns and market caps only. Import fills
//! in momentum, volatility (when daily returns are supplied) and the NYSE
//! size bucket, derives the annual Compustat characteristics from raw
//! fundamentals, and writes both tables to a [`PanelStore`].

use crate::error::Result;
use premia_data::{CompustatFundamentals, CrspRecord, DailyReturn, PanelStore, month_start};
use premia_factors::compustat_characteristics;
use premia_factors::momentum::{Momentum, MomentumConfig};
use premia_factors::size::{SizeBreakpoints, SizeThresholds, classify_by_size};
use premia_factors::volatility::{RollingVolatility, VolatilityConfig};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Settings for the characteristics built during import
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    /// 12-1 momentum window
    pub momentum: MomentumConfig,
    /// Rolling daily volatility
    pub volatility: VolatilityConfig,
    /// NYSE size percentiles
    pub size: SizeBreakpoints,
}

/// What an import wrote.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImportSummary {
    /// Monthly CRSP rows stored
    pub crsp_rows: usize,
    /// Firm fiscal years stored
    pub compustat_rows: usize,
    /// CRSP rows with a momentum value
    pub with_momentum: usize,
    /// CRSP rows with a volatility value
    pub with_volatility: usize,
    /// Market caps separating the size buckets
    pub thresholds: SizeThresholds,
}

/// Fill the derived CRSP columns in place.
///
/// Dates are moved to the first of their month. Volatility is only
/// recomputed when `daily` is given; otherwise values already on the
/// records are kept.
pub fn prepare_crsp(
    records: &mut [CrspRecord],
    daily: Option<&[DailyReturn]>,
    config: &ImportConfig,
) -> Result<SizeThresholds> {
    for record in records.iter_mut() {
        record.date = month_start(record.date);
    }

    Momentum::with_config(config.momentum.clone()).compute(records)?;
    if let Some(daily) = daily {
        RollingVolatility::with_config(config.volatility.clone()).compute(records, daily)?;
    }
    let thresholds = classify_by_size(records, &config.size)?;

    debug!(
        rows = records.len(),
        small = thresholds.small,
        large = thresholds.large,
        "prepared crsp characteristics"
    );
    Ok(thresholds)
}

/// Derive all characteristics and store the panel.
pub fn import_panel(
    store: &PanelStore,
    mut crsp: Vec<CrspRecord>,
    fundamentals: &[CompustatFundamentals],
    daily: Option<&[DailyReturn]>,
    config: &ImportConfig,
) -> Result<ImportSummary> {
    let thresholds = prepare_crsp(&mut crsp, daily, config)?;
    let compustat = compustat_characteristics(fundamentals);

    store.put_crsp(&crsp)?;
    store.put_compustat(&compustat)?;

    let summary = ImportSummary {
        crsp_rows: crsp.len(),
        compustat_rows: compustat.len(),
        with_momentum: crsp.iter().filter(|r| r.momentum.is_some()).count(),
        with_volatility: crsp.iter().filter(|r| r.volatility.is_some()).count(),
        thresholds,
    };
    info!(
        crsp = summary.crsp_rows,
        compustat = summary.compustat_rows,
        "imported panel"
    );
    Ok(summary)
}
