//! Panel preparation
//!
//! Turns CRSP monthly rows and annual Compustat characteristics into the
//! Fama-MacBeth regression panel:
//!
//! 1. Each fundamentals record is dated at the month of its fiscal year end
//!    and priced with the firm's CRSP market cap of that month, giving
//!    `log_bm` and `log_mktcap`.
//! 2. The record becomes usable `compustat_month_lag` months later and is
//!    attached to the CRSP row of the same firm in that month.
//! 3. Within each security the fundamentals are carried forward until the
//!    next record arrives.
//! 4. Every row is paired with the security's excess return of the next
//!    month; rows missing any field are dropped.
//! 5. Optionally, thin months are dropped, then the size subset is applied.

use crate::error::{ModelError, Result};
use crate::panel::{Observation, Panel};
use chrono::NaiveDate;
use polars::prelude::*;
use premia_data::frames::epoch_days;
use premia_data::{
    CompustatRecord, CrspRecord, SizeCategory, add_months, date_column, month_start,
};
use premia_factors::size::log_market_cap;
use premia_factors::value::log_book_to_market;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Upper bound (exclusive) for `drop_tail_percentile`.
pub const MAX_DROP_TAIL_PERCENTILE: f64 = 0.25;

/// Which size bucket the regressions run on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SizeSubset {
    /// Every stock
    #[default]
    All,
    /// Micro caps only
    Micro,
    /// Small caps only
    Small,
    /// Large caps only
    Large,
}

impl SizeSubset {
    /// Subsets in report order.
    pub const fn all() -> [Self; 4] {
        [Self::All, Self::Micro, Self::Small, Self::Large]
    }

    /// Size bucket to filter on, `None` for the full sample.
    pub const fn category(&self) -> Option<SizeCategory> {
        match self {
            Self::All => None,
            Self::Micro => Some(SizeCategory::Micro),
            Self::Small => Some(SizeCategory::Small),
            Self::Large => Some(SizeCategory::Large),
        }
    }

    /// Heading used for the subset's result table.
    pub const fn title(&self) -> &'static str {
        match self {
            Self::All => "All Data",
            Self::Micro => "Micro Caps",
            Self::Small => "Small Caps",
            Self::Large => "Large Caps",
        }
    }

    /// Command-line representation.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Micro => "micro",
            Self::Small => "small",
            Self::Large => "large",
        }
    }
}

impl FromStr for SizeSubset {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(Self::All),
            "micro" => Ok(Self::Micro),
            "small" => Ok(Self::Small),
            "large" => Ok(Self::Large),
            other => Err(ModelError::InvalidParameter(format!(
                "Invalid size subset: {} (expected all, micro, small or large)",
                other
            ))),
        }
    }
}

impl fmt::Display for SizeSubset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Panel preparation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PrepareConfig {
    /// Months between the fiscal year end and the first use of the
    /// fundamentals (default: 6)
    pub compustat_month_lag: u32,
    /// Drop months whose cross-section is smaller than this quantile of
    /// the per-month counts (default: None)
    pub drop_tail_percentile: Option<f64>,
    /// Size subset (default: all)
    pub subset: SizeSubset,
}

impl Default for PrepareConfig {
    fn default() -> Self {
        Self {
            compustat_month_lag: 6,
            drop_tail_percentile: None,
            subset: SizeSubset::All,
        }
    }
}

impl PrepareConfig {
    /// Reject settings the preparation cannot honour.
    pub fn validate(&self) -> Result<()> {
        if let Some(p) = self.drop_tail_percentile {
            if p >= MAX_DROP_TAIL_PERCENTILE {
                return Err(ModelError::InvalidParameter(
                    "Drop tail percentile must be lower than 0.25".to_string(),
                ));
            }
            if !(p >= 0.0) {
                return Err(ModelError::InvalidParameter(format!(
                    "Drop tail percentile must be non-negative, got {}",
                    p
                )));
            }
        }
        Ok(())
    }
}

/// Fundamentals attached to a CRSP row.
#[derive(Debug, Clone, Copy, Default)]
struct Fundamentals {
    log_bm: Option<f64>,
    log_mktcap: Option<f64>,
    op: Option<f64>,
    inv: Option<f64>,
}

impl Fundamentals {
    /// Fields present in `self`, falling back to `previous`.
    fn or(self, previous: Self) -> Self {
        Self {
            log_bm: self.log_bm.or(previous.log_bm),
            log_mktcap: self.log_mktcap.or(previous.log_mktcap),
            op: self.op.or(previous.op),
            inv: self.inv.or(previous.inv),
        }
    }
}

/// Fundamentals keyed by `(gvkey, sorting_date)`.
fn sorted_fundamentals(
    crsp: &[CrspRecord],
    compustat: &[CompustatRecord],
    lag: u32,
) -> HashMap<(String, NaiveDate), Fundamentals> {
    // (gvkey, month) -> market cap; the lowest permno wins for multi-class firms
    let mut mktcap: HashMap<(&str, NaiveDate), (i64, f64)> = HashMap::new();
    for r in crsp {
        let Some(gvkey) = r.gvkey.as_deref() else { continue };
        let entry = mktcap.entry((gvkey, r.date)).or_insert((r.permno, r.mktcap));
        if r.permno < entry.0 {
            *entry = (r.permno, r.mktcap);
        }
    }

    let mut ordered: Vec<&CompustatRecord> = compustat.iter().collect();
    ordered.sort_by_key(|c| c.datadate);

    let mut out = HashMap::with_capacity(ordered.len());
    for c in ordered {
        let date = month_start(c.datadate);
        let cap = mktcap.get(&(c.gvkey.as_str(), date)).map(|&(_, cap)| cap);
        let fundamentals = Fundamentals {
            log_bm: cap.and_then(|cap| log_book_to_market(c.be, cap)),
            log_mktcap: cap.and_then(log_market_cap),
            op: c.op,
            inv: c.inv,
        };
        let sorting_date = add_months(date, lag as i32);
        out.insert((c.gvkey.clone(), sorting_date), fundamentals);
    }
    out
}

/// A panel row, if every field is available.
fn complete_observation(
    r: &CrspRecord,
    carried: Fundamentals,
    ret_excess_lead: Option<f64>,
) -> Option<Observation> {
    Some(Observation {
        permno: r.permno,
        date: r.date,
        size_category: r.size_category?,
        ret_excess_lead: ret_excess_lead?,
        mktcap: r.mktcap,
        log_mktcap: carried.log_mktcap?,
        log_bm: carried.log_bm?,
        op: carried.op?,
        inv: carried.inv?,
        ret_excess: r.ret_excess,
        momentum: r.momentum?,
        volatility: r.volatility?,
    })
}

/// Drop months whose observation count is below the `p` quantile of counts.
///
/// Returns the number of months dropped.
pub fn drop_thin_dates(panel: &mut Panel, p: f64) -> Result<usize> {
    if panel.is_empty() {
        return Ok(0);
    }
    let months = panel.dates().len();

    let dates = Series::new(
        "date".into(),
        panel
            .observations()
            .iter()
            .map(|o| epoch_days(o.date))
            .collect::<Vec<_>>(),
    )
    .cast(&DataType::Date)?;

    let kept = DataFrame::new(vec![dates.into()])?
        .lazy()
        .group_by([col("date")])
        .agg([len().cast(DataType::Float64).alias("count")])
        .with_columns([col("count")
            .quantile(lit(p), QuantileMethod::Linear)
            .alias("threshold")])
        .filter(col("count").gt_eq(col("threshold")))
        .select([col("date"), col("threshold")])
        .collect()?;

    let threshold = kept.column("threshold")?.f64()?.get(0);
    let keep: HashSet<NaiveDate> = date_column(&kept, "date")?.into_iter().collect();

    let dropped = months - keep.len();
    panel.retain(|o| keep.contains(&o.date));
    debug!(?threshold, dropped, "dropped thin months");
    Ok(dropped)
}

/// Build the regression panel.
pub fn prepare_panel(
    crsp: &[CrspRecord],
    compustat: &[CompustatRecord],
    config: &PrepareConfig,
) -> Result<Panel> {
    config.validate()?;

    let fundamentals = sorted_fundamentals(crsp, compustat, config.compustat_month_lag);

    let lead: HashMap<(i64, NaiveDate), f64> =
        crsp.iter().map(|r| ((r.permno, r.date), r.ret_excess)).collect();

    let mut by_security: BTreeMap<i64, Vec<&CrspRecord>> = BTreeMap::new();
    for r in crsp {
        by_security.entry(r.permno).or_default().push(r);
    }

    let mut observations = Vec::new();
    for rows in by_security.values_mut() {
        rows.sort_by_key(|r| r.date);
        let mut carried = Fundamentals::default();

        for r in rows.iter() {
            let matched = r
                .gvkey
                .as_ref()
                .and_then(|gvkey| fundamentals.get(&(gvkey.clone(), r.date)))
                .copied()
                .unwrap_or_default();
            carried = matched.or(carried);

            let next = lead.get(&(r.permno, add_months(r.date, 1))).copied();
            let row = complete_observation(r, carried, next);

            if let Some(o) = row.filter(Observation::is_finite) {
                observations.push(o);
            }
        }
    }

    let complete = observations.len();
    let mut panel = Panel::new(observations);

    if let Some(p) = config.drop_tail_percentile {
        drop_thin_dates(&mut panel, p)?;
    }

    if let Some(category) = config.subset.category() {
        panel.retain(|o| o.size_category == category);
    }

    debug!(
        crsp_rows = crsp.len(),
        compustat_rows = compustat.len(),
        complete,
        kept = panel.len(),
        subset = %config.subset,
        "prepared regression panel"
    );
    Ok(panel)
}
