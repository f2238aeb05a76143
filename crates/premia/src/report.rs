//! Risk premia for every size subset, as a result document.

use crate::error::Result;
use premia_data::{CompustatRecord, CrspRecord};
use premia_model::{
    FamaMacBeth, FamaMacBethConfig, FamaMacBethResult, Panel, RiskPremium, SizeSubset,
    prepare_panel,
};
use premia_output::{PremiumRow, ResultDocument, ResultSet};
use tracing::{info, warn};

/// Top-level heading of the results document.
pub const REPORT_TITLE: &str = "Fama-MacBeth Risk Premia";

/// Table rows for one run, in the order of `premia`.
pub fn result_set(title: impl Into<String>, premia: &[RiskPremium]) -> ResultSet {
    let rows = premia
        .iter()
        .map(|p| PremiumRow::new(p.factor.clone(), p.risk_premium, p.t_stat_newey_west))
        .collect();
    ResultSet::new(title, rows)
}

/// One Fama-MacBeth run restricted to `subset`.
pub fn run_subset(
    crsp: &[CrspRecord],
    compustat: &[CompustatRecord],
    config: &FamaMacBethConfig,
    subset: SizeSubset,
) -> Result<FamaMacBethResult> {
    let mut config = config.clone();
    config.prepare.subset = subset;
    Ok(FamaMacBeth::new(config).estimate(crsp, compustat)?)
}

fn restrict(panel: &Panel, subset: SizeSubset) -> Panel {
    let mut restricted = panel.clone();
    if let Some(category) = subset.category() {
        restricted.retain(|o| o.size_category == category);
    }
    restricted
}

/// Run `All Data`, `Micro Caps`, `Small Caps` and `Large Caps` and collect
/// the tables.
///
/// The panel is prepared once; thin months are dropped on the full sample
/// before each subset is taken, matching [`run_subset`]. `on_subset` is
/// called before each estimation starts.
pub fn report_document(
    crsp: &[CrspRecord],
    compustat: &[CompustatRecord],
    config: &FamaMacBethConfig,
    on_subset: impl FnMut(SizeSubset),
) -> Result<ResultDocument> {
    let mut base = config.clone();
    base.prepare.subset = SizeSubset::All;
    let panel = prepare_panel(crsp, compustat, &base.prepare)?;
    report_from_panel(&panel, &base, on_subset)
}

/// Estimate every subset of an already prepared full-sample panel.
///
/// A subset whose estimation fails is logged and left out of the document;
/// the document is an error only when no subset succeeds.
pub fn report_from_panel(
    panel: &Panel,
    config: &FamaMacBethConfig,
    mut on_subset: impl FnMut(SizeSubset),
) -> Result<ResultDocument> {
    let mut document = ResultDocument::new(REPORT_TITLE);
    for subset in SizeSubset::all() {
        on_subset(subset);
        let mut config = config.clone();
        config.prepare.subset = subset;
        let result = match FamaMacBeth::new(config).run(&restrict(panel, subset)) {
            Ok(result) => result,
            Err(e) => {
                warn!(subset = %subset, error = %e, "skipping subset");
                continue;
            }
        };
        info!(
            subset = %subset,
            months = result.series.len(),
            skipped = result.skipped.len(),
            "estimated risk premia"
        );
        document.push(result_set(subset.title(), &result.premia));
    }

    document.validate()?;
    Ok(document)
}
