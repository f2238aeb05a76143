//! Annual Compustat characteristics per firm fiscal year.

use crate::investment::asset_growth;
use crate::quality::operating_profitability;
use crate::value::book_equity;
use chrono::Datelike;
use premia_data::{CompustatFundamentals, CompustatRecord};
use std::collections::BTreeMap;
use tracing::debug;

/// Build `be`, `op` and `inv` for every firm fiscal year.
///
/// When a firm files more than once in a calendar year only the filing with
/// the latest `datadate` is kept. Investment uses the total assets of the
/// same firm's filing for the previous calendar year.
pub fn compustat_characteristics(rows: &[CompustatFundamentals]) -> Vec<CompustatRecord> {
    // (gvkey, year) -> last filing of that year
    let mut latest: BTreeMap<(&str, i32), &CompustatFundamentals> = BTreeMap::new();
    for row in rows {
        let key = (row.gvkey.as_str(), row.datadate.year());
        if latest
            .get(&key)
            .is_none_or(|existing| existing.datadate <= row.datadate)
        {
            latest.insert(key, row);
        }
    }

    let records: Vec<CompustatRecord> = latest
        .iter()
        .map(|(&(gvkey, year), f)| {
            let be = book_equity(f);
            let at_lag = latest.get(&(gvkey, year - 1)).and_then(|prev| prev.at);
            CompustatRecord {
                gvkey: gvkey.to_string(),
                datadate: f.datadate,
                be,
                op: operating_profitability(f, be),
                inv: asset_growth(f.at, at_lag),
            }
        })
        .collect();

    debug!(
        filings = rows.len(),
        firm_years = records.len(),
        "built compustat characteristics"
    );
    records
}
