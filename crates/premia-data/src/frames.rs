//! Polars frames built from panel records.
//!
//! Dates travel as polars `Date` columns, i.e. days since the Unix epoch.

use crate::error::{DataError, Result};
use crate::records::CrspRecord;
use chrono::{Datelike, NaiveDate};
use polars::prelude::*;

/// `NaiveDate::num_days_from_ce` of 1970-01-01.
const EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// Days since the Unix epoch.
pub fn epoch_days(date: NaiveDate) -> i32 {
    date.num_days_from_ce() - EPOCH_DAYS_FROM_CE
}

/// Inverse of [`epoch_days`].
pub fn from_epoch_days(days: i32) -> Result<NaiveDate> {
    days.checked_add(EPOCH_DAYS_FROM_CE)
        .and_then(NaiveDate::from_num_days_from_ce_opt)
        .ok_or_else(|| DataError::Parse(format!("Date out of range: {} days since epoch", days)))
}

/// Monthly CRSP records as a DataFrame, one row per record in input order.
///
/// Columns: `permno`, `gvkey`, `date` (`Date`), `exchange`, `size_category`,
/// `mktcap`, `ret_excess`, `momentum`, `volatility`.
pub fn crsp_frame(records: &[CrspRecord]) -> Result<DataFrame> {
    let dates = Series::new(
        "date".into(),
        records.iter().map(|r| epoch_days(r.date)).collect::<Vec<_>>(),
    )
    .cast(&DataType::Date)?;

    let df = DataFrame::new(vec![
        Series::new("permno".into(), records.iter().map(|r| r.permno).collect::<Vec<_>>()).into(),
        Series::new(
            "gvkey".into(),
            records.iter().map(|r| r.gvkey.clone()).collect::<Vec<_>>(),
        )
        .into(),
        dates.into(),
        Series::new(
            "exchange".into(),
            records.iter().map(|r| r.exchange.as_str()).collect::<Vec<_>>(),
        )
        .into(),
        Series::new(
            "size_category".into(),
            records
                .iter()
                .map(|r| r.size_category.map(|c| c.as_str()))
                .collect::<Vec<_>>(),
        )
        .into(),
        Series::new("mktcap".into(), records.iter().map(|r| r.mktcap).collect::<Vec<_>>()).into(),
        Series::new(
            "ret_excess".into(),
            records.iter().map(|r| r.ret_excess).collect::<Vec<_>>(),
        )
        .into(),
        Series::new(
            "momentum".into(),
            records.iter().map(|r| r.momentum).collect::<Vec<_>>(),
        )
        .into(),
        Series::new(
            "volatility".into(),
            records.iter().map(|r| r.volatility).collect::<Vec<_>>(),
        )
        .into(),
    ])?;

    Ok(df)
}

/// Read a `Date` column back into chrono dates.
pub fn date_column(df: &DataFrame, name: &str) -> Result<Vec<NaiveDate>> {
    let days = df.column(name)?.cast(&DataType::Int32)?;
    days.i32()?
        .into_iter()
        .map(|d| {
            let d = d.ok_or_else(|| DataError::MissingData {
                table: "frame".to_string(),
                reason: format!("null in date column {}", name),
            })?;
            from_epoch_days(d)
        })
        .collect()
}
