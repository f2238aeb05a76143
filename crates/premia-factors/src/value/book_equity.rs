//! Book equity from annual Compustat items.
//!
//! ```text
//! BE = SE + DT - PS
//! SE = seq, else ceq + pstk, else at - lt
//! DT = txditc, else txdb + itcb, else 0
//! PS = pstkrv, else pstkl, else pstk, else 0
//! ```
//!
//! Non-positive book equity is treated as missing.

use premia_data::CompustatFundamentals;

fn sum(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    Some(a? + b?)
}

/// Book equity, or `None` when shareholders' equity is unavailable or BE <= 0.
pub fn book_equity(f: &CompustatFundamentals) -> Option<f64> {
    let shareholders_equity = f
        .seq
        .or_else(|| sum(f.ceq, f.pstk))
        .or_else(|| f.at.zip(f.lt).map(|(at, lt)| at - lt))?;
    let deferred_taxes = f.txditc.or_else(|| sum(f.txdb, f.itcb)).unwrap_or(0.0);
    let preferred = f.pstkrv.or(f.pstkl).or(f.pstk).unwrap_or(0.0);

    let be = shareholders_equity + deferred_taxes - preferred;
    (be > 0.0).then_some(be)
}
