//! Operating profitability
//!
//! Revenues minus cost of goods sold, SG&A and interest expense, scaled by
//! book equity. Missing expense items count as zero; missing sales or book
//! equity leave the ratio missing.

use premia_data::CompustatFundamentals;

/// `(sale - cogs - xsga - xint) / be`.
pub fn operating_profitability(f: &CompustatFundamentals, be: Option<f64>) -> Option<f64> {
    let be = be?;
    let operating_profit =
        f.sale? - f.cogs.unwrap_or(0.0) - f.xsga.unwrap_or(0.0) - f.xint.unwrap_or(0.0);
    Some(operating_profit / be)
}
