//! Log Market Capitalization
//!
//! Natural logarithm of CRSP market equity (in millions).

/// `ln(mktcap)`, or `None` for non-positive or non-finite market caps.
pub fn log_market_cap(mktcap: f64) -> Option<f64> {
    (mktcap.is_finite() && mktcap > 0.0).then(|| mktcap.ln())
}
