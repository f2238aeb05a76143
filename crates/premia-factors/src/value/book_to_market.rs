//! Log book-to-market ratio.

/// `ln(BE / ME)` for positive book equity and market equity.
///
/// Both inputs must be in the same units; CRSP market cap is in millions,
/// as is Compustat book equity.
pub fn log_book_to_market(be: Option<f64>, mktcap: f64) -> Option<f64> {
    let be = be?;
    (be > 0.0 && mktcap > 0.0).then(|| (be / mktcap).ln())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_log_book_to_market() {
        assert_relative_eq!(log_book_to_market(Some(50.0), 100.0).unwrap(), 0.5_f64.ln());
        assert!(log_book_to_market(None, 100.0).is_none());
        assert!(log_book_to_market(Some(-1.0), 100.0).is_none());
        assert!(log_book_to_market(Some(1.0), 0.0).is_none());
    }
}
