//! Asset growth: `INV = AT_t / AT_{t-1} - 1`.

/// Year-over-year growth in total assets.
///
/// Missing when either year is missing or lagged assets are non-positive.
pub fn asset_growth(at: Option<f64>, at_lag: Option<f64>) -> Option<f64> {
    let at_lag = at_lag.filter(|v| *v > 0.0)?;
    Some(at? / at_lag - 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_asset_growth() {
        assert_relative_eq!(asset_growth(Some(110.0), Some(100.0)).unwrap(), 0.1, epsilon = 1e-12);
        assert!(asset_growth(Some(110.0), Some(0.0)).is_none());
        assert!(asset_growth(Some(110.0), None).is_none());
        assert!(asset_growth(None, Some(100.0)).is_none());
    }
}
