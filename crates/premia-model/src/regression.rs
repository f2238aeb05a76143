//! Cross-sectional regression
//!
//! One regression per month of next-month excess returns on the current
//! characteristics:
//! ```text
//! r_{i,t+1} = γ_0 + Σ_k γ_k x_{i,k,t} + ε_{i,t+1}
//! ```
//! estimated by OLS or by WLS with market-cap weights, via the normal
//! equations `(X'WX) γ = X'Wy`.

use crate::panel::Observation;
use ndarray::{Array1, Array2};
use premia_factors::Characteristic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Name of the constant term in the coefficient vector.
pub const INTERCEPT: &str = "Intercept";

/// Pivots below this, after equilibration, mark the design as singular.
const SINGULAR_TOLERANCE: f64 = 1e-12;

/// Errors from a single cross-sectional fit
#[derive(Debug, Error)]
pub enum RegressionError {
    /// Fewer rows than coefficients
    #[error("Insufficient observations: need at least {required}, got {actual}")]
    InsufficientObservations {
        /// Required number of observations
        required: usize,
        /// Actual number of observations
        actual: usize,
    },

    /// Regressors are collinear or constant
    #[error("Design matrix is singular")]
    Singular,

    /// Weights are non-positive or non-finite
    #[error("Invalid weights: {0}")]
    InvalidWeights(String),

    /// Dimension mismatch
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimension
        expected: usize,
        /// Actual dimension
        actual: usize,
    },
}

/// Estimator used for every monthly cross-section
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CrossSectionRegression {
    /// Ordinary least squares
    Ols,
    /// Weighted least squares with market-cap weights
    #[default]
    Wls,
}

impl CrossSectionRegression {
    /// Coefficient names in order: the intercept, then every characteristic.
    pub fn coefficient_names() -> Vec<String> {
        std::iter::once(INTERCEPT.to_string())
            .chain(Characteristic::all().iter().map(|c| c.name().to_string()))
            .collect()
    }

    /// Fit one cross-section, returning coefficients in
    /// [`coefficient_names`](Self::coefficient_names) order.
    pub fn fit(&self, observations: &[Observation]) -> Result<Array1<f64>, RegressionError> {
        let (x, y, mktcap) = design(observations);
        match self {
            Self::Ols => least_squares(&x, &y, None),
            Self::Wls => least_squares(&x, &y, Some(&mktcap)),
        }
    }
}

/// Design matrix with a leading column of ones, the dependent variable and
/// the market caps.
pub fn design(observations: &[Observation]) -> (Array2<f64>, Array1<f64>, Array1<f64>) {
    let characteristics = Characteristic::all();
    let n = observations.len();
    let k = characteristics.len() + 1;

    let mut x = Array2::<f64>::ones((n, k));
    for (i, o) in observations.iter().enumerate() {
        for (j, &c) in characteristics.iter().enumerate() {
            x[[i, j + 1]] = o.value(c);
        }
    }
    let y = observations.iter().map(|o| o.ret_excess_lead).collect();
    let mktcap = observations.iter().map(|o| o.mktcap).collect();
    (x, y, mktcap)
}

/// Solve `(X'WX) b = X'Wy`; `weights = None` is OLS.
pub fn least_squares(
    x: &Array2<f64>,
    y: &Array1<f64>,
    weights: Option<&Array1<f64>>,
) -> Result<Array1<f64>, RegressionError> {
    let (n, k) = x.dim();
    if y.len() != n {
        return Err(RegressionError::DimensionMismatch {
            expected: n,
            actual: y.len(),
        });
    }
    if n < k {
        return Err(RegressionError::InsufficientObservations {
            required: k,
            actual: n,
        });
    }

    let (xtwx, xtwy) = match weights {
        Some(w) => {
            if w.len() != n {
                return Err(RegressionError::DimensionMismatch {
                    expected: n,
                    actual: w.len(),
                });
            }
            if let Some(bad) = w.iter().find(|v| !(v.is_finite() && **v > 0.0)) {
                return Err(RegressionError::InvalidWeights(format!(
                    "weights must be positive and finite, found {}",
                    bad
                )));
            }
            let wx = x * &w.view().insert_axis(ndarray::Axis(1));
            (wx.t().dot(x), wx.t().dot(y))
        }
        None => (x.t().dot(x), x.t().dot(y)),
    };

    solve(xtwx, xtwy)
}

/// Solve the symmetric positive semi-definite system `a z = b` by Gaussian
/// elimination with partial pivoting on the equilibrated matrix
/// `D^-1/2 a D^-1/2`.
fn solve(mut a: Array2<f64>, mut b: Array1<f64>) -> Result<Array1<f64>, RegressionError> {
    let k = b.len();

    let scale: Array1<f64> = a.diag().mapv(f64::sqrt);
    if scale.iter().any(|s| !(s.is_finite() && *s > 0.0)) {
        return Err(RegressionError::Singular);
    }
    for i in 0..k {
        b[i] /= scale[i];
        for j in 0..k {
            a[[i, j]] /= scale[i] * scale[j];
        }
    }

    for col in 0..k {
        let mut pivot = col;
        for row in col + 1..k {
            if a[[row, col]].abs() > a[[pivot, col]].abs() {
                pivot = row;
            }
        }
        if !(a[[pivot, col]].abs() > SINGULAR_TOLERANCE) {
            return Err(RegressionError::Singular);
        }
        if pivot != col {
            for j in 0..k {
                a.swap([col, j], [pivot, j]);
            }
            b.swap(col, pivot);
        }

        for row in col + 1..k {
            let factor = a[[row, col]] / a[[col, col]];
            if factor == 0.0 {
                continue;
            }
            for j in col..k {
                a[[row, j]] -= factor * a[[col, j]];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut z = Array1::<f64>::zeros(k);
    for i in (0..k).rev() {
        let tail: f64 = (i + 1..k).map(|j| a[[i, j]] * z[j]).sum();
        z[i] = (b[i] - tail) / a[[i, i]];
    }

    Ok(z / &scale)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::panel::tests::observation;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;
    use rand::{Rng, SeedableRng, rngs::StdRng};

    const GAMMA: [f64; 8] = [0.005, -0.002, 0.003, 0.01, -0.004, -0.02, 0.006, -0.1];

    fn exact_cross_section(n: usize, seed: u64) -> Vec<Observation> {
        let mut rng = StdRng::seed_from_u64(seed);
        let date = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        (0..n)
            .map(|i| {
                let mut o = observation(i as i64, date);
                o.mktcap = rng.gen_range(10.0..1000.0);
                o.log_mktcap = rng.gen_range(2.0..8.0);
                o.log_bm = rng.gen_range(-2.0..1.0);
                o.op = rng.gen_range(-0.2..0.5);
                o.inv = rng.gen_range(-0.1..0.4);
                o.ret_excess = rng.gen_range(-0.2..0.2);
                o.momentum = rng.gen_range(-0.5..0.8);
                o.volatility = rng.gen_range(0.005..0.06);
                o.ret_excess_lead = GAMMA[0]
                    + Characteristic::all()
                        .iter()
                        .enumerate()
                        .map(|(j, &c)| GAMMA[j + 1] * o.value(c))
                        .sum::<f64>();
                o
            })
            .collect()
    }

    #[test]
    fn test_coefficient_names() {
        let names = CrossSectionRegression::coefficient_names();
        assert_eq!(names.len(), 8);
        assert_eq!(names[0], "Intercept");
        assert_eq!(names[7], "volatility");
    }

    #[test]
    fn test_recovers_exact_coefficients() {
        let section = exact_cross_section(50, 1);
        for method in [CrossSectionRegression::Ols, CrossSectionRegression::Wls] {
            let gamma = method.fit(&section).unwrap();
            for (estimate, truth) in gamma.iter().zip(GAMMA) {
                assert_relative_eq!(*estimate, truth, epsilon = 1e-8);
            }
        }
    }

    #[test]
    fn test_simple_line() {
        let x = Array2::from_shape_vec((4, 2), vec![1.0, 0.0, 1.0, 1.0, 1.0, 2.0, 1.0, 3.0]).unwrap();
        let y = Array1::from(vec![1.0, 3.0, 5.0, 7.0]);
        let b = least_squares(&x, &y, None).unwrap();
        assert_relative_eq!(b[0], 1.0, epsilon = 1e-12);
        assert_relative_eq!(b[1], 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_weights_shift_the_fit() {
        // y = 0, 0, 1 at x = 0, 1, 2; OLS slope 0.5, heavy weight on the
        // last point pulls the intercept up
        let x = Array2::from_shape_vec((3, 2), vec![1.0, 0.0, 1.0, 1.0, 1.0, 2.0]).unwrap();
        let y = Array1::from(vec![0.0, 0.0, 1.0]);
        let ols = least_squares(&x, &y, None).unwrap();
        assert_relative_eq!(ols[1], 0.5, epsilon = 1e-12);

        let w = Array1::from(vec![1.0, 1.0, 100.0]);
        let wls = least_squares(&x, &y, Some(&w)).unwrap();
        assert!(wls[1] > ols[1]);
    }

    #[test]
    fn test_singular_design() {
        let mut section = exact_cross_section(30, 2);
        for o in &mut section {
            o.inv = 2.0 * o.op;
        }
        assert!(matches!(
            CrossSectionRegression::Ols.fit(&section),
            Err(RegressionError::Singular)
        ));
    }

    #[test]
    fn test_too_few_observations() {
        let section = exact_cross_section(5, 3);
        assert!(matches!(
            CrossSectionRegression::Wls.fit(&section),
            Err(RegressionError::InsufficientObservations { required: 8, actual: 5 })
        ));
    }

    #[test]
    fn test_invalid_weights() {
        let mut section = exact_cross_section(20, 4);
        section[3].mktcap = 0.0;
        assert!(matches!(
            CrossSectionRegression::Wls.fit(&section),
            Err(RegressionError::InvalidWeights(_))
        ));
        assert!(CrossSectionRegression::Ols.fit(&section).is_ok());
    }
}
