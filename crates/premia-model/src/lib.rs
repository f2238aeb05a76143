#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/premia/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod covariance;
pub mod error;
pub mod fama_macbeth;
pub mod panel;
pub mod prepare;
pub mod regression;

// Re-export main types
pub use covariance::{CovarianceError, NeweyWestConfig, NeweyWestEstimator};
pub use error::{ModelError, Result};
pub use fama_macbeth::{FamaMacBeth, FamaMacBethConfig, FamaMacBethResult, PremiaSeries, RiskPremium};
pub use panel::{Observation, Panel};
pub use prepare::{PrepareConfig, SizeSubset, prepare_panel};
pub use regression::{CrossSectionRegression, RegressionError};
