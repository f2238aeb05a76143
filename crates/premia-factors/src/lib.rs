#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/premia/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod fundamentals;
pub mod investment;
pub mod momentum;
pub mod quality;
pub mod registry;
pub mod size;
pub mod value;
pub mod volatility;

pub use error::{FactorError, Result};
pub use fundamentals::compustat_characteristics;

// Re-export registry types for convenience
pub use registry::{Characteristic, CharacteristicCategory, characteristics_by_category};
