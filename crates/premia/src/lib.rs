#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/premia/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod import;
pub mod report;

// Re-export main types from sub-crates
pub use premia_data as data;
pub use premia_factors as factors;
pub use premia_model as model;
pub use premia_output as output;

pub use error::{PremiaError, Result};
pub use import::{ImportConfig, ImportSummary, import_panel, prepare_crsp};
pub use report::{REPORT_TITLE, report_document, report_from_panel, result_set, run_subset};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
