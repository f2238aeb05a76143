#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/premia/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod dates;
pub mod error;
pub mod files;
pub mod frames;
pub mod records;
pub mod store;

pub use dates::{DateRange, add_months, month_start, parse_date};
pub use error::{DataError, Result};
pub use frames::{crsp_frame, date_column};
pub use records::{
    CompustatFundamentals, CompustatRecord, CrspRecord, DailyReturn, Exchange, SizeCategory,
};
pub use store::{PanelStore, StoreStats, database_path};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
