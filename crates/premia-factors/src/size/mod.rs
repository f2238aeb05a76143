//! Size characteristics and NYSE size buckets.

pub mod breakpoints;
pub mod log_market_cap;

pub use breakpoints::{SizeBreakpoints, SizeThresholds, classify_by_size};
pub use log_market_cap::log_market_cap;
