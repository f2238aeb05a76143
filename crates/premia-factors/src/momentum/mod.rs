//! Momentum characteristics - measures of trend persistence
//!
//! The regressions use the classic 12-1 momentum: the cumulative excess
//! return over the eleven months ending one month before the observation.

pub mod twelve_one;

pub use twelve_one::{Momentum, MomentumConfig};
