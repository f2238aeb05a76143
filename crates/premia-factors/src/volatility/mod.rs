//! Volatility characteristics and the volatility factor portfolio.
//!
//! `rolling` turns daily excess returns into the monthly `volatility`
//! regressor; `vol_factor` builds the high-minus-low volatility
//! factor-mimicking portfolio from the monthly panel.

pub mod rolling;
pub mod vol_factor;

pub use rolling::{RollingVolatility, VolatilityConfig};
pub use vol_factor::{PortfolioReturn, VolFactor, VolFactorConfig, VolFactorReturn};
