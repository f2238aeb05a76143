//! Quality characteristics.

pub mod operating_profitability;

pub use operating_profitability::operating_profitability;
