//! Investment characteristics.

pub mod asset_growth;

pub use asset_growth::asset_growth;
