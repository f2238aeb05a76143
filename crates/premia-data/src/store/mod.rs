//! Persistent storage for the monthly panel.

pub mod sqlite;

pub use sqlite::{PanelStore, StoreStats, database_path};
