//! Error type spanning the whole pipeline.

use thiserror::Error;

/// Result type for pipeline operations.
pub type Result<T> = std::result::Result<T, PremiaError>;

/// Errors raised while importing, estimating or reporting.
#[derive(Debug, Error)]
pub enum PremiaError {
    /// Reading or storing the panel failed
    #[error(transparent)]
    Data(#[from] premia_data::DataError),

    /// A characteristic could not be built
    #[error(transparent)]
    Factor(#[from] premia_factors::FactorError),

    /// Estimation failed
    #[error(transparent)]
    Model(#[from] premia_model::ModelError),

    /// A result table is malformed
    #[error(transparent)]
    Report(#[from] premia_output::ReportError),

    /// Exporting results failed
    #[error(transparent)]
    Export(#[from] premia_output::ExportError),
}
