//! Error types for the filtering and fitting pipeline
//!
//! This module defines the common errors encountered when preparing or
//! fitting grouped data, along with a convenient `Result` alias.
//!
//! Per-group fit failures are *not* errors: they become
//! [`crate::FitOutcome::NoFit`] so that sibling groups still render.
//! `Error` is reserved for caller mistakes and internal solver failures.

/// Errors that can occur while preparing data or computing a fit.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Cannot perform curve fitting because there is no usable data.
    #[error("No data available for fitting")]
    NoData,

    /// The requested polynomial degree is outside the supported 1..=3 range,
    /// or too high for the number of points in the group.
    #[error("Polynomial degree `{0}` is not supported for this dataset")]
    DegreeTooHigh(usize),

    /// An axis selection referenced a measurement column the dataset
    /// has never seen.
    #[error("Unknown measurement column `{0}`")]
    UnknownColumn(String),

    /// Logarithmic and power models are undefined at zero or below;
    /// the group's data must be normalized (zero-nudged) first.
    #[error("Fit family requires strictly positive inputs")]
    NonPositiveData,

    /// The nonlinear solver ran out of iterations or diverged.
    #[error("Nonlinear fit failed to converge")]
    NoConvergence,

    /// Failed to solve the algebraic system during fitting.
    ///
    /// Contains a static string describing the solver error.
    #[error("Failed to solve: {0}")]
    Algebra(&'static str),
}

/// Result type for the filtering and fitting pipeline
pub type Result<T> = std::result::Result<T, Error>;
