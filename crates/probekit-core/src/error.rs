//! Validation errors for the probe sequence model
//!
//! The G-code generator is deliberately permissive and emits whatever values
//! it is given; callers that want strict input checking run
//! [`crate::probe::validate_sequence`] first and surface these errors.
//!
//! All error types use `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Validation error for probe operations and movement steps
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    /// Probe travel distance must not be negative
    #[error("Probe operation {id}: distance must not be negative (got {distance})")]
    NegativeDistance {
        /// Id of the offending probe operation.
        id: String,
        /// The negative distance value.
        distance: f64,
    },

    /// Backoff distance must not be negative
    #[error("Probe operation {id}: backoff distance must not be negative (got {backoff})")]
    NegativeBackoff {
        /// Id of the offending probe operation.
        id: String,
        /// The negative backoff value.
        backoff: f64,
    },

    /// Feed rate must be strictly positive
    #[error("Probe operation {id}: feed rate must be positive (got {feed_rate})")]
    NonPositiveFeedRate {
        /// Id of the offending probe operation.
        id: String,
        /// The non-positive feed rate value.
        feed_rate: f64,
    },

    /// Dwell time must be strictly positive
    #[error("Movement step {id}: dwell time must be positive (got {seconds})")]
    NonPositiveDwell {
        /// Id of the offending movement step.
        id: String,
        /// The non-positive dwell time in seconds.
        seconds: f64,
    },

    /// A rapid movement step must carry between one and three axis words
    #[error("Movement step {id}: rapid move carries {count} axis values, expected 1 to 3")]
    BadAxisCount {
        /// Id of the offending movement step.
        id: String,
        /// The number of axis values present.
        count: usize,
    },
}
