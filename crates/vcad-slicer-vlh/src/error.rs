//! Error types for variable layer height planning.

use thiserror::Error;

/// Errors that can occur while building slicing parameters or profiles.
///
/// Only precondition violations are represented here (spec "Error Handling
/// Design": out-of-band edits, degenerate ranges, and oracle values outside
/// `(0, inf)` are silent no-ops/clamps, not errors).
#[derive(Error, Debug)]
pub enum VlhError {
    /// The object has non-positive Z height.
    #[error("object height must be positive, got {0}")]
    InvalidObjectHeight(f64),

    /// The nozzle diameter table is empty or a referenced extruder is out of range.
    #[error("malformed nozzle diameter table: {0}")]
    InvalidNozzleTable(String),

    /// Extruder index 0 ("active nozzle") was used but the nozzles have unequal diameters.
    #[error("extruder 0 requires all nozzle diameters to be equal, got {0:?}")]
    InconsistentNozzleDiameters(Vec<f64>),

    /// A layer-height range is non-monotone (`lo >= hi`) or has a non-positive height.
    #[error("invalid layer height range [{lo}, {hi}) @ {height}: {reason}")]
    InvalidRange {
        /// Range lower bound.
        lo: f64,
        /// Range upper bound.
        hi: f64,
        /// Range height.
        height: f64,
        /// Why the range was rejected.
        reason: String,
    },

    /// The resulting min/max layer height bounds are inconsistent (`min > max`).
    #[error("inconsistent layer height bounds: min={min} > max={max}")]
    InconsistentBounds {
        /// Computed minimum layer height.
        min: f64,
        /// Computed maximum layer height.
        max: f64,
    },
}

/// Result type for variable layer height operations.
pub type Result<T> = std::result::Result<T, VlhError>;
