#![warn(missing_docs)]

//! Variable layer height planning core for the vcad slicer.
//!
//! This crate turns printer/object configuration plus an optional set of
//! user-declared Z-ranges (or a mesh-driven adaptive pass) into a
//! [`profile::LayerHeightProfile`], lets a UI layer apply localized
//! [`editor::EditAction`] edits to that profile, and finally expands it into
//! concrete print layers with [`layers::generate_layers`].
//!
//! # Example
//!
//! ```ignore
//! use vcad_slicer_vlh::{ConfigView, plan_variable_layer_heights};
//!
//! let config = ConfigView::default();
//! let layers = plan_variable_layer_heights(&config, 20.0, &[1])?;
//! println!("Layers: {}", layers.len());
//! ```

pub mod config;
pub mod editor;
pub mod error;
pub mod heatmap;
pub mod layers;
pub mod mesh;
pub mod params;
pub mod profile;

pub use config::{ConfigView, FirstLayerHeight};
pub use editor::{adjust_profile, EditAction};
pub use error::{Result, VlhError};
pub use heatmap::generate_heatmap;
pub use layers::{generate_layers, LayerSequence};
pub use mesh::{MeshHeightOracle, TriangleMesh, TriangleMeshOracle};
pub use params::{build_slicing_parameters, SlicingParameters};
pub use profile::{
    profile_adaptive, profile_adaptive_with_tolerance, profile_from_ranges, LayerHeightProfile,
    LayerHeightRange, LayerHeightRangeSet,
};

/// Tolerance used throughout the crate for Z/height comparisons (mm).
pub const EPSILON: f64 = 1e-4;

/// Floor applied to any resolved minimum layer height (mm), matching the
/// smallest layer height practically extrudable through a standard nozzle.
pub const DEFAULT_MIN_LAYER_HEIGHT: f64 = 0.07;

/// Fraction of nozzle diameter used as the default maximum layer height
/// when a config doesn't declare one explicitly, and as the raft layer
/// height heuristic (spec §4.1 steps 5 and 8).
pub const MAX_LAYER_HEIGHT_RATIO: f64 = 0.75;

/// Z step used when resampling a profile band during an edit (spec §4.4).
pub const RESAMPLE_STEP: f64 = 0.1;

/// Build slicing parameters, a flat layer-height profile, and the resulting
/// layer sequence in one call, using only user-declared ranges (no mesh).
///
/// This is the facade most callers want when they have no mesh handy, or
/// want the non-adaptive Profile Editor flow; callers that need the
/// mesh-driven adaptive builder or want to apply [`EditAction`]s between
/// building the profile and generating layers should call
/// [`build_slicing_parameters`], [`profile_adaptive`] and
/// [`generate_layers`] directly instead.
pub fn plan_variable_layer_heights(
    config: &ConfigView,
    object_height: f64,
    object_extruders: &[usize],
) -> Result<LayerSequence> {
    let params = build_slicing_parameters(config, object_height, object_extruders)?;
    let profile = profile_from_ranges(&params, &LayerHeightRangeSet::new());
    profile.validate(&params)?;
    Ok(generate_layers(&params, &profile))
}
