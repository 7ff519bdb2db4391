//! Layer Generator (spec §4.5): walks a profile into concrete layer intervals.

use crate::params::SlicingParameters;
use crate::profile::LayerHeightProfile;

/// A flat `[lo0, hi0, lo1, hi1, ...]` sequence of abutting layer intervals.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayerSequence(pub Vec<f64>);

impl LayerSequence {
    /// Number of layers.
    pub fn len(&self) -> usize {
        self.0.len() / 2
    }

    /// `true` if there are no layers.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The `(lo, hi)` interval of the `i`-th layer.
    pub fn layer(&self, i: usize) -> (f64, f64) {
        (self.0[i * 2], self.0[i * 2 + 1])
    }

    /// Iterate `(lo, hi)` pairs in bottom-to-top order.
    pub fn iter(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        (0..self.len()).map(move |i| self.layer(i))
    }

    fn push(&mut self, lo: f64, hi: f64) {
        self.0.push(lo);
        self.0.push(hi);
    }
}

/// Walk `profile` from bottom to top, emitting abutting layer intervals
/// whose union covers `params.object_print_z_height()`.
///
/// Each layer's height is sampled from the profile at its midpoint; per
/// spec §9 the final layer's top is not snapped to the object's exact top,
/// so a small under-coverage (< `min_layer_height`) is tolerated.
pub fn generate_layers(params: &SlicingParameters, profile: &LayerHeightProfile) -> LayerSequence {
    let object_height = params.object_print_z_height();
    let mut layers = LayerSequence::default();

    let mut print_z = if params.first_object_layer_height_fixed() {
        layers.push(0.0, params.first_object_layer_height);
        params.first_object_layer_height
    } else {
        0.0
    };

    loop {
        let mut slice_z = print_z + 0.5 * params.min_layer_height;
        let h = profile.height_at(slice_z);
        slice_z = print_z + 0.5 * h;
        if slice_z >= object_height {
            break;
        }
        layers.push(print_z, print_z + h);
        print_z += h;
    }

    layers
}
