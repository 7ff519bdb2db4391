//! Slicing Parameters Builder.
//!
//! Turns a [`ConfigView`] plus an object Z-height into the immutable
//! [`SlicingParameters`] record every other stage (profile builder, editor,
//! layer generator) consumes.

use crate::config::ConfigView;
use crate::error::{Result, VlhError};
use crate::{DEFAULT_MIN_LAYER_HEIGHT, EPSILON, MAX_LAYER_HEIGHT_RATIO};

/// Immutable slicing parameters derived from a [`ConfigView`] and an object height.
///
/// See spec §3 "SlicingParameters" for the field-by-field contract.
#[derive(Debug, Clone, PartialEq)]
pub struct SlicingParameters {
    /// Nominal layer height.
    pub layer_height: f64,
    /// Hard lower bound on layer height.
    pub min_layer_height: f64,
    /// Hard upper bound on layer height.
    pub max_layer_height: f64,
    /// Height of the very first printed layer (may sit on raft or bed).
    pub first_print_layer_height: f64,
    /// Height of the first *object* layer above any raft.
    pub first_object_layer_height: f64,
    /// Whether the first object layer is printed as a bridge.
    pub first_object_layer_bridging: bool,
    /// Number of base raft layers.
    pub base_raft_layers: u32,
    /// Number of interface raft layers.
    pub interface_raft_layers: u32,
    /// Height of each base raft layer.
    pub base_raft_layer_height: f64,
    /// Height of each interface raft layer.
    pub interface_raft_layer_height: f64,
    /// Height of the raft contact layer.
    pub contact_raft_layer_height: f64,
    /// Whether the contact raft layer is printed as a bridge.
    pub contact_raft_layer_height_bridging: bool,
    /// Running Z top of the base raft stratum.
    pub raft_base_top_z: f64,
    /// Running Z top of the interface raft stratum.
    pub raft_interface_top_z: f64,
    /// Running Z top of the contact raft stratum.
    pub raft_contact_top_z: f64,
    /// Air gap between raft and object.
    pub gap_raft_object: f64,
    /// Air gap between object and support.
    pub gap_object_support: f64,
    /// Air gap between support and object.
    pub gap_support_object: f64,
    /// Whether the raft interface is soluble.
    pub soluble_interface: bool,
    /// Minimum Z of the object portion of the print.
    pub object_print_z_min: f64,
    /// Maximum Z of the object portion of the print.
    pub object_print_z_max: f64,
}

impl SlicingParameters {
    /// Height of the object portion of the print (`object_print_z_max - object_print_z_min`).
    pub fn object_print_z_height(&self) -> f64 {
        self.object_print_z_max - self.object_print_z_min
    }

    /// `true` if any raft stratum (base or interface) is present.
    pub fn has_raft(&self) -> bool {
        self.base_raft_layers + self.interface_raft_layers > 0
    }

    /// Total raft layer count, including the contact layer when present.
    ///
    /// When `base_raft_layers + interface_raft_layers == 1` the single raft
    /// stratum doubles as the contact layer (spec §4.1 step 8's "exactly one
    /// raft layer total" case), so the total is `1`, not `2`.
    pub fn raft_layers(&self) -> u32 {
        let split = self.base_raft_layers + self.interface_raft_layers;
        if split == 0 {
            0
        } else if split == 1 {
            1
        } else {
            split + 1
        }
    }

    /// `true` when the first object layer's height is pinned (cannot be
    /// freely chosen by the profile), i.e. there is a raft, or the first
    /// print layer height differs from nominal.
    pub fn first_object_layer_height_fixed(&self) -> bool {
        self.has_raft() || (self.first_print_layer_height - self.layer_height).abs() >= EPSILON
    }
}

/// Build [`SlicingParameters`] from a config view, object Z-height, and the
/// extruder indices the object itself uses.
///
/// Fails only on precondition violations (spec §7): non-positive object
/// height or a malformed nozzle table.
pub fn build_slicing_parameters(
    config: &ConfigView,
    object_height: f64,
    object_extruders: &[usize],
) -> Result<SlicingParameters> {
    config.validate()?;
    if object_height <= 0.0 {
        return Err(VlhError::InvalidObjectHeight(object_height));
    }

    // Step 1: resolve first layer height.
    let first_layer_height = config.first_layer_height.resolve(config.layer_height);

    // Step 2: nozzle diameter lookups (validates the extruder-0 wrap eagerly).
    let support_dmr = config.nozzle_diameter_for(config.support_material_extruder)?;
    let interface_support_dmr =
        config.nozzle_diameter_for(config.support_material_interface_extruder)?;

    // Step 3.
    let soluble_interface = config.soluble_interface();

    // Step 4: seed.
    let layer_height = config.layer_height;
    let mut first_print_layer_height = first_layer_height;
    let mut first_object_layer_height = first_layer_height;
    let mut first_object_layer_bridging = false;
    let mut object_print_z_min = 0.0_f64;
    let mut object_print_z_max = object_height;
    let mut base_raft_layers = config.raft_layers;

    // Step 5: min/max layer height bounds across used extruders.
    let object_extruders = if object_extruders.is_empty() {
        config.object_extruders_or_default()
    } else {
        object_extruders.to_vec()
    };
    let mut used_extruders = object_extruders.clone();
    if config.support_material_enabled || config.raft_layers > 0 {
        used_extruders.push(config.support_material_extruder);
        used_extruders.push(config.support_material_interface_extruder);
    }
    if used_extruders.is_empty() {
        used_extruders.push(0);
    }

    let mut min_layer_height = f64::INFINITY;
    let mut max_layer_height = 0.0_f64;
    for &e in &used_extruders {
        let dmr = config.nozzle_diameter_for(e)?;
        let raw_min = raw_table_value(&config.min_layer_height, e);
        let raw_max = raw_table_value(&config.max_layer_height, e);
        let mn = DEFAULT_MIN_LAYER_HEIGHT.max(if raw_min > 0.0 {
            raw_min
        } else {
            DEFAULT_MIN_LAYER_HEIGHT
        });
        let mx_candidate = if raw_max > 0.0 {
            raw_max
        } else {
            MAX_LAYER_HEIGHT_RATIO * dmr
        };
        let mx = mn.max(mx_candidate);
        min_layer_height = min_layer_height.min(mn);
        max_layer_height = max_layer_height.max(mx);
    }
    if !min_layer_height.is_finite() {
        min_layer_height = DEFAULT_MIN_LAYER_HEIGHT;
    }
    // Widen so min <= nominal <= max.
    min_layer_height = min_layer_height.min(layer_height);
    max_layer_height = max_layer_height.max(layer_height);
    if min_layer_height > max_layer_height {
        return Err(VlhError::InconsistentBounds {
            min: min_layer_height,
            max: max_layer_height,
        });
    }

    // Step 6: support gaps.
    let (gap_raft_object, gap_object_support, gap_support_object) = if soluble_interface {
        (0.0, 0.0, 0.0)
    } else {
        (
            config.support_contact_distance,
            config.support_contact_distance,
            config.support_contact_distance,
        )
    };

    // Step 7 + 8: raft assembly.
    let mut interface_raft_layers = 0u32;
    let mut base_raft_layer_height = 0.0;
    let mut interface_raft_layer_height = 0.0;
    let mut contact_raft_layer_height = 0.0;
    let mut contact_raft_layer_height_bridging = false;
    let mut raft_base_top_z = 0.0;
    let mut raft_interface_top_z = 0.0;
    let mut raft_contact_top_z = 0.0;

    if base_raft_layers > 0 {
        interface_raft_layers = (base_raft_layers + 1) / 2;
        base_raft_layers -= interface_raft_layers;

        base_raft_layer_height = layer_height.max(MAX_LAYER_HEIGHT_RATIO * support_dmr);
        interface_raft_layer_height =
            layer_height.max(MAX_LAYER_HEIGHT_RATIO * interface_support_dmr);
        contact_raft_layer_height = layer_height.max(MAX_LAYER_HEIGHT_RATIO * interface_support_dmr);
        contact_raft_layer_height_bridging = true;

        if !soluble_interface {
            let mean_dmr: f64 = {
                let mut sum = 0.0;
                for &e in &object_extruders {
                    sum += config.nozzle_diameter_for(e)?;
                }
                sum / object_extruders.len() as f64
            };
            // A bridging first object layer is a deliberate exception to
            // max_layer_height: LayerHeightProfile::validate exempts any
            // pinned plateau at this height when first_object_layer_bridging
            // is set, so it is not clamped here.
            first_object_layer_height = mean_dmr;
            first_object_layer_bridging = true;
        }

        let split = base_raft_layers + interface_raft_layers;
        if split == 1 {
            // Single raft stratum doubles as the contact layer.
            contact_raft_layer_height = first_print_layer_height;
            raft_contact_top_z = first_print_layer_height;
            raft_base_top_z = 0.0;
            raft_interface_top_z = 0.0;
            base_raft_layers = 0;
            interface_raft_layers = 0;
        } else {
            raft_base_top_z = if base_raft_layers > 0 {
                first_print_layer_height
                    + (base_raft_layers as f64 - 1.0) * base_raft_layer_height
            } else {
                first_print_layer_height
            };
            raft_interface_top_z = if interface_raft_layers > 0 {
                raft_base_top_z
                    + (interface_raft_layers as f64 - 1.0) * interface_raft_layer_height
            } else {
                raft_base_top_z
            };
            raft_contact_top_z = raft_interface_top_z + contact_raft_layer_height;
        }

        // Lift the object above the raft + air gap.
        object_print_z_min = raft_contact_top_z + gap_raft_object;
        object_print_z_max += object_print_z_min;
    }

    Ok(SlicingParameters {
        layer_height,
        min_layer_height,
        max_layer_height,
        first_print_layer_height,
        first_object_layer_height,
        first_object_layer_bridging,
        base_raft_layers,
        interface_raft_layers,
        base_raft_layer_height,
        interface_raft_layer_height,
        contact_raft_layer_height,
        contact_raft_layer_height_bridging,
        raft_base_top_z,
        raft_interface_top_z,
        raft_contact_top_z,
        gap_raft_object,
        gap_object_support,
        gap_support_object,
        soluble_interface,
        object_print_z_min,
        object_print_z_max,
    })
}

/// Read `table[extruder - 1]` (or `table[0]` for the extruder-0 wildcard),
/// treating a missing entry as `0.0` ("unset").
fn raw_table_value(table: &[f64], extruder: usize) -> f64 {
    let idx = extruder.saturating_sub(1);
    table.get(idx).copied().unwrap_or(0.0)
}
