//! Read-only projection of printer/object configuration.
//!
//! `ConfigView` is the input the Slicing Parameters Builder consumes. It is
//! deliberately a plain, serde-derived data record (the same shape as
//! `vcad_slicer::SliceSettings`) rather than something that reads files or
//! environment variables itself. Loading it from a project file or CLI
//! flags is the host application's job, not this crate's.

use serde::{Deserialize, Serialize};

use crate::error::{Result, VlhError};

/// A first-layer height declared either as an absolute value or as a
/// percentage of the nominal layer height, mirroring the "absolute or
/// relative" resolution rule in spec §4.1 step 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum FirstLayerHeight {
    /// An explicit height in millimetres. A value `<= 0.0` means "use nominal".
    Absolute(f64),
    /// A percentage of the nominal layer height, e.g. `75.0` for 75%.
    /// A value `<= 0.0` means "use nominal".
    Percent(f64),
}

impl Default for FirstLayerHeight {
    fn default() -> Self {
        FirstLayerHeight::Absolute(0.0)
    }
}

impl FirstLayerHeight {
    /// Resolve against the nominal layer height, per spec §4.1 step 1:
    /// a non-positive declared value falls back to `nominal`.
    pub fn resolve(&self, nominal: f64) -> f64 {
        match *self {
            FirstLayerHeight::Absolute(h) if h > 0.0 => h,
            FirstLayerHeight::Percent(p) if p > 0.0 => nominal * p / 100.0,
            _ => nominal,
        }
    }
}

/// Read-only projection of printer/object/material configuration.
///
/// Nozzle/min/max tables are indexed by `extruder - 1` for extruder indices
/// `1..=N`; extruder index `0` is the legal "use whichever nozzle is active"
/// wildcard described in spec §4.1 step 2.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigView {
    /// Nozzle diameter per extruder (mm), one entry per extruder.
    pub nozzle_diameter: Vec<f64>,
    /// Per-extruder minimum layer height (mm); `0.0` means "unset, use default".
    pub min_layer_height: Vec<f64>,
    /// Per-extruder maximum layer height (mm); `0.0` means "unset, use default".
    pub max_layer_height: Vec<f64>,
    /// Nominal (non-first) layer height (mm).
    pub layer_height: f64,
    /// First-layer height declaration.
    pub first_layer_height: FirstLayerHeight,
    /// Number of raft layers requested by the user (split into base/interface internally).
    pub raft_layers: u32,
    /// Extruder used for the raft's support body (0 = active nozzle).
    pub support_material_extruder: usize,
    /// Extruder used for the raft's interface/contact layers (0 = active nozzle).
    pub support_material_interface_extruder: usize,
    /// Air gap between raft/support and model (mm); `0.0` implies a soluble interface.
    pub support_contact_distance: f64,
    /// Whether support material generation is enabled for this print.
    pub support_material_enabled: bool,
    /// Extruder indices (1-based) the object itself is printed with.
    /// Empty means "unspecified", which falls back to extruder 0.
    pub object_extruders: Vec<usize>,
}

impl Default for ConfigView {
    fn default() -> Self {
        Self {
            nozzle_diameter: vec![0.4],
            min_layer_height: vec![0.0],
            max_layer_height: vec![0.0],
            layer_height: 0.2,
            first_layer_height: FirstLayerHeight::default(),
            raft_layers: 0,
            support_material_extruder: 1,
            support_material_interface_extruder: 1,
            support_contact_distance: 0.2,
            support_material_enabled: false,
            object_extruders: vec![1],
        }
    }
}

impl ConfigView {
    /// Validate the table shapes and nominal values.
    pub fn validate(&self) -> Result<()> {
        if self.nozzle_diameter.is_empty() {
            return Err(VlhError::InvalidNozzleTable(
                "nozzle_diameter table is empty".into(),
            ));
        }
        if self.nozzle_diameter.iter().any(|&d| d <= 0.0) {
            return Err(VlhError::InvalidNozzleTable(
                "nozzle diameters must be positive".into(),
            ));
        }
        if self.layer_height <= 0.0 {
            return Err(VlhError::InvalidNozzleTable(
                "layer_height must be positive".into(),
            ));
        }
        Ok(())
    }

    /// Resolve the nozzle diameter for an extruder index, handling the
    /// "extruder 0 means active nozzle" wrap from spec §4.1 step 2: all
    /// nozzles must then share a diameter, and the 0th entry is returned.
    pub fn nozzle_diameter_for(&self, extruder: usize) -> Result<f64> {
        if extruder == 0 {
            let first = self.nozzle_diameter[0];
            let all_equal = self
                .nozzle_diameter
                .iter()
                .all(|&d| (d - first).abs() < crate::EPSILON);
            if !all_equal {
                return Err(VlhError::InconsistentNozzleDiameters(
                    self.nozzle_diameter.clone(),
                ));
            }
            return Ok(first);
        }
        self.nozzle_diameter
            .get(extruder - 1)
            .copied()
            .ok_or_else(|| {
                VlhError::InvalidNozzleTable(format!(
                    "extruder {extruder} has no nozzle diameter entry"
                ))
            })
    }

    /// Whether the raft interface is soluble (support_contact_distance == 0).
    pub fn soluble_interface(&self) -> bool {
        self.support_contact_distance.abs() < crate::EPSILON
    }

    /// The extruder indices used by the object, falling back to `[0]` when unspecified.
    pub fn object_extruders_or_default(&self) -> Vec<usize> {
        if self.object_extruders.is_empty() {
            vec![0]
        } else {
            self.object_extruders.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_layer_height_falls_back_to_nominal() {
        assert_eq!(FirstLayerHeight::Absolute(0.0).resolve(0.2), 0.2);
        assert_eq!(FirstLayerHeight::Absolute(-1.0).resolve(0.2), 0.2);
        assert_eq!(FirstLayerHeight::Absolute(0.3).resolve(0.2), 0.3);
        assert_eq!(FirstLayerHeight::Percent(150.0).resolve(0.2), 0.3);
    }

    #[test]
    fn default_config_validates() {
        assert!(ConfigView::default().validate().is_ok());
    }

    #[test]
    fn empty_nozzle_table_rejected() {
        let cfg = ConfigView {
            nozzle_diameter: vec![],
            ..ConfigView::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn extruder_zero_requires_uniform_nozzles() {
        let cfg = ConfigView {
            nozzle_diameter: vec![0.4, 0.6],
            ..ConfigView::default()
        };
        assert!(cfg.nozzle_diameter_for(0).is_err());

        let cfg = ConfigView {
            nozzle_diameter: vec![0.4, 0.4],
            ..ConfigView::default()
        };
        assert_eq!(cfg.nozzle_diameter_for(0).unwrap(), 0.4);
    }
}
