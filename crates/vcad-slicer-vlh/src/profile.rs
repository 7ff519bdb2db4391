//! Layer-height profile type and the two profile builders (spec §4.2, §4.3).
//!
//! A profile is a flat sequence of key-points `[z0, h0, z1, h1, ...]` as
//! described in spec §3; segments interpolate linearly, but segments may
//! abut with a height step. `LayerHeightProfile` wraps `Vec<f64>` the same
//! way `vcad_slicer::path::Polygon` wraps `Vec<Point2>`: a thin newtype
//! with the invariant-preserving operations attached as methods.

use std::collections::BTreeMap;

use crate::error::{Result, VlhError};
use crate::mesh::MeshHeightOracle;
use crate::params::SlicingParameters;
use crate::EPSILON;

/// Default cusp tolerance for the adaptive profile builder (spec §4.3).
pub const DEFAULT_CUSP_TOLERANCE: f64 = 0.2;

/// A piecewise-linear layer-height profile: a flat `[z, h, z, h, ...]`
/// sequence satisfying the invariants in spec §3.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerHeightProfile(pub Vec<f64>);

impl LayerHeightProfile {
    /// Wrap a raw flat `[z, h, ...]` buffer without validating it.
    pub fn from_raw(data: Vec<f64>) -> Self {
        Self(data)
    }

    /// Number of key-points (`len() / 2`).
    pub fn key_point_count(&self) -> usize {
        self.0.len() / 2
    }

    /// The Z of the `i`-th key-point.
    pub fn z(&self, i: usize) -> f64 {
        self.0[i * 2]
    }

    /// The height of the `i`-th key-point.
    pub fn h(&self, i: usize) -> f64 {
        self.0[i * 2 + 1]
    }

    /// Last Z value in the profile (`object_print_z_height` when valid).
    pub fn last_z(&self) -> f64 {
        self.0[self.0.len() - 2]
    }

    /// Sample the height at `z` by locating its segment and linearly
    /// interpolating; if `z` is at or past the last key-point, returns the
    /// last height (spec §4.4 step 1).
    pub fn height_at(&self, z: f64) -> f64 {
        let n = self.key_point_count();
        if n == 0 {
            return 0.0;
        }
        if z <= self.z(0) {
            return self.h(0);
        }
        if z >= self.last_z() {
            return self.h(n - 1);
        }
        for i in 0..n - 1 {
            let (z0, z1) = (self.z(i), self.z(i + 1));
            if z >= z0 && z <= z1 {
                if (z1 - z0).abs() < EPSILON {
                    return self.h(i + 1);
                }
                let t = (z - z0) / (z1 - z0);
                return self.h(i) + t * (self.h(i + 1) - self.h(i));
            }
        }
        self.h(n - 1)
    }

    /// Validate the invariants from spec §3 against the given bounds.
    ///
    /// The pinned first-object-layer plateau is exempt from the
    /// `[min_layer_height, max_layer_height]` check when
    /// `params.first_object_layer_bridging` is set: that height is a
    /// bridging extrusion sized from nozzle diameter (spec §4.1 step 7),
    /// not an ordinary layer.
    pub fn validate(&self, params: &SlicingParameters) -> Result<()> {
        if self.0.len() < 4 || self.0.len() % 2 != 0 {
            return Err(VlhError::InvalidRange {
                lo: 0.0,
                hi: 0.0,
                height: 0.0,
                reason: "profile must have an even length >= 4".into(),
            });
        }
        let n = self.key_point_count();
        for i in 0..n - 1 {
            if self.z(i) > self.z(i + 1) + EPSILON {
                return Err(VlhError::InvalidRange {
                    lo: self.z(i),
                    hi: self.z(i + 1),
                    height: 0.0,
                    reason: "profile Z must be non-decreasing".into(),
                });
            }
        }
        if self.z(0).abs() > EPSILON {
            return Err(VlhError::InvalidRange {
                lo: self.z(0),
                hi: 0.0,
                height: 0.0,
                reason: "profile must start at Z=0".into(),
            });
        }
        if (self.last_z() - params.object_print_z_height()).abs() > EPSILON {
            return Err(VlhError::InvalidRange {
                lo: self.last_z(),
                hi: params.object_print_z_height(),
                height: 0.0,
                reason: "profile must end at object_print_z_height".into(),
            });
        }
        for i in 0..n {
            // The pinned first-object-layer plateau is exempt: under a
            // non-soluble raft (spec §4.1 step 7) its height is the mean
            // nozzle diameter, a deliberate bridging extrusion, not an
            // ordinary layer bounded by [min_layer_height, max_layer_height].
            if params.first_object_layer_bridging
                && self.z(i) <= params.first_object_layer_height + EPSILON
            {
                continue;
            }
            let h = self.h(i);
            if h < params.min_layer_height - EPSILON || h > params.max_layer_height + EPSILON {
                return Err(VlhError::InvalidRange {
                    lo: params.min_layer_height,
                    hi: params.max_layer_height,
                    height: h,
                    reason: "height out of [min_layer_height, max_layer_height]".into(),
                });
            }
        }
        Ok(())
    }
}

/// A user-declared layer-height range `[lo, hi) @ height`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayerHeightRange {
    /// Lower Z bound (inclusive).
    pub lo: f64,
    /// Upper Z bound (exclusive in intent; abutting ranges share this value).
    pub hi: f64,
    /// Height applied across `[lo, hi)`.
    pub height: f64,
}

/// An ordered set of ranges, sorted lexicographically by `(lo, hi)` as
/// required by spec §3.
#[derive(Debug, Clone, Default)]
pub struct LayerHeightRangeSet {
    ranges: BTreeMap<(OrderedF64, OrderedF64), f64>,
}

/// Thin wrapper making `f64` usable as a `BTreeMap` key; ranges are
/// well-formed application data (finite, non-NaN Z bounds), not arbitrary
/// floats, so total ordering is safe here.
#[derive(Debug, Clone, Copy, PartialEq)]
struct OrderedF64(f64);
impl Eq for OrderedF64 {}
impl Ord for OrderedF64 {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.partial_cmp(&other.0).unwrap_or(std::cmp::Ordering::Equal)
    }
}
impl PartialOrd for OrderedF64 {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl LayerHeightRangeSet {
    /// An empty range set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a range, keeping the set sorted by `(lo, hi)`.
    pub fn insert(&mut self, lo: f64, hi: f64, height: f64) -> Result<()> {
        if lo >= hi {
            return Err(VlhError::InvalidRange {
                lo,
                hi,
                height,
                reason: "lo must be < hi".into(),
            });
        }
        if height <= 0.0 {
            return Err(VlhError::InvalidRange {
                lo,
                hi,
                height,
                reason: "height must be positive".into(),
            });
        }
        self.ranges.insert((OrderedF64(lo), OrderedF64(hi)), height);
        Ok(())
    }

    /// Iterate ranges in lexicographic `(lo, hi)` order.
    pub fn iter(&self) -> impl Iterator<Item = LayerHeightRange> + '_ {
        self.ranges.iter().map(|(&(lo, hi), &height)| LayerHeightRange {
            lo: lo.0,
            hi: hi.0,
            height,
        })
    }
}

impl FromIterator<LayerHeightRange> for LayerHeightRangeSet {
    fn from_iter<I: IntoIterator<Item = LayerHeightRange>>(iter: I) -> Self {
        let mut set = Self::new();
        for r in iter {
            let _ = set.insert(r.lo, r.hi, r.height);
        }
        set
    }
}

/// Build a profile from user-declared ranges (spec §4.2).
///
/// The fixed first layer (if any) is an implicit, highest-priority range
/// `[0, first_object_layer_height]`. Later ranges are trimmed against
/// earlier ones; anything thinner than `EPSILON` after trimming is dropped.
/// Gaps default to the nominal height.
pub fn profile_from_ranges(
    params: &SlicingParameters,
    ranges: &LayerHeightRangeSet,
) -> LayerHeightProfile {
    let object_height = params.object_print_z_height();

    // Step 1: seed with the fixed first layer, if any.
    let mut trimmed: Vec<LayerHeightRange> = Vec::new();
    if params.first_object_layer_height_fixed() {
        trimmed.push(LayerHeightRange {
            lo: 0.0,
            hi: params.first_object_layer_height,
            height: params.first_object_layer_height,
        });
    }

    // Step 2: walk input ranges, trimming against the previous entry.
    for r in ranges.iter() {
        let mut lo = r.lo;
        let hi = r.hi.min(object_height);
        if let Some(last) = trimmed.last() {
            lo = lo.max(last.hi);
        }
        if lo + EPSILON < hi {
            trimmed.push(LayerHeightRange {
                lo,
                hi,
                height: r.height,
            });
        }
    }

    // Step 3: emit, filling gaps with nominal height. Each segment writes
    // both of its endpoints; abutting segments at different heights thus
    // get a doubled key-point (the "step" the data model allows).
    let mut profile = Vec::new();
    let mut last_z = 0.0_f64;

    for r in &trimmed {
        if r.lo > last_z + EPSILON {
            push_segment(&mut profile, last_z, r.lo, params.layer_height);
        }
        push_segment(&mut profile, r.lo, r.hi, r.height);
        last_z = r.hi;
    }

    if last_z < object_height - EPSILON || profile.is_empty() {
        push_segment(&mut profile, last_z, object_height, params.layer_height);
    }

    LayerHeightProfile(profile)
}

/// Append a constant-height segment `[lo, hi] @ height` to a flat profile buffer.
fn push_segment(buf: &mut Vec<f64>, lo: f64, hi: f64, height: f64) {
    buf.push(lo);
    buf.push(height);
    buf.push(hi);
    buf.push(height);
}

/// Build an adaptive profile from the Mesh Height Oracle (spec §4.3).
///
/// `ranges` is reserved for future use; the core adaptive path does not
/// currently consult it (per spec).
pub fn profile_adaptive<O: MeshHeightOracle>(
    params: &SlicingParameters,
    _ranges: &LayerHeightRangeSet,
    oracle: &mut O,
) -> LayerHeightProfile {
    profile_adaptive_with_tolerance(params, oracle, DEFAULT_CUSP_TOLERANCE)
}

/// As [`profile_adaptive`] but with an explicit cusp tolerance.
pub fn profile_adaptive_with_tolerance<O: MeshHeightOracle>(
    params: &SlicingParameters,
    oracle: &mut O,
    cusp_tolerance: f64,
) -> LayerHeightProfile {
    let object_height = params.object_print_z_height();
    let first_h = params.first_object_layer_height;

    // Step 1: seed.
    let mut profile = vec![0.0, first_h];
    if params.first_object_layer_height_fixed() {
        profile.push(first_h);
        profile.push(first_h);
    }

    // Step 2-3: walk upward, querying the oracle for each layer's height.
    let mut slice_z = first_h;
    let mut height = first_h;
    let mut facet_hint = 0usize;
    let mut guard = 0usize;
    let max_iterations = ((object_height / params.min_layer_height.max(EPSILON)) as usize) + 64;

    while slice_z - height <= object_height && guard < max_iterations {
        guard += 1;
        let h = oracle.cusp_height(slice_z, cusp_tolerance, &mut facet_hint);
        let h = h.clamp(params.min_layer_height, params.max_layer_height);
        profile.push(slice_z);
        profile.push(h);
        profile.push(slice_z + h);
        profile.push(h);
        slice_z += h;
        height = h;
    }

    // Step 4: trailing plateau back to the fixed first-object height.
    let last_z = profile[profile.len() - 2];
    if last_z < object_height {
        profile.push(last_z);
        profile.push(first_h);
        profile.push(object_height);
        profile.push(first_h);
    } else {
        // Force the exact top Z the invariants require.
        let len = profile.len();
        profile[len - 2] = object_height;
    }

    LayerHeightProfile(profile)
}
