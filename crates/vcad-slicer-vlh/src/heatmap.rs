//! Heatmap Encoder (spec §4.7, auxiliary): renders a layer sequence into a
//! row-major RGBA byte grid colour-mapped by layer height, plus an optional
//! half-resolution companion grid for a lower level of detail.

use std::f64::consts::PI;

use crate::layers::LayerSequence;
use crate::params::SlicingParameters;

/// The 8-stop green -> yellow -> red diverging palette (spec GLOSSARY).
const PALETTE: [[u8; 3]; 8] = [
    [0x1A, 0x98, 0x50],
    [0x66, 0xBD, 0x63],
    [0xA6, 0xD9, 0x6A],
    [0xD9, 0xF1, 0xEB],
    [0xFE, 0xE6, 0xEB],
    [0xFD, 0xAE, 0x61],
    [0xF4, 0x6D, 0x43],
    [0xD7, 0x30, 0x27],
];

/// Fill `buffer` (and, if present, `lod2`) with an RGBA heatmap of `layers`
/// under `params`. `lod2`, if given, is assumed sized for half the rows and
/// half the columns of the main grid (rounded down).
///
/// Returns the number of cells actually filled in the main grid; if
/// `buffer` is too small to hold `rows * cols` RGBA cells, only as many
/// complete cells as fit are written.
pub fn generate_heatmap(
    params: &SlicingParameters,
    layers: &LayerSequence,
    buffer: &mut [u8],
    rows: usize,
    cols: usize,
    lod2: Option<&mut [u8]>,
) -> usize {
    let filled = fill_grid(params, layers, buffer, rows, cols);
    if let Some(lod2_buf) = lod2 {
        let half_rows = rows / 2;
        let half_cols = cols / 2;
        fill_grid(params, layers, lod2_buf, half_rows, half_cols);
    }
    filled
}

fn fill_grid(
    params: &SlicingParameters,
    layers: &LayerSequence,
    buffer: &mut [u8],
    rows: usize,
    cols: usize,
) -> usize {
    if rows == 0 || cols == 0 || layers.is_empty() {
        return 0;
    }

    let object_height = params.object_print_z_height();
    let height_range = (params.max_layer_height - params.min_layer_height).max(crate::EPSILON);

    let mut filled = 0usize;
    let mut prev_row_last: Option<[u8; 4]> = None;

    for r in 0..rows {
        let mut cursor = 0usize; // Z resets every row; each row scans the same Z range.
        let mut this_row_last: Option<[u8; 4]> = None;
        for c in 0..cols {
            let color = if r > 0 && c == 0 {
                prev_row_last.expect("previous row wrote at least one cell")
            } else {
                let z = if cols == 1 {
                    0.0
                } else {
                    c as f64 * object_height / (cols - 1) as f64
                };
                while cursor + 1 < layers.len() && layers.layer(cursor).1 < z {
                    cursor += 1;
                }
                let (lo, hi) = layers.layer(cursor);
                let h = (hi - lo).max(crate::EPSILON);
                let mid = (lo + hi) / 2.0;
                let intensity = (0.7 * PI * (mid - z) / h).cos();

                let normalized = ((h - params.layer_height) / height_range).clamp(-1.0, 1.0);
                let palette_idx = (((normalized + 1.0) / 2.0) * (PALETTE.len() - 1) as f64)
                    .round()
                    .clamp(0.0, (PALETTE.len() - 1) as f64) as usize;
                let base = PALETTE[palette_idx];

                let shade = 0.5 + 0.5 * intensity;
                [
                    (base[0] as f64 * shade).clamp(0.0, 255.0) as u8,
                    (base[1] as f64 * shade).clamp(0.0, 255.0) as u8,
                    (base[2] as f64 * shade).clamp(0.0, 255.0) as u8,
                    255,
                ]
            };
            this_row_last = Some(color);

            let offset = (r * cols + c) * 4;
            if offset + 4 > buffer.len() {
                return filled;
            }
            buffer[offset] = color[0];
            buffer[offset + 1] = color[1];
            buffer[offset + 2] = color[2];
            buffer[offset + 3] = color[3];
            filled += 1;
        }
        prev_row_last = this_row_last;
    }

    filled
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigView;
    use crate::params::build_slicing_parameters;
    use crate::profile::profile_from_ranges;
    use crate::profile::LayerHeightRangeSet;

    fn flat_layers() -> (SlicingParameters, LayerSequence) {
        let cfg = ConfigView {
            nozzle_diameter: vec![0.4],
            min_layer_height: vec![0.1],
            max_layer_height: vec![0.3],
            layer_height: 0.2,
            first_layer_height: crate::config::FirstLayerHeight::Absolute(0.2),
            raft_layers: 0,
            support_material_extruder: 1,
            support_material_interface_extruder: 1,
            support_contact_distance: 0.2,
            support_material_enabled: false,
            object_extruders: vec![1],
        };
        let params = build_slicing_parameters(&cfg, 10.0, &[1]).unwrap();
        let profile = profile_from_ranges(&params, &LayerHeightRangeSet::new());
        let layers = crate::layers::generate_layers(&params, &profile);
        (params, layers)
    }

    #[test]
    fn fills_every_cell_when_buffer_is_large_enough() {
        let (params, layers) = flat_layers();
        let mut buf = vec![0u8; 8 * 8 * 4];
        let filled = generate_heatmap(&params, &layers, &mut buf, 8, 8, None);
        assert_eq!(filled, 64);
        // Every alpha channel must be 255.
        for c in buf.chunks(4) {
            assert_eq!(c[3], 255);
        }
    }

    #[test]
    fn truncates_gracefully_when_buffer_too_small() {
        let (params, layers) = flat_layers();
        let mut buf = vec![0u8; 4 * 4]; // room for 4 cells, grid wants 16
        let filled = generate_heatmap(&params, &layers, &mut buf, 4, 4, None);
        assert_eq!(filled, 4);
    }

    #[test]
    fn lod2_grid_is_filled_independently() {
        let (params, layers) = flat_layers();
        let mut buf = vec![0u8; 8 * 8 * 4];
        let mut lod2 = vec![0u8; 4 * 4 * 4];
        let filled = generate_heatmap(&params, &layers, &mut buf, 8, 8, Some(&mut lod2));
        assert_eq!(filled, 64);
        assert!(lod2.chunks(4).all(|c| c[3] == 255));
    }
}
