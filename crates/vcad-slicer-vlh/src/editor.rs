//! Profile Editor (spec §4.4): localized Increase/Decrease/Reduce/Smooth
//! edits over a Z-band centered at a user-picked Z.

use std::f64::consts::PI;

use crate::params::SlicingParameters;
use crate::profile::LayerHeightProfile;
use crate::{EPSILON, RESAMPLE_STEP};

/// The four edit actions a user gesture can apply to a profile (spec §3).
///
/// This is a closed tagged variant by design (spec §9): adding a new action
/// means extending both the clamping dispatch (step 2) and the resampling
/// dispatch (step 3) below, there is no open extension point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditAction {
    /// Raise the height around `z`.
    Increase,
    /// Lower the height around `z`.
    Decrease,
    /// Move the height around `z` toward the nominal layer height.
    Reduce,
    /// Average the heights around `z` with their neighbours.
    Smooth,
}

/// Apply `action` to `profile` over a Z-band of width `band_width` centered
/// at `z`, with magnitude `delta`. Mutates `profile` in place; a no-op
/// (edit outside the variable window, or a sub-`EPSILON` change under
/// `Reduce`/`Smooth`) leaves it byte-for-byte unchanged.
pub fn adjust_profile(
    params: &SlicingParameters,
    profile: &mut LayerHeightProfile,
    z: f64,
    delta: f64,
    band_width: f64,
    action: EditAction,
) {
    let z_lo_var = if params.first_object_layer_height_fixed() {
        params.first_object_layer_height
    } else {
        0.0
    };
    let z_hi_var = params.object_print_z_height();

    if z < z_lo_var - EPSILON || z > z_hi_var + EPSILON {
        return; // Out-of-band edit: silent no-op (spec §7).
    }

    let old = profile.clone();
    let current = old.height_at(z);

    // Step 2: clamp the effective delta per action.
    let (signed_delta, reduce_magnitude) = match action {
        EditAction::Increase | EditAction::Decrease => {
            let raw = if action == EditAction::Decrease {
                -delta.abs()
            } else {
                delta.abs()
            };
            if raw > 0.0 {
                if current >= params.max_layer_height - EPSILON {
                    return;
                }
                (raw.min(params.max_layer_height - current), 0.0)
            } else {
                if current <= params.min_layer_height + EPSILON {
                    return;
                }
                (raw.max(params.min_layer_height - current), 0.0)
            }
        }
        EditAction::Reduce => {
            let target_diff = params.layer_height - current;
            let mag = delta.abs().min(target_diff.abs());
            if mag < EPSILON {
                return;
            }
            (0.0, mag)
        }
        EditAction::Smooth => {
            if delta.abs() < EPSILON {
                return;
            }
            (0.0, 0.0)
        }
    };

    // Step 3: resample the band.
    let lo = (z - band_width / 2.0).max(z_lo_var);
    let hi = z + band_width / 2.0; // deliberately not clipped to z_hi_var here
    let resample_hi = hi.min(z_hi_var);

    let n = old.key_point_count();
    let mut prefix_idx = 0usize;
    for k in 0..n {
        if old.z(k) <= lo + EPSILON {
            prefix_idx = k;
        } else {
            break;
        }
    }

    let mut buf: Vec<f64> = old.0[0..(prefix_idx + 1) * 2].to_vec();
    let resample_start_keypoint = buf.len() / 2;

    let mut zz = lo;
    loop {
        let h_old = old.height_at(zz);
        let w = cosine_weight(zz, z, band_width);

        let mut h_new = match action {
            EditAction::Increase | EditAction::Decrease => h_old + w * signed_delta,
            EditAction::Reduce => {
                let diff = h_old - params.layer_height;
                let step = w * reduce_magnitude;
                if diff.abs() > step {
                    h_old - step * diff.signum()
                } else {
                    params.layer_height
                }
            }
            EditAction::Smooth => h_old,
        };
        h_new = h_new.clamp(params.min_layer_height, params.max_layer_height);

        let skip = buf.len() >= 2 && (buf[buf.len() - 2] - zz).abs() < EPSILON;
        if !skip {
            buf.push(zz);
            buf.push(h_new);
        }

        if zz >= resample_hi - EPSILON {
            break;
        }
        zz = (zz + RESAMPLE_STEP).min(resample_hi);
    }

    let resample_end_keypoint = buf.len() / 2;

    if (resample_hi - z_hi_var).abs() < EPSILON {
        // Band reaches the top of the variable window: collapse a
        // zero-length duplicate at the very end, keeping the latest height.
        let m = buf.len();
        if m >= 4 && (buf[m - 4] - buf[m - 2]).abs() < EPSILON {
            buf.remove(m - 4);
            buf.remove(m - 4);
        }
    } else {
        // Append the untouched suffix of the old profile past the band.
        for k in 0..n {
            if old.z(k) > resample_hi + EPSILON {
                buf.push(old.z(k));
                buf.push(old.h(k));
            }
        }
    }

    *profile = LayerHeightProfile(buf);

    // Step 5: smooth pass, only for `Smooth`.
    if action == EditAction::Smooth {
        smooth_pass(
            profile,
            z,
            band_width,
            resample_start_keypoint,
            resample_end_keypoint,
            params.min_layer_height,
            params.max_layer_height,
        );
    }

    debug_assert_profile_sane(profile, params);
}

fn cosine_weight(zz: f64, z: f64, band_width: f64) -> f64 {
    if (zz - z).abs() < band_width / 2.0 {
        0.5 + 0.5 * (2.0 * PI * (zz - z) / band_width).cos()
    } else {
        0.0
    }
}

/// Six rounds of neighbour-averaging over the freshly resampled key-point
/// range `[i_start, i_end)`, each round reading a snapshot and writing into
/// the live profile (spec §4.4 step 5).
fn smooth_pass(
    profile: &mut LayerHeightProfile,
    z: f64,
    band_width: f64,
    i_start: usize,
    i_end: usize,
    min_h: f64,
    max_h: f64,
) {
    for _round in 0..6 {
        let snapshot = profile.clone();
        let kp_count = snapshot.key_point_count();
        let end = i_end.min(kp_count);
        for i in i_start..end {
            let zi = snapshot.z(i);
            let hi = snapshot.h(i);
            let t = if (zi - z).abs() < band_width / 2.0 {
                0.25 + 0.25 * (2.0 * PI * (zi - z) / band_width).cos()
            } else {
                0.0
            };
            let left = if i >= 1 { Some(snapshot.h(i - 1)) } else { None };
            let right = if i + 1 < kp_count {
                Some(snapshot.h(i + 1))
            } else {
                None
            };
            let neighbour_avg = match (left, right) {
                (Some(l), Some(r)) => (l + r) / 2.0,
                (Some(l), None) => l,
                (None, Some(r)) => r,
                (None, None) => hi,
            };
            let new_h = ((1.0 - t) * hi + t * neighbour_avg).clamp(min_h, max_h);
            profile.0[i * 2 + 1] = new_h;
        }
    }
}

/// Debug-only post-condition checks (spec §4.4 "Post-condition checks").
fn debug_assert_profile_sane(profile: &LayerHeightProfile, params: &SlicingParameters) {
    debug_assert!(profile.0.len() >= 4 && profile.0.len() % 2 == 0);
    let n = profile.key_point_count();
    for i in 0..n - 1 {
        debug_assert!(profile.z(i) <= profile.z(i + 1) + EPSILON, "profile Z must be monotone");
    }
    for i in 0..n {
        let h = profile.h(i);
        debug_assert!(
            h >= params.min_layer_height - EPSILON && h <= params.max_layer_height + EPSILON,
            "height out of bounds: {h}"
        );
    }
    debug_assert!((profile.last_z() - params.object_print_z_height()).abs() < EPSILON);
}
