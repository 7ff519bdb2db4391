use approx::assert_abs_diff_eq;
use vcad_slicer_vlh::{
    adjust_profile, build_slicing_parameters, generate_layers, profile_from_ranges, ConfigView,
    EditAction, FirstLayerHeight, LayerHeightRangeSet,
};

fn config(first_layer: f64, nominal: f64, min: f64, max: f64) -> ConfigView {
    ConfigView {
        nozzle_diameter: vec![0.4],
        min_layer_height: vec![min],
        max_layer_height: vec![max],
        layer_height: nominal,
        first_layer_height: FirstLayerHeight::Absolute(first_layer),
        raft_layers: 0,
        support_material_extruder: 1,
        support_material_interface_extruder: 1,
        support_contact_distance: 0.2,
        support_material_enabled: false,
        object_extruders: vec![1],
    }
}

#[test]
fn s1_no_raft_no_ranges_tiles_the_full_height() {
    // first_layer == nominal here so the first object layer is not pinned;
    // every layer (including the first) samples the flat 0.2 profile.
    let cfg = config(0.2, 0.2, 0.1, 0.3);
    let params = build_slicing_parameters(&cfg, 10.0, &[1]).unwrap();
    let profile = profile_from_ranges(&params, &LayerHeightRangeSet::new());
    assert_eq!(profile.0, vec![0.0, 0.2, 10.0, 0.2]);

    let layers = generate_layers(&params, &profile);
    assert_eq!(layers.layer(0), (0.0, 0.2));
    let (lo1, hi1) = layers.layer(1);
    assert_abs_diff_eq!(lo1, 0.2, epsilon = 1e-6);
    assert_abs_diff_eq!(hi1, 0.4, epsilon = 1e-6);
    let (_, hi_last) = layers.layer(layers.len() - 1);
    assert_abs_diff_eq!(hi_last, 10.0, epsilon = 1e-6);
    // Count may differ by one depending on midpoint rounding (spec S1).
    assert!((48..=50).contains(&layers.len()));
}

#[test]
fn s2_fixed_first_layer_is_emitted_then_nominal_resumes() {
    let cfg = config(0.3, 0.2, 0.1, 0.3);
    let params = build_slicing_parameters(&cfg, 1.5, &[1]).unwrap();
    let profile = profile_from_ranges(&params, &LayerHeightRangeSet::new());
    let layers = generate_layers(&params, &profile);

    assert_eq!(layers.layer(0), (0.0, 0.3));
    let (lo1, hi1) = layers.layer(1);
    assert_abs_diff_eq!(lo1, 0.3, epsilon = 1e-6);
    assert!((hi1 - lo1 - 0.2).abs() < 1e-6);
}

#[test]
fn s3_one_range_produces_three_plateaus() {
    let cfg = config(0.2, 0.2, 0.1, 0.3);
    let params = build_slicing_parameters(&cfg, 5.0, &[1]).unwrap();
    let mut ranges = LayerHeightRangeSet::new();
    ranges.insert(1.0, 2.0, 0.1).unwrap();
    let profile = profile_from_ranges(&params, &ranges);
    profile.validate(&params).unwrap();

    assert_abs_diff_eq!(profile.height_at(0.5), 0.2, epsilon = 1e-6);
    assert_abs_diff_eq!(profile.height_at(1.5), 0.1, epsilon = 1e-6);
    assert_abs_diff_eq!(profile.height_at(3.0), 0.2, epsilon = 1e-6);
}

#[test]
fn s4_overlapping_ranges_trim_the_later_one() {
    let cfg = config(0.2, 0.2, 0.1, 0.3);
    let params = build_slicing_parameters(&cfg, 5.0, &[1]).unwrap();
    let mut ranges = LayerHeightRangeSet::new();
    ranges.insert(1.0, 3.0, 0.1).unwrap();
    ranges.insert(2.0, 4.0, 0.25).unwrap();
    let profile = profile_from_ranges(&params, &ranges);
    profile.validate(&params).unwrap();

    assert_abs_diff_eq!(profile.height_at(1.5), 0.1, epsilon = 1e-6);
    assert_abs_diff_eq!(profile.height_at(2.5), 0.1, epsilon = 1e-6);
    assert_abs_diff_eq!(profile.height_at(3.5), 0.25, epsilon = 1e-6);
    assert_abs_diff_eq!(profile.height_at(4.5), 0.2, epsilon = 1e-6);
}

#[test]
fn s5_increase_edit_rises_at_center_and_decays_outward() {
    let cfg = config(0.2, 0.2, 0.1, 0.3);
    let params = build_slicing_parameters(&cfg, 10.0, &[1]).unwrap();
    let mut profile = profile_from_ranges(&params, &LayerHeightRangeSet::new());

    adjust_profile(&params, &mut profile, 5.0, 0.05, 2.0, EditAction::Increase);
    profile.validate(&params).unwrap();

    let center = profile.height_at(5.0);
    let near = profile.height_at(4.0).max(profile.height_at(6.0));
    let far_low = profile.height_at(3.9);
    let far_high = profile.height_at(6.1);

    assert!(center > 0.24 && center <= 0.30 + 1e-6, "center={center}");
    assert!(near < center);
    assert_abs_diff_eq!(far_low, 0.2, epsilon = 1e-6);
    assert_abs_diff_eq!(far_high, 0.2, epsilon = 1e-6);

    for i in 0..profile.key_point_count() {
        assert!(profile.h(i) <= 0.3 + 1e-6);
    }
}

#[test]
fn s6_smooth_edit_reduces_oscillation_without_moving_endpoints() {
    let cfg = config(0.2, 0.2, 0.1, 0.3);
    let params = build_slicing_parameters(&cfg, 10.0, &[1]).unwrap();
    let mut profile = vcad_slicer_vlh::LayerHeightProfile::from_raw(vec![
        0.0, 0.2, 4.0, 0.2, 4.0, 0.3, 4.5, 0.1, 5.0, 0.3, 5.5, 0.1, 6.0, 0.3, 6.0, 0.2, 10.0, 0.2,
    ]);
    profile.validate(&params).unwrap();

    let spread_before = stddev_in_window(&profile, 4.0, 6.0);
    adjust_profile(&params, &mut profile, 5.0, 1.0, 2.0, EditAction::Smooth);
    profile.validate(&params).unwrap();
    let spread_after = stddev_in_window(&profile, 4.0, 6.0);

    assert!(
        spread_after <= spread_before * 0.5,
        "before={spread_before} after={spread_after}"
    );
    assert_abs_diff_eq!(profile.z(0), 0.0, epsilon = 1e-6);
    assert_abs_diff_eq!(profile.last_z(), 10.0, epsilon = 1e-6);
}

fn stddev_in_window(
    profile: &vcad_slicer_vlh::LayerHeightProfile,
    lo: f64,
    hi: f64,
) -> f64 {
    let mut samples = Vec::new();
    for i in 0..profile.key_point_count() {
        let z = profile.z(i);
        if z >= lo && z <= hi {
            samples.push(profile.h(i));
        }
    }
    let mean = samples.iter().sum::<f64>() / samples.len() as f64;
    let variance =
        samples.iter().map(|h| (h - mean).powi(2)).sum::<f64>() / samples.len() as f64;
    variance.sqrt()
}
