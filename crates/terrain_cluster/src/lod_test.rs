use super::*;

fn settings(last_lod: u32) -> LodSettings {
  LodSettings::new(&LodDistribution::default(), last_lod)
}

#[test]
fn test_ladder_is_strictly_decreasing() {
  let s = settings(4);
  for lod in 0..4 {
    assert!(
      s.threshold(lod) > s.threshold(lod + 1),
      "threshold({}) = {} must exceed threshold({}) = {}",
      lod,
      s.threshold(lod),
      lod + 1,
      s.threshold(lod + 1)
    );
  }
}

#[test]
fn test_ladder_parameters() {
  let s = settings(4);
  assert!((s.lod0_screen_size_sq - 0.25).abs() < 1e-6);
  assert!((s.lod1_screen_size_sq - 0.16).abs() < 1e-6);
  assert!((s.falloff_sq - 9.0).abs() < 1e-6);
  // LOD2 is one falloff below LOD1, not two.
  assert!((s.threshold(2) - 0.16 / 9.0).abs() < 1e-7);
}

#[test]
fn test_distribution_is_floored() {
  let s = LodSettings::new(
    &LodDistribution {
      lod0_screen_size: 1.0,
      lod0_distribution: 0.5,
      lod_distribution: 1.0,
    },
    4,
  );
  let expected = (1.0 / MIN_LOD_DISTRIBUTION) * (1.0 / MIN_LOD_DISTRIBUTION);
  assert!((s.lod1_screen_size_sq - expected).abs() < 1e-6);
  assert!(s.threshold(3) < s.threshold(2));
}

#[test]
fn test_threshold_equality_keeps_finer_lod() {
  let s = settings(4);
  assert_eq!(s.select_lod(s.threshold(1)), 0);
  assert_eq!(s.select_lod(s.threshold(2)), 1);
  assert_eq!(s.select_lod(s.threshold(3)), 2);

  assert_eq!(s.select_lod(s.threshold(1) * 0.999), 1);
  assert_eq!(s.select_lod(s.threshold(2) * 0.999), 2);
}

#[test]
fn test_select_clamps_to_last_lod() {
  assert_eq!(settings(4).select_lod(0.0), 4);
  assert_eq!(settings(2).select_lod(0.0), 2);
  assert_eq!(settings(0).select_lod(0.0), 0);
  assert_eq!(settings(4).select_lod(f32::MAX), 0);
}

#[test]
#[should_panic(expected = "exceeds cluster LOD count")]
fn test_last_lod_out_of_range_panics() {
  settings(CLUSTER_LOD_COUNT);
}

#[test]
fn test_screen_size_shrinks_with_distance() {
  let projection = Mat4::perspective_rh(std::f32::consts::FRAC_PI_2, 1.0, 0.1, 10_000.0);
  let terms = ProjectionTerms::from_projection(&projection);
  let origin = Vec3::ZERO;

  let mut previous = f32::MAX;
  for step in 1..200 {
    let view = Vec3::new(0.0, step as f32 * 25.0, 0.0);
    let size = screen_size_squared(origin, 50.0, view, &terms);
    assert!(size <= previous, "screen size grew at distance {}", step as f32 * 25.0);
    previous = size;
  }
}

/// LOD index never decreases as the camera backs away from a fixed bound.
#[test]
fn test_lod_is_monotonic_in_distance() {
  let projection = Mat4::perspective_rh(1.0, 16.0 / 9.0, 0.1, 100_000.0);
  let terms = ProjectionTerms::from_projection(&projection);
  let s = settings(4);

  let mut previous_lod = 0;
  let mut seen_coarsest = false;
  for step in 0..2000 {
    let view = Vec3::new(step as f32 * 10.0, 0.0, 30.0);
    let lod = s.select_lod(screen_size_squared(Vec3::ZERO, 64.0, view, &terms));
    assert!(lod >= previous_lod, "LOD went from {} to {} at step {}", previous_lod, lod, step);
    previous_lod = lod;
    seen_coarsest |= lod == 4;
  }
  assert!(seen_coarsest, "far camera should reach the last LOD");
}

#[test]
fn test_camera_inside_sphere_is_lod0() {
  let projection = Mat4::perspective_rh(1.0, 1.0, 0.1, 1000.0);
  let terms = ProjectionTerms::from_projection(&projection);
  let size = screen_size_squared(Vec3::ZERO, 10.0, Vec3::ZERO, &terms);
  assert_eq!(settings(4).select_lod(size), 0);
}

#[test]
fn test_projection_terms_from_perspective() {
  let projection = Mat4::perspective_rh(std::f32::consts::FRAC_PI_2, 2.0, 0.1, 100.0);
  let terms = ProjectionTerms::from_projection(&projection);
  assert!((terms.scale_y - 1.0).abs() < 1e-6);
  assert!((terms.scale_x - 0.5).abs() < 1e-6);
  assert_eq!(terms.w_scale, -1.0);
}
