use super::*;
use glam::Vec3;

fn view_projection() -> Mat4 {
  let projection = Mat4::perspective_rh(std::f32::consts::FRAC_PI_2, 1.0, 0.5, 100_000.0);
  let view = Mat4::look_at_rh(Vec3::ZERO, Vec3::X, Vec3::Z);
  projection * view
}

fn box_at(center: Vec3, half: f32) -> Aabb {
  Aabb {
    center,
    extent: Vec3::splat(half),
  }
}

#[test]
fn test_mip_chain_keeps_furthest_depth() {
  let depth: Vec<f32> = (0..16).map(|i| i as f32 / 16.0).collect();
  let hzb = Hzb::from_depth(UVec2::new(4, 4), &depth);
  assert_eq!(hzb.mip_count(), 3);
  assert_eq!(hzb.mips[1].size, UVec2::new(2, 2));
  assert_eq!(hzb.mips[1].get(0, 0), 5.0 / 16.0);
  assert_eq!(hzb.mips[2].get(0, 0), 15.0 / 16.0);
}

#[test]
fn test_odd_sizes_reduce_to_one_texel() {
  let hzb = Hzb::filled(UVec2::new(5, 3), 0.5);
  assert_eq!(hzb.mips.last().map(|m| m.size), Some(UVec2::ONE));
  assert_eq!(hzb.mips[1].size, UVec2::new(3, 2));
}

#[test]
fn test_box_behind_near_wall_is_occluded() {
  // Depth 0.5 is about one unit in front of the camera.
  let hzb = Hzb::filled(UVec2::new(64, 64), 0.5);
  assert!(!hzb.is_box_visible(&box_at(Vec3::new(100.0, 0.0, 0.0), 2.0), &view_projection()));
}

#[test]
fn test_box_in_front_of_far_depth_is_visible() {
  let hzb = Hzb::filled(UVec2::new(64, 64), 1.0);
  assert!(hzb.is_box_visible(&box_at(Vec3::new(100.0, 0.0, 0.0), 2.0), &view_projection()));
}

#[test]
fn test_box_crossing_near_plane_is_visible() {
  let hzb = Hzb::filled(UVec2::new(64, 64), 0.0);
  assert!(hzb.is_box_visible(&box_at(Vec3::ZERO, 5.0), &view_projection()));
}

#[test]
fn test_hole_in_depth_reveals_box() {
  // Near wall everywhere except a far hole in the middle of the screen.
  let size = UVec2::new(64, 64);
  let mut depth = vec![0.5; 64 * 64];
  for y in 24..40 {
    for x in 24..40 {
      depth[y * 64 + x] = 1.0;
    }
  }
  let hzb = Hzb::from_depth(size, &depth);
  assert!(hzb.is_box_visible(&box_at(Vec3::new(100.0, 0.0, 0.0), 2.0), &view_projection()));
  assert!(!hzb.is_box_visible(&box_at(Vec3::new(100.0, 60.0, 0.0), 2.0), &view_projection()));
}
