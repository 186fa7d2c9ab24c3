use super::*;

fn region(sub: u32, n: u32) -> HeightmapRegion {
  HeightmapRegion {
    texel_base: UVec2::ZERO,
    subsection_size_quads: sub,
    num_subsections: n,
  }
}

#[test]
fn test_packed_height_channels() {
  let texel = HeightTexel { r: 0x12, g: 0x34 };
  assert_eq!(texel.packed(), 0x1234);
  assert_eq!(HeightTexel::from_packed(0xABCD), HeightTexel { r: 0xAB, g: 0xCD });
}

#[test]
fn test_midpoint_is_zero_height() {
  assert_eq!(HeightTexel::from_packed(32768).local_height(), 0.0);
  assert_eq!(HeightTexel::from_packed(32768 + 128).local_height(), 1.0);
  assert_eq!(HeightTexel::from_packed(32768 - 256).local_height(), -2.0);
}

#[test]
fn test_subsection_border_texels_are_skipped() {
  // Two subsections of 15 quads (16 texels each). Shared vertex 15 reads
  // subsection 1's first texel, which duplicates texel 15.
  let r = region(15, 2);
  assert_eq!(r.vertex_to_texel(0), 0);
  assert_eq!(r.vertex_to_texel(14), 14);
  assert_eq!(r.vertex_to_texel(15), 16);
  assert_eq!(r.vertex_to_texel(16), 17);
  assert_eq!(r.vertex_to_texel(30), 31);
}

#[test]
fn test_flat_cluster_bounds() {
  let image = HeightmapImage::flat(UVec2::splat(32), 32768 + 640);
  let bounds = region(15, 2).cluster_local_bounds(&image, UVec2::ZERO);
  assert_eq!(bounds.min(), Vec3::new(0.0, 0.0, 5.0));
  assert_eq!(bounds.max(), Vec3::new(16.0, 16.0, 5.0));
}

#[test]
fn test_last_cluster_clamps_to_tile_edge() {
  let image = HeightmapImage::flat(UVec2::splat(32), 32768);
  let bounds = region(15, 2).cluster_local_bounds(&image, UVec2::new(1, 1));
  assert_eq!(bounds.min(), Vec3::new(16.0, 16.0, 0.0));
  assert_eq!(bounds.max(), Vec3::new(30.0, 30.0, 0.0));
}

#[test]
fn test_cluster_bounds_follow_height_ramp() {
  // Height rises by one unit (128 steps) per texel along x.
  let size = UVec2::new(17, 17);
  let heights: Vec<u16> = (0..size.y)
    .flat_map(|_| (0..size.x).map(|x| 32768 + (x * 128) as u16))
    .collect();
  let image = HeightmapImage::from_packed(size, &heights);

  let bounds = region(16, 1).cluster_local_bounds(&image, UVec2::ZERO);
  assert_eq!(bounds.min().z, 0.0);
  assert_eq!(bounds.max().z, 16.0);
}

#[test]
fn test_sample_clamps_outside_texture() {
  let image = HeightmapImage::flat(UVec2::splat(4), 32768 + 128);
  let r = HeightmapRegion {
    texel_base: UVec2::splat(2),
    subsection_size_quads: 16,
    num_subsections: 1,
  };
  assert_eq!(r.sample_vertex(&image, 16, 16), Vec3::new(16.0, 16.0, 1.0));
}
