use super::*;
use crate::test_utils::TerrainFixture;
use glam::Vec3;

fn fixture() -> TerrainFixture {
  TerrainFixture::new(WorldId::from_raw(1), TerrainGuid::from_u128(9), UVec2::new(4, 4))
}

#[test]
fn test_submission_from_descriptor() {
  let desc = fixture().descriptor(IVec2::new(3, 2));
  let submission = TileSubmission::from_descriptor(&desc).expect("valid descriptor");

  assert_eq!(submission.coord, IVec2::new(3, 2));
  assert_eq!(submission.geometry.clusters_per_tile, 2);
  assert_eq!(submission.geometry.clusters_per_tile_sq(), 4);
  assert_eq!(submission.geometry.clusters_per_subsection(), 1.0);
  assert_eq!(submission.geometry.terrain_tile_count, 16);
  // 16-vertex subsections support LODs 0..=3.
  assert_eq!(submission.geometry.lod.last_lod, 3);
  assert_eq!(submission.key(), TileKey::new(desc.world, desc.terrain, IVec2::new(3, 2)));
}

#[test]
fn test_last_lod_clamped_to_cluster_lod_count() {
  let desc = fixture().with_subsections(63, 1).descriptor(IVec2::ZERO);
  let submission = TileSubmission::from_descriptor(&desc).expect("valid descriptor");
  assert_eq!(submission.geometry.clusters_per_tile, 4);
  assert_eq!(submission.geometry.lod.last_lod, CLUSTER_LOD_COUNT - 1);
}

#[test]
fn test_cluster_spanning_two_subsections() {
  // 7-quad subsections: one cluster covers both.
  let desc = fixture().with_subsections(7, 2).descriptor(IVec2::ZERO);
  let submission = TileSubmission::from_descriptor(&desc).expect("valid descriptor");
  assert_eq!(submission.geometry.clusters_per_tile, 1);
  assert_eq!(submission.geometry.clusters_per_subsection(), 0.5);
  assert_eq!(submission.geometry.lod.last_lod, 2);
}

#[test]
fn test_negative_section_base() {
  let desc = fixture().descriptor(IVec2::new(-1, -2));
  let submission = TileSubmission::from_descriptor(&desc).expect("valid descriptor");
  assert_eq!(submission.coord, IVec2::new(-1, -2));
}

#[test]
fn test_rejects_too_few_vertices() {
  let desc = fixture().with_subsections(7, 1).descriptor(IVec2::ZERO);
  assert_eq!(
    TileSubmission::from_descriptor(&desc),
    Err(TileDescriptorError::TooFewVertices {
      vertices: 8,
      cluster_size: 16
    })
  );
}

#[test]
fn test_rejects_unaligned_vertices() {
  let desc = fixture().with_subsections(19, 1).descriptor(IVec2::ZERO);
  assert!(matches!(
    TileSubmission::from_descriptor(&desc),
    Err(TileDescriptorError::NotClusterAligned { vertices: 20, .. })
  ));
}

#[test]
fn test_rejects_non_power_of_two_clusters() {
  let desc = fixture().with_subsections(15, 3).descriptor(IVec2::ZERO);
  assert_eq!(
    TileSubmission::from_descriptor(&desc),
    Err(TileDescriptorError::ClustersPerTileNotPowerOfTwo { clusters_per_tile: 3 })
  );
}

#[test]
fn test_rejects_empty_tile() {
  let desc = fixture().with_subsections(0, 2).descriptor(IVec2::ZERO);
  assert!(matches!(
    TileSubmission::from_descriptor(&desc),
    Err(TileDescriptorError::EmptyTile { .. })
  ));
}

#[test]
fn test_rejects_misaligned_section() {
  let mut desc = fixture().descriptor(IVec2::ZERO);
  desc.section_base = IVec2::new(5, 0);
  assert!(matches!(
    TileSubmission::from_descriptor(&desc),
    Err(TileDescriptorError::MisalignedSection { .. })
  ));
}

#[test]
fn test_sampled_bounds_are_world_space() {
  let f = fixture().with_scale(2.0);
  let (submission, bounds) = f.sampled(IVec2::new(1, 0));
  assert_eq!(bounds.clusters_per_tile(), submission.geometry.clusters_per_tile);
  assert_eq!(bounds.iter().count(), 4);

  // Tile (1, 0) starts at quad 30, scaled by 2.
  let first = bounds.get(0, 0);
  assert_eq!(first.min(), Vec3::new(60.0, 0.0, 0.0));
  assert_eq!(first.max(), Vec3::new(92.0, 32.0, 0.0));

  let last = bounds.get(1, 1);
  assert_eq!(last.max(), Vec3::new(120.0, 60.0, 0.0));

  let tile = bounds.tile_bounds();
  assert_eq!(tile.origin, Vec3::new(90.0, 30.0, 0.0));
  assert_eq!(tile.extent, Vec3::new(30.0, 30.0, 0.0));
}

#[test]
#[should_panic(expected = "cover the whole tile")]
fn test_from_bounds_requires_full_tile() {
  ClusterBoundsSet::from_bounds(2, vec![crate::bounds::Aabb::from_min_max(Vec3::ZERO, Vec3::ONE)]);
}
