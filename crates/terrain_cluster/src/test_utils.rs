//! Test fixtures shared across module tests.
//!
//! Terrains are laid out on the XY plane with Z up; one quad is one world unit
//! unless a scale is given.

use glam::{Affine3A, IVec2, Mat4, Quat, UVec2, Vec3};

use crate::bounds::Aabb;
use crate::config::RenderConfig;
use crate::entity::TerrainRenderEntity;
use crate::geometry::ClusterGeometry;
use crate::heightmap::HeightmapImage;
use crate::lod::LodDistribution;
use crate::passes::PermutedPlanes;
use crate::submission::{ClusterBoundsSet, TileDescriptor, TileSubmission};
use crate::world::{TerrainGuid, WorldId};

// =============================================================================
// Tile descriptors
// =============================================================================

/// Tile geometry used by most tests: 2 subsections of 15 quads, giving
/// 32 vertices per edge and 2×2 clusters per tile.
pub const TEST_SUBSECTION_QUADS: u32 = 15;
pub const TEST_NUM_SUBSECTIONS: u32 = 2;
pub const TEST_CLUSTERS_PER_TILE: u32 = 2;

/// Builder for tile descriptors of one terrain.
#[derive(Clone, Debug)]
pub struct TerrainFixture {
  pub world: WorldId,
  pub terrain: TerrainGuid,
  pub subsection_size_quads: u32,
  pub num_subsections: u32,
  pub grid: UVec2,
  pub scale: f32,
  pub lod_distribution: LodDistribution,
}

impl TerrainFixture {
  pub fn new(world: WorldId, terrain: TerrainGuid, grid: UVec2) -> Self {
    Self {
      world,
      terrain,
      subsection_size_quads: TEST_SUBSECTION_QUADS,
      num_subsections: TEST_NUM_SUBSECTIONS,
      grid,
      scale: 1.0,
      lod_distribution: LodDistribution::default(),
    }
  }

  pub fn with_subsections(mut self, subsection_size_quads: u32, num_subsections: u32) -> Self {
    self.subsection_size_quads = subsection_size_quads;
    self.num_subsections = num_subsections;
    self
  }

  pub fn with_scale(mut self, scale: f32) -> Self {
    self.scale = scale;
    self
  }

  pub fn component_size_quads(&self) -> u32 {
    self.subsection_size_quads * self.num_subsections
  }

  pub fn tile_count(&self) -> u32 {
    self.grid.x * self.grid.y
  }

  /// Descriptor of the tile at grid coordinate `coord`.
  pub fn descriptor(&self, coord: IVec2) -> TileDescriptor {
    let size = self.component_size_quads() as i32;
    let section_base = coord * size;
    TileDescriptor {
      world: self.world,
      terrain: self.terrain,
      section_base,
      subsection_size_quads: self.subsection_size_quads,
      num_subsections: self.num_subsections,
      lod_distribution: self.lod_distribution,
      local_to_world: Affine3A::from_scale_rotation_translation(
        Vec3::splat(self.scale),
        Quat::IDENTITY,
        Vec3::new(section_base.x as f32, section_base.y as f32, 0.0) * self.scale,
      ),
      heightmap_texel_base: UVec2::ZERO,
      terrain_tile_count: self.tile_count(),
    }
  }

  /// All tile coordinates in raster order.
  pub fn coords(&self) -> Vec<IVec2> {
    (0..self.grid.y as i32)
      .flat_map(|y| (0..self.grid.x as i32).map(move |x| IVec2::new(x, y)))
      .collect()
  }

  /// Flat heightmap large enough for one tile.
  pub fn flat_heightmap(&self) -> HeightmapImage {
    let texels = (self.subsection_size_quads + 1) * self.num_subsections;
    HeightmapImage::flat(UVec2::splat(texels), 32768)
  }

  /// Submission record plus flat cluster bounds for `coord`.
  pub fn sampled(&self, coord: IVec2) -> (TileSubmission, ClusterBoundsSet) {
    let desc = self.descriptor(coord);
    let submission = TileSubmission::from_descriptor(&desc).expect("fixture descriptor is valid");
    let bounds = ClusterBoundsSet::sample(&desc, &submission, &self.flat_heightmap());
    (submission, bounds)
  }

  /// Render entity with every tile registered, in raster order, and buffers
  /// built.
  pub fn ready_entity(&self, config: &RenderConfig) -> TerrainRenderEntity {
    let mut entity: Option<TerrainRenderEntity> = None;
    for coord in self.coords() {
      let (tile, bounds) = self.sampled(coord);
      entity
        .get_or_insert_with(|| TerrainRenderEntity::new(&tile, config))
        .register_tile(&tile, bounds);
    }
    let mut entity = entity.expect("fixture has at least one tile");
    assert!(entity.is_ready());
    entity
      .update_all_gpu_buffers(&ClusterGeometry::new())
      .expect("fixture buffers are valid");
    entity
  }

  /// World-space extent of the whole terrain.
  pub fn world_bounds(&self) -> Aabb {
    let size = self.component_size_quads() as f32 * self.scale;
    Aabb::from_min_max(
      Vec3::ZERO,
      Vec3::new(self.grid.x as f32 * size, self.grid.y as f32 * size, 0.0),
    )
  }
}

// =============================================================================
// Cameras
// =============================================================================

/// Camera state for a right-handed, Z-up view.
pub struct TestCamera {
  pub origin: Vec3,
  pub view_projection: Mat4,
  pub projection: Mat4,
}

impl TestCamera {
  pub fn look_at(origin: Vec3, target: Vec3) -> Self {
    let projection = Mat4::perspective_rh(std::f32::consts::FRAC_PI_2, 1.0, 0.5, 100_000.0);
    let view = Mat4::look_at_rh(origin, target, Vec3::Z);
    Self {
      origin,
      view_projection: projection * view,
      projection,
    }
  }

  pub fn planes(&self) -> PermutedPlanes {
    PermutedPlanes::from_view_projection(&self.view_projection)
  }
}
