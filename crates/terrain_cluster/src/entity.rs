//! Terrain Render Entity - GPU-side aggregate of one terrain.
//!
//! Tiles join one at a time, in any order. The entity grows a bounding
//! rectangle over their grid coordinates and, once the rectangle is dense and
//! anchored at the origin, rebuilds every cluster buffer in the linear layout
//! described in [`crate::constants`].

use std::collections::HashMap;

use bytemuck::Zeroable;
use glam::{IVec2, UVec2};

use crate::config::RenderConfig;
use crate::constants::{MAX_CLUSTERS_PER_AXIS, MAX_CLUSTER_COUNT};
use crate::error::GpuError;
use crate::geometry::ClusterGeometry;
use crate::gpu::{
  BufferUsage, ClusterInputRecord, DrawIndexedIndirectArgs, GpuBuffer, LodFieldLayout,
  PackedClusterRecord, ResourceAccess,
};
use crate::submission::{ClusterBoundsSet, TerrainGeometry, TileSubmission};
use crate::world::TerrainGuid;

// =============================================================================
// Tile rectangle
// =============================================================================

/// Bounding rectangle of registered tile coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TileRect {
  pub min: IVec2,
  /// Zero while no tile is registered.
  pub size: IVec2,
}

impl TileRect {
  #[inline]
  pub fn is_empty(&self) -> bool {
    self.size == IVec2::ZERO
  }

  #[inline]
  pub fn area(&self) -> u32 {
    (self.size.x * self.size.y) as u32
  }

  /// Bounding union with a single tile.
  pub fn grow(&mut self, coord: IVec2) {
    if self.is_empty() {
      self.min = coord;
      self.size = IVec2::ONE;
      return;
    }
    let max = (self.min + self.size - 1).max(coord);
    self.min = self.min.min(coord);
    self.size = max - self.min + 1;
  }

  pub fn from_coords(coords: impl IntoIterator<Item = IVec2>) -> Self {
    coords.into_iter().fold(Self::default(), |mut rect, c| {
      rect.grow(c);
      rect
    })
  }
}

// =============================================================================
// Cluster grid addressing
// =============================================================================

/// Cluster addressing for a dense tile grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClusterGrid {
  /// Clusters along one tile edge (power of two).
  pub clusters_per_tile: u32,
  /// Tiles along each axis.
  pub tile_grid: UVec2,
}

impl ClusterGrid {
  pub fn new(clusters_per_tile: u32, tile_grid: UVec2) -> Self {
    assert!(
      clusters_per_tile.is_power_of_two(),
      "clusters per tile must be a power of two, got {clusters_per_tile}"
    );
    Self {
      clusters_per_tile,
      tile_grid,
    }
  }

  /// Clusters along each axis of the whole terrain.
  #[inline]
  pub fn cluster_extent(&self) -> UVec2 {
    self.tile_grid * self.clusters_per_tile
  }

  #[inline]
  pub fn cluster_count(&self) -> u32 {
    let extent = self.cluster_extent();
    extent.x * extent.y
  }

  /// Linear buffer index of a global cluster coordinate.
  ///
  /// Coordinates outside the grid clamp to the nearest edge cluster, so
  /// neighbor lookups at the border read the border cluster itself.
  #[inline]
  pub fn linear_index(&self, cluster: IVec2) -> u32 {
    let cpt = self.clusters_per_tile;
    let max = self.cluster_extent().as_ivec2() - 1;
    let c = cluster.clamp(IVec2::ZERO, max).as_uvec2();

    let tile = c / cpt;
    let intra = c & UVec2::splat(cpt - 1);
    let cpt_sq = cpt * cpt;
    tile.y * cpt_sq * self.tile_grid.x + tile.x * cpt_sq + intra.y * cpt + intra.x
  }

  /// Inverse of [`linear_index`](Self::linear_index) for in-range indices.
  pub fn cluster_at(&self, index: u32) -> UVec2 {
    let cpt = self.clusters_per_tile;
    let cpt_sq = cpt * cpt;
    let tile = index / cpt_sq;
    let intra = index % cpt_sq;
    let tile = UVec2::new(tile % self.tile_grid.x, tile / self.tile_grid.x);
    tile * cpt + UVec2::new(intra % cpt, intra / cpt)
  }
}

// =============================================================================
// GPU buffers
// =============================================================================

/// Every buffer the three passes read or write, sized for one rebuild.
#[derive(Debug)]
pub struct ClusterBuffers {
  /// Per-cluster world bounds and indices.
  pub cluster_inputs: GpuBuffer<ClusterInputRecord>,
  /// Per-tile origin and radius, row-major tile order.
  pub tile_origins: GpuBuffer<[f32; 4]>,
  /// Per-cluster LOD written by classification.
  pub cluster_lods: GpuBuffer<u32>,
  /// Unordered visible records written by culling.
  pub visible_records: GpuBuffer<PackedClusterRecord>,
  /// Visible clusters per LOD bucket.
  pub lod_counts: GpuBuffer<u32>,
  /// Visible records ordered by LOD bucket; read by the vertex shader.
  pub ordered_records: GpuBuffer<PackedClusterRecord>,
  /// One argument block per LOD.
  pub indirect_args: GpuBuffer<DrawIndexedIndirectArgs>,
}

impl ClusterBuffers {
  fn allocate(
    inputs: Vec<ClusterInputRecord>,
    origins: Vec<[f32; 4]>,
    lod_count: u32,
    geometry: &ClusterGeometry,
  ) -> Result<Self, GpuError> {
    let clusters = inputs.len();
    let read_write = BufferUsage::SHADER_RESOURCE | BufferUsage::UNORDERED_ACCESS;
    let args = (0..lod_count)
      .map(|lod| {
        let range = geometry.lod_range(lod);
        DrawIndexedIndirectArgs {
          index_count: range.index_count,
          instance_count: 0,
          first_index: range.first_index,
          base_vertex: 0,
          first_instance: 0,
        }
      })
      .collect();

    Ok(Self {
      cluster_inputs: GpuBuffer::with_data(
        "terrain.cluster_inputs",
        BufferUsage::SHADER_RESOURCE,
        ResourceAccess::SrvCompute,
        inputs,
      )?,
      tile_origins: GpuBuffer::with_data(
        "terrain.tile_origins",
        BufferUsage::SHADER_RESOURCE,
        ResourceAccess::SrvCompute,
        origins,
      )?,
      cluster_lods: GpuBuffer::zeroed("terrain.cluster_lods", read_write, ResourceAccess::SrvCompute, clusters)?,
      visible_records: GpuBuffer::zeroed(
        "terrain.visible_records",
        read_write,
        ResourceAccess::SrvCompute,
        clusters,
      )?,
      lod_counts: GpuBuffer::zeroed(
        "terrain.lod_counts",
        read_write | BufferUsage::COPY_DEST,
        ResourceAccess::SrvCompute,
        lod_count as usize,
      )?,
      ordered_records: GpuBuffer::zeroed(
        "terrain.ordered_records",
        read_write,
        ResourceAccess::SrvGraphics,
        clusters,
      )?,
      indirect_args: GpuBuffer::with_data(
        "terrain.indirect_args",
        BufferUsage::INDIRECT_ARGS | BufferUsage::UNORDERED_ACCESS,
        ResourceAccess::IndirectArgs,
        args,
      )?,
    })
  }

  #[inline]
  pub fn cluster_count(&self) -> u32 {
    self.cluster_inputs.len() as u32
  }

  /// Number of LOD buckets (and indirect argument blocks).
  #[inline]
  pub fn lod_count(&self) -> u32 {
    self.lod_counts.len() as u32
  }
}

// =============================================================================
// TerrainRenderEntity
// =============================================================================

/// Aggregate render state of one terrain.
#[derive(Debug)]
pub struct TerrainRenderEntity {
  terrain: TerrainGuid,
  geometry: TerrainGeometry,
  layout: LodFieldLayout,
  tiles: HashMap<IVec2, ClusterBoundsSet>,
  rect: TileRect,
  buffers: Option<ClusterBuffers>,
  dirty: bool,
  rebuild_count: u64,
}

impl TerrainRenderEntity {
  /// Create an empty entity whose fixed geometry comes from `first`.
  pub fn new(first: &TileSubmission, config: &RenderConfig) -> Self {
    Self {
      terrain: first.terrain,
      geometry: first.geometry,
      layout: config.lod_field_layout(first.geometry.lod.last_lod),
      tiles: HashMap::new(),
      rect: TileRect::default(),
      buffers: None,
      dirty: false,
      rebuild_count: 0,
    }
  }

  /// Add one tile and grow the grid to include it.
  ///
  /// # Panics
  /// If the tile's geometry differs from the terrain's, its cluster bounds do
  /// not match the terrain's clusters per tile, or it is already registered.
  pub fn register_tile(&mut self, tile: &TileSubmission, clusters: ClusterBoundsSet) {
    assert_eq!(
      tile.geometry, self.geometry,
      "tile {} of terrain {} disagrees with the terrain's geometry",
      tile.coord, self.terrain
    );
    assert_eq!(
      clusters.clusters_per_tile(),
      self.geometry.clusters_per_tile,
      "tile {} carries bounds for the wrong cluster count",
      tile.coord
    );
    let previous = self.tiles.insert(tile.coord, clusters);
    assert!(previous.is_none(), "tile {} of terrain {} registered twice", tile.coord, self.terrain);

    self.rect.grow(tile.coord);
    self.dirty = true;
  }

  /// Remove one tile; the grid shrinks to the remaining tiles.
  ///
  /// # Panics
  /// If the tile is not registered.
  pub fn unregister_tile(&mut self, tile: &TileSubmission) {
    assert!(
      self.tiles.remove(&tile.coord).is_some(),
      "tile {} of terrain {} is not registered",
      tile.coord,
      self.terrain
    );
    self.rect = TileRect::from_coords(self.tiles.keys().copied());
    self.dirty = true;
  }

  #[inline]
  pub fn terrain(&self) -> TerrainGuid {
    self.terrain
  }

  #[inline]
  pub fn geometry(&self) -> &TerrainGeometry {
    &self.geometry
  }

  #[inline]
  pub fn layout(&self) -> LodFieldLayout {
    self.layout
  }

  #[inline]
  pub fn registered_tile_count(&self) -> u32 {
    self.tiles.len() as u32
  }

  #[inline]
  pub fn tile_rect(&self) -> TileRect {
    self.rect
  }

  #[inline]
  pub fn is_dirty(&self) -> bool {
    self.dirty
  }

  /// Number of buffer rebuilds performed so far.
  #[inline]
  pub fn rebuild_count(&self) -> u64 {
    self.rebuild_count
  }

  /// Every tile the terrain expects is registered.
  ///
  /// Grid shape is checked by [`Self::update_all_gpu_buffers`], so a complete
  /// but malformed terrain fails loudly instead of being skipped.
  pub fn is_ready(&self) -> bool {
    let count = self.registered_tile_count();
    count > 0 && count == self.geometry.terrain_tile_count
  }

  /// Cluster addressing for the current grid.
  pub fn grid(&self) -> ClusterGrid {
    ClusterGrid::new(self.geometry.clusters_per_tile, self.rect.size.max(IVec2::ZERO).as_uvec2())
  }

  /// Linear buffer index of a global cluster coordinate (clamped to the grid).
  #[inline]
  pub fn linear_index_by_cluster_index(&self, cluster: IVec2) -> u32 {
    self.grid().linear_index(cluster)
  }

  #[inline]
  pub fn buffers(&self) -> Option<&ClusterBuffers> {
    self.buffers.as_ref()
  }

  #[inline]
  pub fn buffers_mut(&mut self) -> Option<&mut ClusterBuffers> {
    self.buffers.as_mut()
  }

  /// Reallocate every buffer from the registered tiles when dirty.
  ///
  /// Returns whether a rebuild happened.
  ///
  /// # Panics
  /// If the grid is not dense, not anchored at the origin, or exceeds the
  /// cluster budget.
  pub fn update_all_gpu_buffers(&mut self, geometry: &ClusterGeometry) -> Result<bool, GpuError> {
    if !self.dirty || self.tiles.is_empty() {
      return Ok(false);
    }

    let tile_count = self.registered_tile_count();
    assert_eq!(
      tile_count,
      self.rect.area(),
      "terrain {} grid {} is not dense ({} tiles registered)",
      self.terrain,
      self.rect.size,
      tile_count
    );
    assert_eq!(
      self.rect.min,
      IVec2::ZERO,
      "terrain {} grid must be anchored at tile (0, 0)",
      self.terrain
    );

    let grid = self.grid();
    let extent = grid.cluster_extent();
    assert!(
      extent.x <= MAX_CLUSTERS_PER_AXIS && extent.y <= MAX_CLUSTERS_PER_AXIS,
      "terrain {} spans {} clusters, beyond {} per axis",
      self.terrain,
      extent,
      MAX_CLUSTERS_PER_AXIS
    );
    let cluster_count = grid.cluster_count();
    assert!(cluster_count <= MAX_CLUSTER_COUNT);

    // Release before reallocating.
    self.buffers = None;

    let cpt = grid.clusters_per_tile;
    let mut inputs = vec![ClusterInputRecord::zeroed(); cluster_count as usize];
    let mut origins = Vec::with_capacity(tile_count as usize);
    for ty in 0..grid.tile_grid.y {
      for tx in 0..grid.tile_grid.x {
        let Some(clusters) = self.tiles.get(&IVec2::new(tx as i32, ty as i32)) else {
          panic!("dense grid of terrain {} is missing tile ({tx}, {ty})", self.terrain);
        };
        origins.push(clusters.tile_bounds().origin_radius());

        for cy in 0..cpt {
          for cx in 0..cpt {
            let global = UVec2::new(tx * cpt + cx, ty * cpt + cy);
            let index = grid.linear_index(global.as_ivec2());
            inputs[index as usize] =
              ClusterInputRecord::new(clusters.get(cx, cy), UVec2::new(cx, cy), UVec2::new(tx, ty));
          }
        }
      }
    }

    let lod_count = self.geometry.lod.last_lod + 1;
    self.buffers = Some(ClusterBuffers::allocate(inputs, origins, lod_count, geometry)?);
    self.dirty = false;
    self.rebuild_count += 1;

    tracing::info!(
      terrain = %self.terrain,
      tiles = tile_count,
      clusters = cluster_count,
      lods = lod_count,
      "rebuilt cluster buffers"
    );
    Ok(true)
  }
}

#[cfg(test)]
#[path = "entity_test.rs"]
mod entity_test;
