//! Tile submission records.
//!
//! The engine describes a tile with a [`TileDescriptor`]. The submission side
//! turns it into an immutable [`TileSubmission`] (plus, when registering, the
//! tile's sampled [`ClusterBoundsSet`]) which crosses to the render side by
//! value and is consumed exactly once.

use glam::{Affine3A, IVec2, UVec2};

use crate::bounds::{Aabb, BoxSphereBounds};
use crate::constants::{CLUSTER_LOD_COUNT, CLUSTER_QUAD_SIZE};
use crate::error::TileDescriptorError;
use crate::heightmap::{HeightSource, HeightmapRegion};
use crate::lod::{LodDistribution, LodSettings};
use crate::world::{TerrainGuid, TileKey, WorldId};

/// Engine-side description of one terrain tile.
#[derive(Clone, Debug)]
pub struct TileDescriptor {
  pub world: WorldId,
  pub terrain: TerrainGuid,
  /// Tile origin on the terrain's quad grid.
  pub section_base: IVec2,
  pub subsection_size_quads: u32,
  pub num_subsections: u32,
  pub lod_distribution: LodDistribution,
  pub local_to_world: Affine3A,
  /// Heightmap texel holding tile vertex (0, 0).
  pub heightmap_texel_base: UVec2,
  /// Number of tiles the whole terrain is made of.
  pub terrain_tile_count: u32,
}

impl TileDescriptor {
  #[inline]
  pub fn component_size_quads(&self) -> u32 {
    self.subsection_size_quads * self.num_subsections
  }

  pub fn heightmap_region(&self) -> HeightmapRegion {
    HeightmapRegion {
      texel_base: self.heightmap_texel_base,
      subsection_size_quads: self.subsection_size_quads,
      num_subsections: self.num_subsections,
    }
  }
}

/// Per-terrain geometry that every tile of a terrain must agree on.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TerrainGeometry {
  pub num_subsections: u32,
  pub subsection_size_quads: u32,
  /// Clusters along one tile edge; always a power of two.
  pub clusters_per_tile: u32,
  pub lod: LodSettings,
  pub terrain_tile_count: u32,
}

impl TerrainGeometry {
  #[inline]
  pub fn clusters_per_tile_sq(&self) -> u32 {
    self.clusters_per_tile * self.clusters_per_tile
  }

  /// Cluster count of one subsection edge (fractional when a cluster spans
  /// more than one subsection).
  pub fn clusters_per_subsection(&self) -> f32 {
    self.clusters_per_tile as f32 / self.num_subsections as f32
  }
}

/// Immutable record of one tile, sent from the submission side.
#[derive(Clone, Debug, PartialEq)]
pub struct TileSubmission {
  pub world: WorldId,
  pub terrain: TerrainGuid,
  /// Tile coordinate on the terrain's tile grid.
  pub coord: IVec2,
  pub geometry: TerrainGeometry,
}

impl TileSubmission {
  /// Validate a descriptor and derive its submission record.
  pub fn from_descriptor(desc: &TileDescriptor) -> Result<Self, TileDescriptorError> {
    let sub = desc.subsection_size_quads;
    let n = desc.num_subsections;
    if sub == 0 || n == 0 {
      return Err(TileDescriptorError::EmptyTile {
        subsection_size_quads: sub,
        num_subsections: n,
      });
    }

    let vertices = (sub + 1) * n;
    if vertices < CLUSTER_QUAD_SIZE {
      return Err(TileDescriptorError::TooFewVertices {
        vertices,
        cluster_size: CLUSTER_QUAD_SIZE,
      });
    }
    if vertices % CLUSTER_QUAD_SIZE != 0 {
      return Err(TileDescriptorError::NotClusterAligned {
        vertices,
        cluster_size: CLUSTER_QUAD_SIZE,
      });
    }
    let clusters_per_tile = vertices / CLUSTER_QUAD_SIZE;
    if !clusters_per_tile.is_power_of_two() {
      return Err(TileDescriptorError::ClustersPerTileNotPowerOfTwo { clusters_per_tile });
    }

    let size = desc.component_size_quads() as i32;
    if desc.section_base.x.rem_euclid(size) != 0 || desc.section_base.y.rem_euclid(size) != 0 {
      return Err(TileDescriptorError::MisalignedSection {
        section_base: desc.section_base,
        component_size_quads: size as u32,
      });
    }

    // Subsections of 2^k - 1 quads support k - 1 coarser LODs.
    let subsection_max_lod = (sub + 1).next_power_of_two().trailing_zeros().saturating_sub(1);
    let last_lod = subsection_max_lod.min(CLUSTER_LOD_COUNT - 1);

    Ok(Self {
      world: desc.world,
      terrain: desc.terrain,
      coord: desc.section_base.div_euclid(IVec2::splat(size)),
      geometry: TerrainGeometry {
        num_subsections: n,
        subsection_size_quads: sub,
        clusters_per_tile,
        lod: LodSettings::new(&desc.lod_distribution, last_lod),
        terrain_tile_count: desc.terrain_tile_count,
      },
    })
  }

  pub fn key(&self) -> TileKey {
    TileKey::new(self.world, self.terrain, self.coord)
  }
}

/// World-space bounds of every cluster in one tile, row-major inside the tile.
#[derive(Clone, Debug, PartialEq)]
pub struct ClusterBoundsSet {
  clusters_per_tile: u32,
  bounds: Vec<Aabb>,
}

impl ClusterBoundsSet {
  /// Sample the heightmap once and transform each cluster's local box to world
  /// space.
  pub fn sample(desc: &TileDescriptor, submission: &TileSubmission, source: &(impl HeightSource + ?Sized)) -> Self {
    let cpt = submission.geometry.clusters_per_tile;
    let region = desc.heightmap_region();
    let bounds = (0..cpt)
      .flat_map(|cy| (0..cpt).map(move |cx| UVec2::new(cx, cy)))
      .map(|cluster| region.cluster_local_bounds(source, cluster).transformed(&desc.local_to_world))
      .collect();
    Self {
      clusters_per_tile: cpt,
      bounds,
    }
  }

  /// Build from precomputed bounds.
  ///
  /// # Panics
  /// If `clusters_per_tile` is zero or `bounds.len()` is not
  /// `clusters_per_tile²`.
  pub fn from_bounds(clusters_per_tile: u32, bounds: Vec<Aabb>) -> Self {
    assert!(clusters_per_tile > 0, "a tile holds at least one cluster");
    assert_eq!(
      bounds.len(),
      (clusters_per_tile * clusters_per_tile) as usize,
      "cluster bounds must cover the whole tile"
    );
    Self {
      clusters_per_tile,
      bounds,
    }
  }

  #[inline]
  pub fn clusters_per_tile(&self) -> u32 {
    self.clusters_per_tile
  }

  /// Bound of intra-tile cluster `(x, y)`.
  #[inline]
  pub fn get(&self, x: u32, y: u32) -> &Aabb {
    &self.bounds[(y * self.clusters_per_tile + x) as usize]
  }

  pub fn iter(&self) -> impl Iterator<Item = &Aabb> {
    self.bounds.iter()
  }

  /// Union of all cluster bounds, as a box and sphere.
  pub fn tile_bounds(&self) -> BoxSphereBounds {
    let union = self.bounds[1..]
      .iter()
      .fold(self.bounds[0], |acc, b| acc.union(b));
    BoxSphereBounds::from(union)
  }
}

#[cfg(test)]
#[path = "submission_test.rs"]
mod submission_test;
