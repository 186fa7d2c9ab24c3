//! Heightmap sampling for initial cluster bounds.
//!
//! Heights arrive as two 8-bit channels forming one 16-bit value
//! (`R << 8 | G`), centred on `HEIGHT_MIDPOINT`. They are read exactly once per
//! tile, on the submission side, to derive each cluster's local bounding box.
//!
//! A tile with several subsections stores a duplicated border column/row per
//! subsection in the heightmap, so tile vertex `v` lives at texel
//! `s * (sub + 1) + (v - s * sub)` where `s` is the subsection containing `v`.

use glam::{UVec2, Vec3};

use crate::bounds::Aabb;
use crate::constants::{CLUSTER_QUAD_SIZE, HEIGHT_MIDPOINT, HEIGHT_SCALE};

/// One heightmap texel (only the two height channels).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HeightTexel {
  pub r: u8,
  pub g: u8,
}

impl HeightTexel {
  #[inline]
  pub fn from_packed(height: u16) -> Self {
    Self {
      r: (height >> 8) as u8,
      g: (height & 0xFF) as u8,
    }
  }

  #[inline]
  pub fn packed(self) -> u16 {
    (self.r as u16) << 8 | self.g as u16
  }

  /// Height in tile-local units.
  #[inline]
  pub fn local_height(self) -> f32 {
    (self.packed() as f32 - HEIGHT_MIDPOINT) * HEIGHT_SCALE
  }
}

/// Heightmap sampling collaborator.
pub trait HeightSource {
  /// Texture size in texels.
  fn size(&self) -> UVec2;

  /// Texel at `(x, y)`; callers keep coordinates inside [`size`](Self::size).
  fn texel(&self, x: u32, y: u32) -> HeightTexel;
}

/// CPU-resident heightmap image.
#[derive(Clone, Debug)]
pub struct HeightmapImage {
  size: UVec2,
  texels: Vec<HeightTexel>,
}

impl HeightmapImage {
  /// # Panics
  /// If `texels.len()` does not match `size`.
  pub fn new(size: UVec2, texels: Vec<HeightTexel>) -> Self {
    assert_eq!(
      texels.len(),
      (size.x * size.y) as usize,
      "heightmap texel count must match its size"
    );
    Self { size, texels }
  }

  /// Build from packed 16-bit heights.
  pub fn from_packed(size: UVec2, heights: &[u16]) -> Self {
    Self::new(size, heights.iter().copied().map(HeightTexel::from_packed).collect())
  }

  /// Image filled with a single height.
  pub fn flat(size: UVec2, height: u16) -> Self {
    Self::new(size, vec![HeightTexel::from_packed(height); (size.x * size.y) as usize])
  }
}

impl HeightSource for HeightmapImage {
  fn size(&self) -> UVec2 {
    self.size
  }

  fn texel(&self, x: u32, y: u32) -> HeightTexel {
    self.texels[(y * self.size.x + x) as usize]
  }
}

/// The region of a heightmap covering one tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HeightmapRegion {
  /// Texel of tile vertex (0, 0).
  pub texel_base: UVec2,
  pub subsection_size_quads: u32,
  pub num_subsections: u32,
}

impl HeightmapRegion {
  #[inline]
  pub fn component_size_quads(&self) -> u32 {
    self.subsection_size_quads * self.num_subsections
  }

  #[inline]
  fn vertex_to_texel(&self, v: u32) -> u32 {
    let sub = self.subsection_size_quads;
    let s = (v / sub).min(self.num_subsections - 1);
    s * (sub + 1) + (v - s * sub)
  }

  /// Local-space position of tile vertex `(vx, vy)`; reads outside the
  /// texture clamp to its edge.
  pub fn sample_vertex(&self, source: &(impl HeightSource + ?Sized), vx: u32, vy: u32) -> Vec3 {
    let size = source.size();
    let tx = (self.texel_base.x + self.vertex_to_texel(vx)).min(size.x.saturating_sub(1));
    let ty = (self.texel_base.y + self.vertex_to_texel(vy)).min(size.y.saturating_sub(1));
    let height = source.texel(tx, ty).local_height();
    Vec3::new(vx as f32, vy as f32, height)
  }

  /// Local bounds of the cluster at intra-tile coordinate `cluster`.
  ///
  /// The cluster spans vertices `[c * 16, min(c * 16 + 16, tile quads)]` on each
  /// axis.
  pub fn cluster_local_bounds(&self, source: &(impl HeightSource + ?Sized), cluster: UVec2) -> Aabb {
    let quads = self.component_size_quads();
    let start = (cluster * CLUSTER_QUAD_SIZE).min(UVec2::splat(quads));
    let end = (start + CLUSTER_QUAD_SIZE).min(UVec2::splat(quads));

    let mut min = Vec3::splat(f32::MAX);
    let mut max = Vec3::splat(f32::MIN);
    for vy in start.y..=end.y {
      for vx in start.x..=end.x {
        let p = self.sample_vertex(source, vx, vy);
        min = min.min(p);
        max = max.max(p);
      }
    }
    Aabb::from_min_max(min, max)
  }
}

#[cfg(test)]
#[path = "heightmap_test.rs"]
mod heightmap_test;
