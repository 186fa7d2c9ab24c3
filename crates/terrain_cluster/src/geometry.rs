//! Cluster Grid Geometry - the one patch mesh every cluster instance draws.
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │  vertices: 17 × 17 grid of (x, y), shared by all LODs         │
//! │                                                               │
//! │  indices:  [ LOD0 | LOD1 | LOD2 | LOD3 | LOD4 ]               │
//! │             1536    384    96     24     6                    │
//! │                                                               │
//! │  LOD l steps 1 << l vertices and draws (16 >> l)² quads       │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! The vertex shader offsets the patch by the instance's cluster coordinate and
//! snaps edge vertices toward the coarser neighbor LOD from the packed record.

use bytemuck::{Pod, Zeroable};
use smallvec::SmallVec;

use crate::constants::{lod_index_count, lod_quad_size, CLUSTER_LOD_COUNT, CLUSTER_VERTEX_SIZE};

/// Patch-local vertex position in quads.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct ClusterVertex {
  pub x: f32,
  pub y: f32,
}

/// Contiguous index range of one LOD inside the shared index buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LodIndexRange {
  pub first_index: u32,
  pub index_count: u32,
}

/// Shared vertex grid and concatenated per-LOD index lists.
#[derive(Clone, Debug)]
pub struct ClusterGeometry {
  vertices: Vec<ClusterVertex>,
  indices: Vec<u16>,
  ranges: SmallVec<[LodIndexRange; CLUSTER_LOD_COUNT as usize]>,
}

impl Default for ClusterGeometry {
  fn default() -> Self {
    Self::new()
  }
}

impl ClusterGeometry {
  pub fn new() -> Self {
    let vertices = (0..CLUSTER_VERTEX_SIZE)
      .flat_map(|y| {
        (0..CLUSTER_VERTEX_SIZE).map(move |x| ClusterVertex {
          x: x as f32,
          y: y as f32,
        })
      })
      .collect();

    let total: u32 = (0..CLUSTER_LOD_COUNT).map(lod_index_count).sum();
    let mut indices = Vec::with_capacity(total as usize);
    let mut ranges = SmallVec::new();
    for lod in 0..CLUSTER_LOD_COUNT {
      let first_index = indices.len() as u32;
      push_lod_indices(&mut indices, lod);
      ranges.push(LodIndexRange {
        first_index,
        index_count: indices.len() as u32 - first_index,
      });
    }

    Self {
      vertices,
      indices,
      ranges,
    }
  }

  #[inline]
  pub fn vertices(&self) -> &[ClusterVertex] {
    &self.vertices
  }

  #[inline]
  pub fn indices(&self) -> &[u16] {
    &self.indices
  }

  /// Index range drawn at `lod`.
  #[inline]
  pub fn lod_range(&self, lod: u32) -> LodIndexRange {
    self.ranges[lod as usize]
  }

  pub fn lod_count(&self) -> u32 {
    self.ranges.len() as u32
  }

  /// Indices of `lod`, three per triangle.
  pub fn lod_indices(&self, lod: u32) -> &[u16] {
    let range = self.lod_range(lod);
    let start = range.first_index as usize;
    &self.indices[start..start + range.index_count as usize]
  }
}

fn push_lod_indices(indices: &mut Vec<u16>, lod: u32) {
  let step = 1u32 << lod;
  let quads = lod_quad_size(lod);
  let vertex = |x: u32, y: u32| (y * step * CLUSTER_VERTEX_SIZE + x * step) as u16;

  for qy in 0..quads {
    for qx in 0..quads {
      let v00 = vertex(qx, qy);
      let v10 = vertex(qx + 1, qy);
      let v01 = vertex(qx, qy + 1);
      let v11 = vertex(qx + 1, qy + 1);
      indices.extend_from_slice(&[v00, v11, v10, v00, v01, v11]);
    }
  }
}
