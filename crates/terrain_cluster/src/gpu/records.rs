//! GPU record layouts shared with the compute and vertex kernels.
//!
//! These are serialization contracts: strides and bit positions must match the
//! kernels exactly, so every layout is `#[repr(C)]` Pod with a compile-time size
//! check, and bitfields are packed by hand.
//!
//! # Packed Cluster Record (u32, LSB first)
//!
//! ```text
//! ┌──────────┬──────────┬────────┬────────┬────────┬────────┬────────┐
//! │ ClusterX │ ClusterY │ Down   │ Left   │ Top    │ Right  │ Center │
//! │ 8 bits   │ 8 bits   │ w bits │ w bits │ w bits │ w bits │ w bits │
//! └──────────┴──────────┴────────┴────────┴────────┴────────┴────────┘
//!  0          8          16       16+w     16+2w    16+3w    16+4w
//! ```
//!
//! `w` is the LOD field width; 16 + 5w must fit in 32 bits, so w <= 3.

use bytemuck::{Pod, Zeroable};
use glam::{UVec2, Vec3};

use crate::bounds::Aabb;

// =============================================================================
// Cluster input
// =============================================================================

/// Per-cluster input of the culling pass.
///
/// The trailing pad rounds the stride to 32 bytes, two 16-byte rows, which is
/// the stride the cull kernel reads. It is always zero.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct ClusterInputRecord {
  pub bound_center: [f32; 3],
  /// Intra-tile cluster x/y, then tile x/y; 8 bits each.
  pub packed_index: u32,
  pub bound_extent: [f32; 3],
  pub _pad: u32,
}

const _: () = assert!(std::mem::size_of::<ClusterInputRecord>() == 32);

impl ClusterInputRecord {
  pub fn new(bounds: &Aabb, cluster: UVec2, tile: UVec2) -> Self {
    debug_assert!(cluster.max_element() <= 0xFF && tile.max_element() <= 0xFF);
    Self {
      bound_center: bounds.center.to_array(),
      packed_index: cluster.x | cluster.y << 8 | tile.x << 16 | tile.y << 24,
      bound_extent: bounds.extent.to_array(),
      _pad: 0,
    }
  }

  #[inline]
  pub fn cluster_index(&self) -> UVec2 {
    UVec2::new(self.packed_index & 0xFF, (self.packed_index >> 8) & 0xFF)
  }

  #[inline]
  pub fn tile_index(&self) -> UVec2 {
    UVec2::new((self.packed_index >> 16) & 0xFF, self.packed_index >> 24)
  }

  /// Global cluster coordinate on the terrain grid.
  #[inline]
  pub fn global_cluster(&self, clusters_per_tile: u32) -> UVec2 {
    self.tile_index() * clusters_per_tile + self.cluster_index()
  }

  #[inline]
  pub fn bounds(&self) -> Aabb {
    Aabb {
      center: Vec3::from_array(self.bound_center),
      extent: Vec3::from_array(self.bound_extent),
    }
  }
}

// =============================================================================
// Indirect draw arguments
// =============================================================================

/// Indexed indirect draw arguments (one block per LOD).
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct DrawIndexedIndirectArgs {
  pub index_count: u32,
  pub instance_count: u32,
  pub first_index: u32,
  pub base_vertex: i32,
  pub first_instance: u32,
}

const _: () = assert!(std::mem::size_of::<DrawIndexedIndirectArgs>() == 20);

// =============================================================================
// Packed neighbor-LOD record
// =============================================================================

/// A cluster's own LOD and its four cardinal neighbors'.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NeighborLods {
  pub center: u32,
  /// Neighbor at y - 1.
  pub down: u32,
  /// Neighbor at x - 1.
  pub left: u32,
  /// Neighbor at y + 1.
  pub top: u32,
  /// Neighbor at x + 1.
  pub right: u32,
}

/// Width of each LOD field in a [`PackedClusterRecord`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LodFieldLayout {
  bits: u32,
}

impl LodFieldLayout {
  /// Bits available to the five LOD fields.
  pub const LOD_BITS_AVAILABLE: u32 = 32 - 16;
  /// Widest LOD field that still fits five times.
  pub const MAX_FIELD_BITS: u32 = Self::LOD_BITS_AVAILABLE / 5;

  /// Narrowest layout that represents `last_lod`.
  ///
  /// # Panics
  /// If `last_lod` needs more than [`MAX_FIELD_BITS`](Self::MAX_FIELD_BITS).
  pub fn for_last_lod(last_lod: u32) -> Self {
    let bits = (u32::BITS - last_lod.leading_zeros()).max(1);
    Self::with_bits(bits, last_lod)
  }

  /// Fixed-width layout, checked against `last_lod`.
  ///
  /// # Panics
  /// If `bits` is zero, exceeds [`MAX_FIELD_BITS`](Self::MAX_FIELD_BITS), or
  /// cannot represent `last_lod`.
  pub fn with_bits(bits: u32, last_lod: u32) -> Self {
    assert!(
      (1..=Self::MAX_FIELD_BITS).contains(&bits),
      "LOD field width {bits} must be in 1..={}",
      Self::MAX_FIELD_BITS
    );
    let layout = Self { bits };
    assert!(
      last_lod <= layout.max_lod(),
      "LOD field width {bits} cannot hold LOD {last_lod}"
    );
    layout
  }

  #[inline]
  pub fn bits(&self) -> u32 {
    self.bits
  }

  /// Largest LOD a field can hold.
  #[inline]
  pub fn max_lod(&self) -> u32 {
    (1 << self.bits) - 1
  }

  #[inline]
  fn mask(&self) -> u32 {
    self.max_lod()
  }

  #[inline]
  fn shift(&self, field: u32) -> u32 {
    16 + field * self.bits
  }

  /// Pack a global cluster coordinate and its neighbor LODs.
  #[inline]
  pub fn pack(&self, cluster: UVec2, lods: NeighborLods) -> PackedClusterRecord {
    debug_assert!(cluster.x <= 0xFF && cluster.y <= 0xFF);
    let m = self.mask();
    PackedClusterRecord(
      (cluster.x & 0xFF)
        | (cluster.y & 0xFF) << 8
        | (lods.down & m) << self.shift(0)
        | (lods.left & m) << self.shift(1)
        | (lods.top & m) << self.shift(2)
        | (lods.right & m) << self.shift(3)
        | (lods.center & m) << self.shift(4),
    )
  }

  #[inline]
  pub fn center_lod(&self, record: PackedClusterRecord) -> u32 {
    (record.0 >> self.shift(4)) & self.mask()
  }

  pub fn unpack(&self, record: PackedClusterRecord) -> (UVec2, NeighborLods) {
    let m = self.mask();
    let field = |i: u32| (record.0 >> self.shift(i)) & m;
    (
      record.cluster(),
      NeighborLods {
        down: field(0),
        left: field(1),
        top: field(2),
        right: field(3),
        center: field(4),
      },
    )
  }
}

/// One visible cluster as consumed by the vertex shader.
#[repr(transparent)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Pod, Zeroable)]
pub struct PackedClusterRecord(pub u32);

impl PackedClusterRecord {
  /// Global cluster coordinate.
  #[inline]
  pub fn cluster(self) -> UVec2 {
    UVec2::new(self.0 & 0xFF, (self.0 >> 8) & 0xFF)
  }
}

#[cfg(test)]
#[path = "records_test.rs"]
mod records_test;
