//! Cluster layout constants shared by the host code and the compute kernels.
//!
//! A cluster is a square patch of `CLUSTER_QUAD_SIZE` quads. Every buffer the
//! pipeline owns is indexed by a *linear cluster index*: clusters of one tile
//! are stored contiguously (row-major inside the tile) and tiles are stored in
//! row-major grid order.
//!
//! # Linear Cluster Layout
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │        2×2 tile grid, 2×2 clusters per tile (cpt = 2, cpt² = 4)         │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │   global cluster y                                                      │
//! │        3 │  10  11 │  14  15 │                                          │
//! │        2 │   8   9 │  12  13 │   ← tile row 1                           │
//! │          ├─────────┼─────────┤                                          │
//! │        1 │   2   3 │   6   7 │                                          │
//! │        0 │   0   1 │   4   5 │   ← tile row 0                           │
//! │          └─────────┴─────────┘                                          │
//! │              0   1    2   3    global cluster x                         │
//! │                                                                         │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │  index = tile_row·cpt²·w + tile_col·cpt² + intra_row·cpt + intra_col    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! `cpt` must be a power of two so the intra-tile coordinate is a mask.

/// Quads along one edge of a cluster.
pub const CLUSTER_QUAD_SIZE: u32 = 16;

/// Vertices along one edge of a cluster.
pub const CLUSTER_VERTEX_SIZE: u32 = CLUSTER_QUAD_SIZE + 1;

/// Number of discrete cluster LODs (`log2(CLUSTER_QUAD_SIZE) + 1`).
///
/// LOD `n` renders `CLUSTER_QUAD_SIZE >> n` quads per edge; the last LOD is a
/// single quad.
pub const CLUSTER_LOD_COUNT: u32 = CLUSTER_QUAD_SIZE.trailing_zeros() + 1;

/// Compute workgroup size used by all three passes.
pub const THREAD_GROUP_SIZE: u32 = 64;

/// Upper bound on clusters per terrain render entity.
///
/// The packed record stores cluster coordinates in 8-bit fields, so a terrain
/// spans at most 256×256 clusters.
pub const MAX_CLUSTER_COUNT: u32 = 1 << 16;

/// Upper bound on clusters along one grid axis.
pub const MAX_CLUSTERS_PER_AXIS: u32 = 1 << 8;

/// Heightmap value representing zero local height.
pub const HEIGHT_MIDPOINT: f32 = 32768.0;

/// Local units per heightmap step (`1 / 128`).
pub const HEIGHT_SCALE: f32 = 1.0 / 128.0;

/// Divisor floor for LOD distribution settings; keeps the ladder strictly
/// decreasing.
pub const MIN_LOD_DISTRIBUTION: f32 = 1.01;

/// Number of workgroups needed to cover `count` invocations.
#[inline]
pub const fn group_count(count: u32, group_size: u32) -> u32 {
  count.div_ceil(group_size)
}

/// Quads per edge rendered at `lod`.
#[inline]
pub const fn lod_quad_size(lod: u32) -> u32 {
  CLUSTER_QUAD_SIZE >> lod
}

/// Index count of one cluster draw at `lod` (two triangles per quad).
#[inline]
pub const fn lod_index_count(lod: u32) -> u32 {
  let quads = lod_quad_size(lod);
  quads * quads * 6
}

#[cfg(test)]
#[path = "constants_test.rs"]
mod constants_test;
