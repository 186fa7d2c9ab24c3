//! Recoverable error types.
//!
//! Contract violations (mismatched tile geometry, missing ledger entries, the
//! cluster budget, foreign-domain buffer destruction) are assertions, not
//! errors; see the owning modules.

use glam::IVec2;
use thiserror::Error;

use crate::gpu::{BufferUsage, ResourceAccess};

/// A tile descriptor that cannot join the GPU-driven cluster path.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TileDescriptorError {
  #[error("tile has no quads (subsection size {subsection_size_quads}, {num_subsections} subsections)")]
  EmptyTile {
    subsection_size_quads: u32,
    num_subsections: u32,
  },

  #[error("tile edge has {vertices} vertices, fewer than one cluster of {cluster_size}")]
  TooFewVertices { vertices: u32, cluster_size: u32 },

  #[error("tile edge of {vertices} vertices is not a multiple of the cluster size {cluster_size}")]
  NotClusterAligned { vertices: u32, cluster_size: u32 },

  #[error("{clusters_per_tile} clusters per tile is not a power of two")]
  ClustersPerTileNotPowerOfTwo { clusters_per_tile: u32 },

  #[error("section base {section_base} is not aligned to the tile size {component_size_quads}")]
  MisalignedSection {
    section_base: IVec2,
    component_size_quads: u32,
  },
}

/// Command recording failures on the compute device.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GpuError {
  #[error("pass `{pass}` binds `{buffer}` in state {actual:?}, expected {expected:?}")]
  Hazard {
    pass: &'static str,
    buffer: &'static str,
    expected: ResourceAccess,
    actual: ResourceAccess,
  },

  #[error("transition of `{buffer}` from {from:?} but it is tracked in {actual:?}")]
  StateMismatch {
    buffer: &'static str,
    from: ResourceAccess,
    actual: ResourceAccess,
  },

  #[error("`{buffer}` with usage {usage:?} cannot enter state {access:?}")]
  InvalidUsage {
    buffer: &'static str,
    usage: BufferUsage,
    access: ResourceAccess,
  },

  #[error("draw {draw} reads past the {len} argument blocks of `{buffer}`")]
  ArgsOutOfRange {
    buffer: &'static str,
    draw: u32,
    len: usize,
  },
}
