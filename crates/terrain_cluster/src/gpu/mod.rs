//! Software compute device.
//!
//! Models the parts of a GPU the cluster pipeline depends on: typed buffers
//! with tracked resource states, explicit barriers, dispatches, and indirect
//! draws. Kernels run on the CPU (see `passes`) once their dispatch has been
//! validated against the tracked states, so a missing or misordered barrier is
//! reported as a [`GpuError`](crate::error::GpuError) instead of a flickering
//! frame.
//!
//! # Buffer State Flow (one frame)
//!
//! ```text
//! ┌──────────────────┬──────────────┬──────────────┬──────────────┬─────────────┐
//! │ buffer           │ classify     │ cull + pack  │ compact      │ draw        │
//! ├──────────────────┼──────────────┼──────────────┼──────────────┼─────────────┤
//! │ tile origins     │ SRV          │              │              │             │
//! │ cluster inputs   │              │ SRV          │              │             │
//! │ cluster LODs     │ SRV → UAV    │ UAV → SRV    │              │             │
//! │ visible records  │              │ SRV → UAV    │ UAV → SRV    │             │
//! │ LOD counts       │              │ SRV → COPY   │ UAV → SRV    │             │
//! │                  │              │ (clear) → UAV│              │             │
//! │ ordered records  │              │              │ VS → UAV     │ UAV → VS    │
//! │ indirect args    │              │              │ ARGS → UAV   │ UAV → ARGS  │
//! └──────────────────┴──────────────┴──────────────┴──────────────┴─────────────┘
//! ```

mod buffer;
mod command;
pub mod hzb;
pub mod records;

pub use buffer::{BufferId, GpuBuffer};
pub use command::{Binding, BindingAccess, Command, CommandList};
pub use hzb::Hzb;
pub use records::{
  ClusterInputRecord, DrawIndexedIndirectArgs, LodFieldLayout, NeighborLods, PackedClusterRecord,
};

use bitflags::bitflags;

bitflags! {
  /// Ways a buffer may be bound over its lifetime.
  #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
  pub struct BufferUsage: u8 {
    /// Read-only shader binding (compute or vertex).
    const SHADER_RESOURCE = 1;
    /// Read-write compute binding.
    const UNORDERED_ACCESS = 1 << 1;
    /// Source of indirect draw arguments.
    const INDIRECT_ARGS = 1 << 2;
    /// Target of clears and uploads.
    const COPY_DEST = 1 << 3;
  }
}

/// Tracked resource state of a buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ResourceAccess {
  /// Readable by compute shaders.
  SrvCompute,
  /// Readable by the vertex stage.
  SrvGraphics,
  /// Writable by compute shaders.
  UavCompute,
  /// Consumed by indirect draws.
  IndirectArgs,
  /// Target of a clear or copy.
  CopyDest,
}

impl ResourceAccess {
  /// Usage flag a buffer needs to enter this state.
  pub fn required_usage(self) -> BufferUsage {
    match self {
      Self::SrvCompute | Self::SrvGraphics => BufferUsage::SHADER_RESOURCE,
      Self::UavCompute => BufferUsage::UNORDERED_ACCESS,
      Self::IndirectArgs => BufferUsage::INDIRECT_ARGS,
      Self::CopyDest => BufferUsage::COPY_DEST,
    }
  }

  /// Whether shaders may write the buffer in this state.
  #[inline]
  pub fn is_writable(self) -> bool {
    matches!(self, Self::UavCompute | Self::CopyDest)
  }
}
