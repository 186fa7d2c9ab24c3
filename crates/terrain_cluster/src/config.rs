//! RenderConfig - tuning for the per-frame cluster pipeline.

use crate::constants::THREAD_GROUP_SIZE;
use crate::gpu::LodFieldLayout;

/// Configuration shared by every terrain a [`RenderLedger`](crate::ledger::RenderLedger)
/// renders.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderConfig {
  /// Invocations per workgroup for all three passes.
  pub workgroup_size: u32,

  /// Test surviving clusters against last frame's HZB when one is supplied.
  pub occlusion_culling: bool,

  /// Fixed LOD field width of the packed record. `None` derives the narrowest
  /// width holding each terrain's last LOD.
  pub lod_field_bits: Option<u32>,

  /// Frames kept by the rolling metrics windows.
  pub metrics_window: usize,
}

impl RenderConfig {
  /// Packed-record layout for a terrain whose coarsest LOD is `last_lod`.
  ///
  /// # Panics
  /// If a forced width cannot hold `last_lod`.
  pub fn lod_field_layout(&self, last_lod: u32) -> LodFieldLayout {
    match self.lod_field_bits {
      Some(bits) => LodFieldLayout::with_bits(bits, last_lod),
      None => LodFieldLayout::for_last_lod(last_lod),
    }
  }
}

impl Default for RenderConfig {
  fn default() -> Self {
    Self {
      workgroup_size: THREAD_GROUP_SIZE,
      occlusion_culling: true,
      lod_field_bits: None,
      metrics_window: 128,
    }
  }
}
