//! Compaction and indirect-argument pass.
//!
//! ```text
//! lod_counts      [ 3, 0, 5, 1 ]
//! bucket offsets  [ 0, 3, 3, 8 ]        exclusive prefix sum
//! ordered         [ L0 L0 L0 | L2 L2 L2 L2 L2 | L3 ]
//! args[l]         instance_count = lod_counts[l], first_instance = offset[l]
//! ```

use std::sync::atomic::{AtomicU32, Ordering};

use rayon::prelude::*;
use smallvec::SmallVec;

use crate::constants::{group_count, CLUSTER_LOD_COUNT};
use crate::entity::ClusterBuffers;
use crate::error::GpuError;
use crate::gpu::{CommandList, LodFieldLayout, PackedClusterRecord, ResourceAccess};

pub type LodArray = SmallVec<[u32; CLUSTER_LOD_COUNT as usize]>;

/// Per-bucket counts and offsets written into the argument blocks.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CompactOutput {
  pub counts: LodArray,
  pub offsets: LodArray,
}

impl CompactOutput {
  #[inline]
  pub fn total(&self) -> u32 {
    self.counts.iter().sum()
  }
}

/// Exclusive prefix sum.
pub fn bucket_offsets(counts: &[u32]) -> LodArray {
  counts
    .iter()
    .scan(0u32, |running, &count| {
      let offset = *running;
      *running += count;
      Some(offset)
    })
    .collect()
}

/// Order visible records by LOD bucket and fill the indirect arguments.
///
/// Expects `visible_records` and `lod_counts` in
/// [`ResourceAccess::UavCompute`] as left by the cull pass. Returns
/// `ordered_records` to [`ResourceAccess::SrvGraphics`] and `indirect_args`
/// to [`ResourceAccess::IndirectArgs`] for the draws.
pub fn compact(
  cmd: &mut CommandList,
  buffers: &mut ClusterBuffers,
  layout: LodFieldLayout,
  workgroup_size: u32,
) -> Result<CompactOutput, GpuError> {
  let cluster_count = buffers.cluster_count();
  let _span = tracing::info_span!("terrain::compact", clusters = cluster_count).entered();

  cmd.transition(&mut buffers.visible_records, ResourceAccess::UavCompute, ResourceAccess::SrvCompute)?;
  cmd.transition(&mut buffers.lod_counts, ResourceAccess::UavCompute, ResourceAccess::SrvCompute)?;
  cmd.transition(&mut buffers.ordered_records, ResourceAccess::SrvGraphics, ResourceAccess::UavCompute)?;
  cmd.transition(&mut buffers.indirect_args, ResourceAccess::IndirectArgs, ResourceAccess::UavCompute)?;
  cmd.dispatch(
    "terrain::compact",
    group_count(cluster_count, workgroup_size),
    &[
      buffers.visible_records.bind_read(),
      buffers.lod_counts.bind_read(),
      buffers.ordered_records.bind_write(),
      buffers.indirect_args.bind_write(),
    ],
  )?;

  let counts: LodArray = buffers.lod_counts.contents().iter().copied().collect();
  let offsets = bucket_offsets(&counts);
  let total: u32 = counts.iter().sum();

  let cursors: Vec<AtomicU32> = offsets.iter().map(|&offset| AtomicU32::new(offset)).collect();
  let placed: Vec<(u32, PackedClusterRecord)> = buffers.visible_records.contents()[..total as usize]
    .par_iter()
    .map(|&record| {
      let lod = layout.center_lod(record) as usize;
      (cursors[lod].fetch_add(1, Ordering::Relaxed), record)
    })
    .collect();

  let ordered = buffers.ordered_records.uav_mut();
  for (slot, record) in placed {
    ordered[slot as usize] = record;
  }
  for ((args, &count), &offset) in buffers.indirect_args.uav_mut().iter_mut().zip(&counts).zip(&offsets) {
    args.instance_count = count;
    args.first_instance = offset;
  }

  cmd.transition(&mut buffers.ordered_records, ResourceAccess::UavCompute, ResourceAccess::SrvGraphics)?;
  cmd.transition(&mut buffers.indirect_args, ResourceAccess::UavCompute, ResourceAccess::IndirectArgs)?;

  tracing::trace!(visible = total, "compact");
  Ok(CompactOutput { counts, offsets })
}

#[cfg(test)]
#[path = "compact_test.rs"]
mod compact_test;
