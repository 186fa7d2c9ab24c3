//! Culling and neighbor-LOD packing pass.
//!
//! Each surviving cluster claims a slot in the unordered visible buffer and
//! bumps the counter of its own LOD bucket. Neighbor LODs are read through
//! [`ClusterGrid::linear_index`], which clamps at the grid border, so edge
//! clusters see themselves as their outer neighbor.

use std::sync::atomic::{AtomicU32, Ordering};

use glam::{IVec2, Mat4};
use rayon::prelude::*;

use crate::constants::group_count;
use crate::entity::{ClusterBuffers, ClusterGrid};
use crate::error::GpuError;
use crate::gpu::{CommandList, Hzb, LodFieldLayout, NeighborLods, PackedClusterRecord, ResourceAccess};
use crate::passes::PermutedPlanes;

/// View inputs of the cull kernel.
#[derive(Clone, Copy, Debug)]
pub struct CullView<'a> {
  pub planes: &'a PermutedPlanes,
  /// Matrix the HZB was rendered with.
  pub prev_view_projection: Mat4,
  /// Occlusion is skipped when `None`.
  pub hzb: Option<&'a Hzb>,
}

/// Per-pass counters, read back for statistics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CullOutput {
  pub visible: u32,
  pub frustum_culled: u32,
  pub occlusion_culled: u32,
}

/// Cull every cluster and pack the survivors.
///
/// Expects `cluster_lods` in [`ResourceAccess::UavCompute`] as left by the
/// classification pass. Leaves `visible_records` and `lod_counts` in
/// [`ResourceAccess::UavCompute`] for compaction to transition.
pub fn cull(
  cmd: &mut CommandList,
  buffers: &mut ClusterBuffers,
  grid: &ClusterGrid,
  layout: LodFieldLayout,
  view: &CullView<'_>,
  workgroup_size: u32,
) -> Result<CullOutput, GpuError> {
  let cluster_count = buffers.cluster_count();
  let _span = tracing::info_span!("terrain::cull", clusters = cluster_count).entered();

  cmd.transition(&mut buffers.cluster_lods, ResourceAccess::UavCompute, ResourceAccess::SrvCompute)?;
  cmd.transition(&mut buffers.visible_records, ResourceAccess::SrvCompute, ResourceAccess::UavCompute)?;
  cmd.transition(&mut buffers.lod_counts, ResourceAccess::SrvCompute, ResourceAccess::CopyDest)?;
  cmd.clear_buffer(&mut buffers.lod_counts)?;
  cmd.transition(&mut buffers.lod_counts, ResourceAccess::CopyDest, ResourceAccess::UavCompute)?;
  cmd.dispatch(
    "terrain::cull",
    group_count(cluster_count, workgroup_size),
    &[
      buffers.cluster_inputs.bind_read(),
      buffers.cluster_lods.bind_read(),
      buffers.visible_records.bind_write(),
      buffers.lod_counts.bind_write(),
    ],
  )?;

  let inputs = buffers.cluster_inputs.contents();
  let lods = buffers.cluster_lods.contents();
  let bucket_counts: Vec<AtomicU32> = (0..buffers.lod_counts.len()).map(|_| AtomicU32::new(0)).collect();
  let cursor = AtomicU32::new(0);
  let frustum_culled = AtomicU32::new(0);
  let occlusion_culled = AtomicU32::new(0);

  let survivors: Vec<(u32, PackedClusterRecord)> = inputs
    .par_iter()
    .enumerate()
    .filter_map(|(index, input)| {
      let bounds = input.bounds();
      if !view.planes.intersects_box(bounds.center, bounds.extent) {
        frustum_culled.fetch_add(1, Ordering::Relaxed);
        return None;
      }
      if let Some(hzb) = view.hzb {
        if !hzb.is_box_visible(&bounds, &view.prev_view_projection) {
          occlusion_culled.fetch_add(1, Ordering::Relaxed);
          return None;
        }
      }

      let cluster = input.global_cluster(grid.clusters_per_tile);
      let at = cluster.as_ivec2();
      let lod_at = |offset: IVec2| lods[grid.linear_index(at + offset) as usize];
      let neighbors = NeighborLods {
        center: lods[index],
        down: lod_at(IVec2::NEG_Y),
        left: lod_at(IVec2::NEG_X),
        top: lod_at(IVec2::Y),
        right: lod_at(IVec2::X),
      };

      bucket_counts[neighbors.center as usize].fetch_add(1, Ordering::Relaxed);
      let slot = cursor.fetch_add(1, Ordering::Relaxed);
      Some((slot, layout.pack(cluster, neighbors)))
    })
    .collect();

  let visible = buffers.visible_records.uav_mut();
  for (slot, record) in survivors {
    visible[slot as usize] = record;
  }
  for (dst, count) in buffers.lod_counts.uav_mut().iter_mut().zip(&bucket_counts) {
    *dst += count.load(Ordering::Relaxed);
  }

  let output = CullOutput {
    visible: cursor.into_inner(),
    frustum_culled: frustum_culled.into_inner(),
    occlusion_culled: occlusion_culled.into_inner(),
  };
  tracing::trace!(
    visible = output.visible,
    frustum_culled = output.frustum_culled,
    occlusion_culled = output.occlusion_culled,
    "cull"
  );
  Ok(output)
}

#[cfg(test)]
#[path = "cull_test.rs"]
mod cull_test;
