//! Per-frame execution of one terrain.
//!
//! ```text
//! not ready ─► skip
//! dirty     ─► update_all_gpu_buffers
//! classify ─► cull + pack ─► compact ─► one indirect draw per LOD
//! ```

use std::time::Duration;

use glam::{Mat4, Vec3};
use smallvec::SmallVec;
use web_time::Instant;

use crate::config::RenderConfig;
use crate::constants::CLUSTER_LOD_COUNT;
use crate::entity::TerrainRenderEntity;
use crate::error::GpuError;
use crate::geometry::ClusterGeometry;
use crate::gpu::{CommandList, Hzb};
use crate::passes::{classify, compact, cull, ClassifyView, CullView, PermutedPlanes};

/// Camera state for one rendered view.
#[derive(Clone, Copy, Debug)]
pub struct FrameView<'a> {
  pub view_origin: Vec3,
  pub projection: Mat4,
  pub planes: PermutedPlanes,
  /// Matrix last frame's HZB was rendered with.
  pub prev_view_projection: Mat4,
  pub hzb: Option<&'a Hzb>,
}

impl FrameView<'static> {
  /// View without occlusion history; the frustum comes from `view_projection`.
  pub fn new(view_origin: Vec3, projection: Mat4, view_projection: Mat4) -> Self {
    Self {
      view_origin,
      projection,
      planes: PermutedPlanes::from_view_projection(&view_projection),
      prev_view_projection: view_projection,
      hzb: None,
    }
  }
}

impl<'a> FrameView<'a> {
  /// Attach last frame's depth pyramid and the matrix it was rendered with.
  pub fn with_history<'b>(self, prev_view_projection: Mat4, hzb: &'b Hzb) -> FrameView<'b> {
    FrameView {
      view_origin: self.view_origin,
      projection: self.projection,
      planes: self.planes,
      prev_view_projection,
      hzb: Some(hzb),
    }
  }
}

/// What one frame did, summed over the terrains of a world.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FrameStats {
  pub terrains_rendered: u32,
  /// Terrains whose tiles have not all arrived yet.
  pub terrains_skipped: u32,
  pub rebuilds: u32,
  pub total_clusters: u32,
  pub frustum_culled: u32,
  pub occlusion_culled: u32,
  pub visible_per_lod: SmallVec<[u32; CLUSTER_LOD_COUNT as usize]>,
  pub draws: u32,
  pub classify_time: Duration,
  pub cull_time: Duration,
  pub compact_time: Duration,
}

impl FrameStats {
  #[inline]
  pub fn visible(&self) -> u32 {
    self.visible_per_lod.iter().sum()
  }

  #[inline]
  pub fn pass_time(&self) -> Duration {
    self.classify_time + self.cull_time + self.compact_time
  }

  fn add_visible(&mut self, counts: &[u32]) {
    if self.visible_per_lod.len() < counts.len() {
      self.visible_per_lod.resize(counts.len(), 0);
    }
    for (total, count) in self.visible_per_lod.iter_mut().zip(counts) {
      *total += count;
    }
  }
}

/// Recorded commands and statistics of one rendered world.
#[derive(Debug, Default)]
pub struct FrameOutput {
  pub stats: FrameStats,
  pub commands: CommandList,
}

/// Run the frame pipeline for one terrain, appending its commands to `cmd`.
pub fn render_terrain(
  entity: &mut TerrainRenderEntity,
  geometry: &ClusterGeometry,
  view: &FrameView<'_>,
  config: &RenderConfig,
  cmd: &mut CommandList,
  stats: &mut FrameStats,
) -> Result<(), GpuError> {
  if !entity.is_ready() {
    tracing::trace!(
      terrain = %entity.terrain(),
      registered = entity.registered_tile_count(),
      expected = entity.geometry().terrain_tile_count,
      "terrain incomplete, skipping"
    );
    stats.terrains_skipped += 1;
    return Ok(());
  }

  if entity.update_all_gpu_buffers(geometry)? {
    stats.rebuilds += 1;
  }

  let settings = entity.geometry().lod;
  let grid = entity.grid();
  let layout = entity.layout();
  let Some(buffers) = entity.buffers_mut() else {
    return Ok(());
  };

  let start = Instant::now();
  let classify_view = ClassifyView::new(view.view_origin, &view.projection);
  classify(
    cmd,
    buffers,
    grid.clusters_per_tile,
    &settings,
    &classify_view,
    config.workgroup_size,
  )?;
  let classified = Instant::now();
  stats.classify_time += classified - start;

  let cull_view = CullView {
    planes: &view.planes,
    prev_view_projection: view.prev_view_projection,
    hzb: view.hzb.filter(|_| config.occlusion_culling),
  };
  let culled = cull(cmd, buffers, &grid, layout, &cull_view, config.workgroup_size)?;
  let culled_at = Instant::now();
  stats.cull_time += culled_at - classified;

  let compacted = compact(cmd, buffers, layout, config.workgroup_size)?;
  stats.compact_time += culled_at.elapsed();

  for lod in 0..buffers.lod_count() {
    cmd.draw_indexed_indirect(&buffers.indirect_args, &buffers.ordered_records, lod)?;
    stats.draws += 1;
  }

  stats.terrains_rendered += 1;
  stats.total_clusters += buffers.cluster_count();
  stats.frustum_culled += culled.frustum_culled;
  stats.occlusion_culled += culled.occlusion_culled;
  stats.add_visible(&compacted.counts);
  Ok(())
}

#[cfg(test)]
#[path = "frame_test.rs"]
mod frame_test;
