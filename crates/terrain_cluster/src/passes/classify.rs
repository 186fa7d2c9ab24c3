//! LOD classification pass.
//!
//! LOD is evaluated once per tile from its bounding sphere and replicated to
//! every cluster of the tile. Cluster storage is tile-contiguous, so tile `t`
//! owns the LOD slice `[t·cpt², (t+1)·cpt²)`.

use glam::{Mat4, Vec3};
use rayon::prelude::*;

use crate::constants::group_count;
use crate::entity::ClusterBuffers;
use crate::error::GpuError;
use crate::gpu::{CommandList, ResourceAccess};
use crate::lod::{screen_size_squared, LodSettings, ProjectionTerms};

/// Camera terms the classification kernel reads.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClassifyView {
  pub view_origin: Vec3,
  pub terms: ProjectionTerms,
}

impl ClassifyView {
  pub fn new(view_origin: Vec3, projection: &Mat4) -> Self {
    Self {
      view_origin,
      terms: ProjectionTerms::from_projection(projection),
    }
  }

  /// LOD of a tile bounding sphere `[x, y, z, radius]`.
  #[inline]
  pub fn tile_lod(&self, origin_radius: [f32; 4], settings: &LodSettings) -> u32 {
    let [x, y, z, radius] = origin_radius;
    let screen_sq = screen_size_squared(Vec3::new(x, y, z), radius, self.view_origin, &self.terms);
    settings.select_lod(screen_sq)
  }
}

/// Write one LOD per cluster into `buffers.cluster_lods`.
///
/// Leaves `cluster_lods` in [`ResourceAccess::UavCompute`] for the cull pass
/// to transition.
pub fn classify(
  cmd: &mut CommandList,
  buffers: &mut ClusterBuffers,
  clusters_per_tile: u32,
  settings: &LodSettings,
  view: &ClassifyView,
  workgroup_size: u32,
) -> Result<(), GpuError> {
  let cluster_count = buffers.cluster_count();
  let _span = tracing::info_span!("terrain::classify", clusters = cluster_count).entered();

  cmd.transition(&mut buffers.cluster_lods, ResourceAccess::SrvCompute, ResourceAccess::UavCompute)?;
  cmd.dispatch(
    "terrain::classify",
    group_count(cluster_count, workgroup_size),
    &[buffers.tile_origins.bind_read(), buffers.cluster_lods.bind_write()],
  )?;

  let cpt_sq = (clusters_per_tile * clusters_per_tile) as usize;
  let origins = buffers.tile_origins.contents();
  buffers
    .cluster_lods
    .uav_mut()
    .par_chunks_mut(cpt_sq)
    .zip(origins.par_iter())
    .for_each(|(lods, origin)| lods.fill(view.tile_lod(*origin, settings)));

  Ok(())
}

#[cfg(test)]
#[path = "classify_test.rs"]
mod classify_test;
