//! LOD distribution settings and screen-size estimation.
//!
//! The LOD ladder is a strictly decreasing sequence of squared screen sizes:
//!
//! ```text
//! threshold(0) = lod0_screen_size²
//! threshold(1) = (lod0_screen_size / lod0_distribution)²
//! threshold(k) = threshold(k - 1) / lod_distribution²        (k >= 2)
//!
//! screen² >= threshold(1)                      → LOD 0
//! threshold(k + 1) <= screen² < threshold(k)   → LOD k
//! screen² <  threshold(last)                   → LOD last
//! ```
//!
//! A screen size exactly on a threshold keeps the finer LOD.

use glam::{Mat4, Vec3};

use crate::constants::{CLUSTER_LOD_COUNT, MIN_LOD_DISTRIBUTION};

/// Artist-facing LOD distribution for one terrain.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LodDistribution {
  /// Screen size (fraction of the viewport) at which LOD0 is drawn.
  pub lod0_screen_size: f32,
  /// Divisor from LOD0 to LOD1.
  pub lod0_distribution: f32,
  /// Divisor between each subsequent pair of LODs.
  pub lod_distribution: f32,
}

impl Default for LodDistribution {
  fn default() -> Self {
    Self {
      lod0_screen_size: 0.5,
      lod0_distribution: 1.25,
      lod_distribution: 3.0,
    }
  }
}

/// Squared screen-size thresholds derived from a [`LodDistribution`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LodSettings {
  pub lod0_screen_size_sq: f32,
  pub lod1_screen_size_sq: f32,
  /// Ratio between consecutive thresholds from LOD1 on.
  pub falloff_sq: f32,
  /// Coarsest LOD this terrain may select.
  pub last_lod: u32,
}

impl LodSettings {
  /// # Panics
  /// If `last_lod` is not below `CLUSTER_LOD_COUNT`.
  pub fn new(distribution: &LodDistribution, last_lod: u32) -> Self {
    assert!(
      last_lod < CLUSTER_LOD_COUNT,
      "last LOD {last_lod} exceeds cluster LOD count {CLUSTER_LOD_COUNT}"
    );
    let lod1 = distribution.lod0_screen_size / distribution.lod0_distribution.max(MIN_LOD_DISTRIBUTION);
    let falloff = distribution.lod_distribution.max(MIN_LOD_DISTRIBUTION);
    Self {
      lod0_screen_size_sq: distribution.lod0_screen_size * distribution.lod0_screen_size,
      lod1_screen_size_sq: lod1 * lod1,
      falloff_sq: falloff * falloff,
      last_lod,
    }
  }

  /// Squared screen size at which `lod` starts.
  pub fn threshold(&self, lod: u32) -> f32 {
    if lod == 0 {
      return self.lod0_screen_size_sq;
    }
    let mut threshold = self.lod1_screen_size_sq;
    for _ in 1..lod {
      threshold /= self.falloff_sq;
    }
    threshold
  }

  /// Discrete LOD for a squared screen size, clamped to `[0, last_lod]`.
  #[inline]
  pub fn select_lod(&self, screen_size_sq: f32) -> u32 {
    let mut lod = 0;
    let mut threshold = self.lod1_screen_size_sq;
    while lod < self.last_lod && screen_size_sq < threshold {
      lod += 1;
      threshold /= self.falloff_sq;
    }
    lod
  }
}

/// Projection matrix terms the screen-size estimate needs.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProjectionTerms {
  /// Horizontal scale (`M[0][0]`).
  pub scale_x: f32,
  /// Vertical scale (`M[1][1]`).
  pub scale_y: f32,
  /// Depth-to-w term (`M[2][3]`); zero for orthographic projections.
  pub w_scale: f32,
}

impl ProjectionTerms {
  pub fn from_projection(projection: &Mat4) -> Self {
    Self {
      scale_x: projection.x_axis.x,
      scale_y: projection.y_axis.y,
      w_scale: projection.z_axis.w,
    }
  }
}

/// Estimated squared on-screen size (diameter as a fraction of the viewport)
/// of a sphere seen from `view_origin`.
#[inline]
pub fn screen_size_squared(origin: Vec3, radius: f32, view_origin: Vec3, terms: &ProjectionTerms) -> f32 {
  let screen_multiple = (0.5 * terms.scale_x).max(0.5 * terms.scale_y);
  let dist_sq = origin.distance_squared(view_origin) * terms.w_scale * terms.w_scale;
  let screen_radius = screen_multiple * radius;
  4.0 * screen_radius * screen_radius / dist_sq.max(1.0)
}

#[cfg(test)]
#[path = "lod_test.rs"]
mod lod_test;
