//! Hierarchical depth buffer for temporal occlusion culling.
//!
//! Depth is `[0, 1]` with 0 at the near plane (the convention of
//! `Mat4::perspective_rh`). Each mip stores the *furthest* depth of the 2×2
//! texels below it, so a box whose nearest point lies behind the furthest
//! depth covering its screen rectangle is hidden.

use glam::{Mat4, UVec2, Vec2};

use crate::bounds::Aabb;

#[derive(Clone, Debug)]
struct HzbMip {
  size: UVec2,
  texels: Vec<f32>,
}

impl HzbMip {
  #[inline]
  fn get(&self, x: u32, y: u32) -> f32 {
    self.texels[(y * self.size.x + x) as usize]
  }

  /// Next mip: furthest depth of each 2×2 footprint, edges clamped.
  fn downsample(&self) -> HzbMip {
    let size = (self.size + 1) / 2;
    let mut texels = Vec::with_capacity((size.x * size.y) as usize);
    for y in 0..size.y {
      for x in 0..size.x {
        let x0 = (x * 2).min(self.size.x - 1);
        let x1 = (x * 2 + 1).min(self.size.x - 1);
        let y0 = (y * 2).min(self.size.y - 1);
        let y1 = (y * 2 + 1).min(self.size.y - 1);
        texels.push(self.get(x0, y0).max(self.get(x1, y0)).max(self.get(x0, y1)).max(self.get(x1, y1)));
      }
    }
    HzbMip { size, texels }
  }
}

/// Max-depth mip chain built from last frame's depth buffer.
#[derive(Clone, Debug)]
pub struct Hzb {
  mips: Vec<HzbMip>,
}

impl Hzb {
  /// Build the chain down to 1×1.
  ///
  /// # Panics
  /// If `depth.len()` does not match `size` or `size` has a zero axis.
  pub fn from_depth(size: UVec2, depth: &[f32]) -> Self {
    assert!(size.x > 0 && size.y > 0, "HZB needs a non-empty depth buffer");
    assert_eq!(depth.len(), (size.x * size.y) as usize, "depth length must match size");

    let mut mips = vec![HzbMip {
      size,
      texels: depth.to_vec(),
    }];
    loop {
      let prev = &mips[mips.len() - 1];
      if prev.size == UVec2::ONE {
        break;
      }
      let next = prev.downsample();
      mips.push(next);
    }
    Self { mips }
  }

  /// Uniform depth everywhere.
  pub fn filled(size: UVec2, depth: f32) -> Self {
    Self::from_depth(size, &vec![depth; (size.x * size.y) as usize])
  }

  #[inline]
  pub fn size(&self) -> UVec2 {
    self.mips[0].size
  }

  #[inline]
  pub fn mip_count(&self) -> usize {
    self.mips.len()
  }

  /// Whether `bounds` may be visible, reprojected with `view_projection`.
  ///
  /// Boxes crossing the near plane or leaving the viewport entirely are
  /// reported visible; frustum culling owns the latter.
  pub fn is_box_visible(&self, bounds: &Aabb, view_projection: &Mat4) -> bool {
    let mut ndc_min = Vec2::splat(f32::MAX);
    let mut ndc_max = Vec2::splat(f32::MIN);
    let mut nearest = f32::MAX;
    for corner in bounds.corners() {
      let clip = *view_projection * corner.extend(1.0);
      if clip.w <= f32::EPSILON {
        return true;
      }
      let ndc = clip.truncate() / clip.w;
      ndc_min = ndc_min.min(ndc.truncate());
      ndc_max = ndc_max.max(ndc.truncate());
      nearest = nearest.min(ndc.z);
    }
    if ndc_max.x < -1.0 || ndc_min.x > 1.0 || ndc_max.y < -1.0 || ndc_min.y > 1.0 {
      return true;
    }

    // NDC y points up, texel rows point down.
    let to_uv = |ndc: Vec2| Vec2::new(ndc.x * 0.5 + 0.5, 0.5 - ndc.y * 0.5).clamp(Vec2::ZERO, Vec2::ONE);
    let uv_a = to_uv(ndc_min);
    let uv_b = to_uv(ndc_max);
    let size = self.size().as_vec2();
    let last = self.size() - 1;
    let px_min = (uv_a.min(uv_b) * size).as_uvec2().min(last);
    let px_max = (uv_a.max(uv_b) * size).as_uvec2().min(last);

    let furthest = self.furthest_in_rect(px_min, px_max);
    nearest <= furthest
  }

  /// Furthest depth over a mip-0 texel rectangle, read from the first mip
  /// where the rectangle spans at most 2×2 texels.
  fn furthest_in_rect(&self, px_min: UVec2, px_max: UVec2) -> f32 {
    for (level, mip) in self.mips.iter().enumerate() {
      let lo = (px_min >> level as u32).min(mip.size - 1);
      let hi = (px_max >> level as u32).min(mip.size - 1);
      if hi.x - lo.x <= 1 && hi.y - lo.y <= 1 {
        let mut furthest = f32::MIN;
        for y in lo.y..=hi.y {
          for x in lo.x..=hi.x {
            furthest = furthest.max(mip.get(x, y));
          }
        }
        return furthest;
      }
    }
    // The 1×1 mip always satisfies the span test.
    1.0
  }
}

#[cfg(test)]
#[path = "hzb_test.rs"]
mod hzb_test;
