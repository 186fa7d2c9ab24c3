//! View frustum in permuted (structure-of-arrays) form.
//!
//! Planes face outward: a point `p` is inside plane `(n, w)` when
//! `dot(n, p) <= w`. Eight planes are stored as eight `Vec4` rows so four
//! planes are tested per vector operation:
//!
//! ```text
//! rows[0..4] = X0 Y0 Z0 W0   (planes 0-3, one lane each)
//! rows[4..8] = X1 Y1 Z1 W1   (planes 4-7)
//! ```
//!
//! Fewer than eight planes are padded by repeating the last one.

use glam::{Mat4, Vec3, Vec4};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PermutedPlanes {
  pub rows: [Vec4; 8],
}

impl PermutedPlanes {
  /// Permute up to eight outward planes `(nx, ny, nz, w)`.
  ///
  /// # Panics
  /// If `planes` is empty or holds more than eight planes.
  pub fn from_planes(planes: &[Vec4]) -> Self {
    assert!(
      (1..=8).contains(&planes.len()),
      "a frustum has 1..=8 planes, got {}",
      planes.len()
    );
    let plane = |i: usize| planes[i.min(planes.len() - 1)];
    let mut rows = [Vec4::ZERO; 8];
    for block in 0..2 {
      for lane in 0..4 {
        let p = plane(block * 4 + lane);
        rows[block * 4][lane] = p.x;
        rows[block * 4 + 1][lane] = p.y;
        rows[block * 4 + 2][lane] = p.z;
        rows[block * 4 + 3][lane] = p.w;
      }
    }
    Self { rows }
  }

  /// Left, right, bottom, top, near, and far planes of a `[0, 1]`-depth
  /// view-projection matrix.
  pub fn from_view_projection(view_projection: &Mat4) -> Self {
    let r0 = view_projection.row(0);
    let r1 = view_projection.row(1);
    let r2 = view_projection.row(2);
    let r3 = view_projection.row(3);
    // Inward planes with `a x + b y + c z + d >= 0` inside.
    let inward = [r3 + r0, r3 - r0, r3 + r1, r3 - r1, r2, r3 - r2];
    let outward = inward.map(|p| {
      let len = p.truncate().length().max(f32::EPSILON);
      Vec4::new(-p.x / len, -p.y / len, -p.z / len, p.w / len)
    });
    Self::from_planes(&outward)
  }

  /// Plane `i` in `(nx, ny, nz, w)` form.
  pub fn plane(&self, i: usize) -> Vec4 {
    let (block, lane) = (i / 4 * 4, i % 4);
    Vec4::new(
      self.rows[block][lane],
      self.rows[block + 1][lane],
      self.rows[block + 2][lane],
      self.rows[block + 3][lane],
    )
  }

  /// Box-versus-eight-planes test. Rejects the box when, for any plane, even
  /// its support point along the plane normal lies outside.
  #[inline]
  pub fn intersects_box(&self, center: Vec3, extent: Vec3) -> bool {
    for block in self.rows.chunks_exact(4) {
      let (nx, ny, nz, w) = (block[0], block[1], block[2], block[3]);
      let distance = nx * center.x + ny * center.y + nz * center.z - w;
      let push_out = nx.abs() * extent.x + ny.abs() * extent.y + nz.abs() * extent.z;
      if distance.cmpgt(push_out).any() {
        return false;
      }
    }
    true
  }
}

#[cfg(test)]
#[path = "frustum_test.rs"]
mod frustum_test;
