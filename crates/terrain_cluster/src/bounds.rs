//! Single-precision axis-aligned bounds for clusters and tiles.

use glam::{Affine3A, Vec3, Vec3A};

/// Axis-aligned bounding box stored as center and half-extent.
///
/// Center/extent is the form the cluster input record uploads, and the form the
/// frustum test consumes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
	pub center: Vec3,
	/// Half-size on each axis (non-negative).
	pub extent: Vec3,
}

impl Aabb {
	/// Create a box from min and max corners.
	///
	/// # Panics
	/// Debug-asserts that min <= max on all axes.
	pub fn from_min_max(min: Vec3, max: Vec3) -> Self {
		debug_assert!(
			min.x <= max.x && min.y <= max.y && min.z <= max.z,
			"AABB min must be <= max on all axes"
		);
		Self {
			center: (min + max) * 0.5,
			extent: (max - min) * 0.5,
		}
	}

	/// Smallest box containing all `points`, or `None` for an empty iterator.
	pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Option<Self> {
		let mut iter = points.into_iter();
		let first = iter.next()?;
		let (min, max) = iter.fold((first, first), |(min, max), p| (min.min(p), max.max(p)));
		Some(Self::from_min_max(min, max))
	}

	#[inline]
	pub fn min(&self) -> Vec3 {
		self.center - self.extent
	}

	#[inline]
	pub fn max(&self) -> Vec3 {
		self.center + self.extent
	}

	/// Smallest box containing both boxes.
	pub fn union(&self, other: &Aabb) -> Aabb {
		Aabb::from_min_max(self.min().min(other.min()), self.max().max(other.max()))
	}

	/// Transform by an affine matrix, returning the enclosing axis-aligned box.
	///
	/// Extent is projected through the absolute value of the linear part, so
	/// rotation grows the box instead of clipping it.
	pub fn transformed(&self, transform: &Affine3A) -> Aabb {
		let center = transform.transform_point3(self.center);
		let m = transform.matrix3;
		let e = Vec3A::from(self.extent);
		let extent = m.x_axis.abs() * e.x + m.y_axis.abs() * e.y + m.z_axis.abs() * e.z;
		Aabb {
			center,
			extent: extent.into(),
		}
	}

	/// Radius of the sphere circumscribing the box.
	#[inline]
	pub fn sphere_radius(&self) -> f32 {
		self.extent.length()
	}

	/// The eight corners, min corner first.
	pub fn corners(&self) -> [Vec3; 8] {
		let (min, max) = (self.min(), self.max());
		[
			Vec3::new(min.x, min.y, min.z),
			Vec3::new(max.x, min.y, min.z),
			Vec3::new(min.x, max.y, min.z),
			Vec3::new(max.x, max.y, min.z),
			Vec3::new(min.x, min.y, max.z),
			Vec3::new(max.x, min.y, max.z),
			Vec3::new(min.x, max.y, max.z),
			Vec3::new(max.x, max.y, max.z),
		]
	}
}

/// Box plus bounding sphere, sharing one origin.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoxSphereBounds {
	pub origin: Vec3,
	pub extent: Vec3,
	pub radius: f32,
}

impl From<Aabb> for BoxSphereBounds {
	fn from(aabb: Aabb) -> Self {
		Self {
			origin: aabb.center,
			extent: aabb.extent,
			radius: aabb.sphere_radius(),
		}
	}
}

impl BoxSphereBounds {
	/// Origin and radius packed the way the classification pass reads them.
	#[inline]
	pub fn origin_radius(&self) -> [f32; 4] {
		[self.origin.x, self.origin.y, self.origin.z, self.radius]
	}
}
