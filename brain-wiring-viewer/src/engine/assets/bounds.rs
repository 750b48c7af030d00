use bevy::math::Affine3A;
use bevy::prelude::*;
use bevy::render::primitives::Aabb;
use serde::{Deserialize, Serialize};

/// Axis-aligned 3D bounds used for normalization and camera framing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundsData {
    pub min: Vec3,
    pub max: Vec3,
}

impl BoundsData {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self {
            min: min.min(max),
            max: min.max(max),
        }
    }

    /// Tight bounds around a point set. `None` for an empty set.
    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Option<Self> {
        let mut points = points.into_iter();
        let first = points.next()?;
        let mut bounds = Self {
            min: first,
            max: first,
        };
        for point in points {
            bounds.include(point);
        }
        Some(bounds)
    }

    /// Grow bounds to contain a point.
    pub fn include(&mut self, point: Vec3) {
        self.min = self.min.min(point);
        self.max = self.max.max(point);
    }

    pub fn union(&self, other: &Self) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Calculate center point for normalization and orbit targeting.
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Width, height and depth of the box.
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    pub fn max_dimension(&self) -> f32 {
        self.size().max_element()
    }

    /// True when the box has no extent along any axis.
    pub fn is_degenerate(&self) -> bool {
        self.max_dimension() <= f32::EPSILON
    }

    pub fn corners(&self) -> [Vec3; 8] {
        let (lo, hi) = (self.min, self.max);
        [
            Vec3::new(lo.x, lo.y, lo.z),
            Vec3::new(hi.x, lo.y, lo.z),
            Vec3::new(lo.x, hi.y, lo.z),
            Vec3::new(hi.x, hi.y, lo.z),
            Vec3::new(lo.x, lo.y, hi.z),
            Vec3::new(hi.x, lo.y, hi.z),
            Vec3::new(lo.x, hi.y, hi.z),
            Vec3::new(hi.x, hi.y, hi.z),
        ]
    }

    /// Bounds of this box after an affine transform.
    pub fn transformed(&self, affine: &Affine3A) -> Self {
        let corners = self.corners().map(|c| affine.transform_point3(c));
        // Eight corners, never empty.
        let mut out = Self {
            min: corners[0],
            max: corners[0],
        };
        for corner in &corners[1..] {
            out.include(*corner);
        }
        out
    }

    pub fn from_aabb(aabb: &Aabb) -> Self {
        Self::new(aabb.min().into(), aabb.max().into())
    }
}
