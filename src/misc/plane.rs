use nalgebra::{Point3, Vector3};

use crate::misc::FloatingPoint;

/// A plane in 3D space.
#[derive(Debug, Clone, PartialEq)]
pub struct Plane<T: FloatingPoint> {
    normal: Vector3<T>,
    constant: T,
}

impl<T: FloatingPoint> Plane<T> {
    pub fn new(normal: Vector3<T>, constant: T) -> Self {
        Self { normal, constant }
    }

    /// Build a plane spanned by two edge vectors through an origin point.
    /// Returns `None` if the spanning vectors are parallel.
    pub fn from_spanning_vectors(
        origin: &Point3<T>,
        e0: &Vector3<T>,
        e1: &Vector3<T>,
    ) -> Option<Self> {
        let n = e0.cross(e1);
        let scale = e0.norm() * e1.norm();
        if n.norm() <= T::default_epsilon() * scale {
            return None;
        }
        let normal = n.normalize();
        Some(Self::new(normal, -normal.dot(&origin.coords)))
    }

    pub fn normal(&self) -> Vector3<T> {
        self.normal
    }

    pub fn constant(&self) -> T {
        self.constant
    }

    /// Calculate the signed distance from a point to the plane.
    pub fn signed_distance(&self, point: &Point3<T>) -> T {
        self.normal.dot(&point.coords) + self.constant
    }

    /// Intersection line between two planes as an anchor point and a direction.
    /// Returns `None` if the planes are parallel.
    pub fn intersection_line(&self, other: &Self) -> Option<(Point3<T>, Vector3<T>)> {
        let dir = self.normal.cross(&other.normal);
        let denom = dir.norm_squared();
        if denom <= T::default_epsilon() {
            return None;
        }
        // Anchor point minimizing the norm among points on both planes.
        let a = self.normal * other.constant - other.normal * self.constant;
        let anchor = Point3::from(a.cross(&dir) / denom);
        Some((anchor, dir))
    }
}
