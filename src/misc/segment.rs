use nalgebra::{Point3, Vector3};

use crate::misc::{FloatingPoint, Plane};

/// A segment in 3D space, parameterized over `[0, 1]`.
#[derive(Debug, Clone)]
pub struct Segment<T: FloatingPoint> {
    pub a: Point3<T>,
    pub b: Point3<T>,
}

impl<T: FloatingPoint> Segment<T> {
    pub fn new(a: Point3<T>, b: Point3<T>) -> Self {
        Self { a, b }
    }

    pub fn direction(&self) -> Vector3<T> {
        self.b - self.a
    }

    pub fn length(&self) -> T {
        self.direction().norm()
    }

    pub fn point_at(&self, t: T) -> Point3<T> {
        self.a + self.direction() * t
    }

    /// Find the closest point on the segment.
    /// Returns the normalized parameter & the point itself.
    pub fn closest_point(&self, pt: &Point3<T>) -> (T, Point3<T>) {
        let dif = self.direction();
        let l = dif.norm();
        if l < T::default_epsilon() {
            return (T::zero(), self.a);
        }

        let r = dif / l;
        let d = (pt - self.a).dot(&r);
        if d < T::zero() {
            (T::zero(), self.a)
        } else if d > l {
            (T::one(), self.b)
        } else {
            (d / l, self.a + r * d)
        }
    }

    /// Closest approach between two segments.
    /// Returns the clamped parameter on each segment.
    pub fn closest_parameters(&self, other: &Self) -> (T, T) {
        let d1 = self.direction();
        let d2 = other.direction();
        let r = self.a - other.a;
        let a = d1.norm_squared();
        let e = d2.norm_squared();
        let f = d2.dot(&r);

        let zero = T::zero();
        let one = T::one();

        if a <= T::default_epsilon() && e <= T::default_epsilon() {
            return (zero, zero);
        }
        if a <= T::default_epsilon() {
            return (zero, (f / e).clamp(zero, one));
        }

        let c = d1.dot(&r);
        if e <= T::default_epsilon() {
            return ((-c / a).clamp(zero, one), zero);
        }

        let b = d1.dot(&d2);
        let denom = a * e - b * b;
        let mut s = if denom > T::default_epsilon() * a * e {
            ((b * f - c * e) / denom).clamp(zero, one)
        } else {
            zero
        };
        let mut t = (b * s + f) / e;
        if t < zero {
            t = zero;
            s = (-c / a).clamp(zero, one);
        } else if t > one {
            t = one;
            s = ((b - c) / a).clamp(zero, one);
        }
        (s, t)
    }

    /// Parameter where the segment crosses a plane.
    /// Returns `None` if the segment is parallel to the plane.
    pub fn plane_parameter(&self, plane: &Plane<T>) -> Option<T> {
        let dir = self.direction();
        let denom = plane.normal().dot(&dir);
        if denom.abs() <= T::default_epsilon() * dir.norm() {
            return None;
        }
        let num = -(plane.constant() + plane.normal().dot(&self.a.coords));
        Some(num / denom)
    }
}
