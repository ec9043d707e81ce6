use nalgebra::{Point3, Vector3};

use crate::misc::FloatingPoint;

/// An axis-aligned bounding box in 3D space.
#[derive(Clone, Debug)]
pub struct BoundingBox<T: FloatingPoint> {
    min: Vector3<T>,
    max: Vector3<T>,
}

impl<T: FloatingPoint> BoundingBox<T> {
    /// Create a new bounding box from a minimum and maximum point.
    pub fn new(min: Vector3<T>, max: Vector3<T>) -> Self {
        let mut tmin = Vector3::from_element(T::max_value().unwrap());
        let mut tmax = -tmin;

        for i in 0..3 {
            tmin[i] = tmin[i].min(min[i]).min(max[i]);
            tmax[i] = tmax[i].max(max[i]).max(min[i]);
        }

        BoundingBox {
            min: tmin,
            max: tmax,
        }
    }

    /// Create a new bounding box from a point iterator.
    pub fn new_with_points<I: IntoIterator<Item = Point3<T>>>(iter: I) -> Self {
        let mut min = Vector3::from_element(T::max_value().unwrap());
        let mut max = -min;

        for point in iter {
            for i in 0..3 {
                min[i] = min[i].min(point[i]);
                max[i] = max[i].max(point[i]);
            }
        }

        Self { min, max }
    }

    pub fn min(&self) -> &Vector3<T> {
        &self.min
    }

    pub fn max(&self) -> &Vector3<T> {
        &self.max
    }

    pub fn center(&self) -> Vector3<T> {
        (self.min + self.max) / T::from_usize(2).unwrap()
    }

    pub fn size(&self) -> Vector3<T> {
        self.max - self.min
    }

    pub fn diagonal(&self) -> T {
        self.size().norm()
    }

    /// Check if the bounding box intersects with another bounding box.
    ///
    /// # Examples
    /// ```
    /// use nalgebra::Vector3;
    /// use parisect::prelude::BoundingBox;
    ///
    /// let b0 = BoundingBox::new(Vector3::from_element(0.), Vector3::from_element(1.));
    /// assert!(b0.intersects(&b0, None));
    ///
    /// let eps = 1e-6;
    /// let b1 = BoundingBox::new(Vector3::from_element(0.5), Vector3::from_element(1.5));
    /// assert!(b0.intersects(&b1, None));
    ///
    /// let b2 = BoundingBox::new(Vector3::from_element(1. + eps), Vector3::from_element(2. + eps));
    /// assert!(!b0.intersects(&b2, None));
    /// ```
    pub fn intersects(&self, other: &Self, tolerance: Option<T>) -> bool {
        let tolerance = tolerance.unwrap_or(T::default_epsilon());
        // Check if the bounding boxes intersect along each dimension.
        for i in 0..3 {
            let a0 = self.min[i] - tolerance;
            let a1 = self.max[i] + tolerance;
            let b0 = other.min[i] - tolerance;
            let b1 = other.max[i] + tolerance;

            let d0 = b0 - a1;
            let d1 = b1 - a0;

            // If the intervals are disjoint,
            // there is no intersection.
            if d0 * d1 > T::zero() {
                return false;
            }
        }

        true
    }

    /// Check if the bounding box contains a point.
    pub fn contains(&self, point: &Point3<T>) -> bool {
        (0..3).all(|i| self.min[i] <= point[i] && point[i] <= self.max[i])
    }

    pub fn union(&self, other: &Self) -> Self {
        Self {
            min: self.min.inf(&other.min),
            max: self.max.sup(&other.max),
        }
    }
}

impl<T: FloatingPoint> FromIterator<Point3<T>> for BoundingBox<T> {
    fn from_iter<I: IntoIterator<Item = Point3<T>>>(iter: I) -> Self {
        Self::new_with_points(iter)
    }
}

/// The interval spanned by a point set projected onto an axis.
/// Support for the rotated (separating axis) box test.
pub fn projected_interval<'a, T: FloatingPoint + 'a, I: IntoIterator<Item = &'a Point3<T>>>(
    points: I,
    axis: &Vector3<T>,
) -> (T, T) {
    let mut min = T::max_value().unwrap();
    let mut max = -min;
    for p in points {
        let d = axis.dot(&p.coords);
        min = min.min(d);
        max = max.max(d);
    }
    (min, max)
}
