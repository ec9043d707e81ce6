use nalgebra::{Point3, Vector3};

use crate::{domain::ParamDomain, geometry::ParametricGeometry, misc::FloatingPoint};

/// A zero-parameter geometric object: a single point.
#[derive(Debug, Clone, PartialEq)]
pub struct PointGeometry<T: FloatingPoint> {
    point: Point3<T>,
}

impl<T: FloatingPoint> PointGeometry<T> {
    pub fn new(point: Point3<T>) -> Self {
        Self { point }
    }
}

impl<T: FloatingPoint> ParametricGeometry<T> for PointGeometry<T> {
    fn parameter_count(&self) -> usize {
        0
    }

    fn domain(&self) -> ParamDomain<T> {
        ParamDomain::point()
    }

    fn point(&self, _params: &[T]) -> Point3<T> {
        self.point
    }

    fn derivative(&self, _params: &[T], _direction: usize) -> Vector3<T> {
        Vector3::zeros()
    }

    fn hull_points(&self, _domain: &ParamDomain<T>) -> Vec<Point3<T>> {
        vec![self.point]
    }

    fn deviation_from_linear(&self, _domain: &ParamDomain<T>) -> T {
        T::zero()
    }
}
