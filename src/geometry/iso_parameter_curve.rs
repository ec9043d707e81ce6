use std::sync::Arc;

use nalgebra::{Point3, Vector3};

use crate::{domain::ParamDomain, geometry::ParametricGeometry, misc::FloatingPoint};

/// A surface restricted to one of its iso-parameter lines: a curve with the
/// surface parameter in `fixed_direction` pinned to `fixed_value`. Boundary
/// objects of a surface handle are expressed through this adapter, so every
/// evaluation is delegated to the owning surface without copying geometry.
#[derive(Clone)]
pub struct IsoParameterCurve<T: FloatingPoint> {
    parent: Arc<dyn ParametricGeometry<T>>,
    fixed_direction: usize,
    fixed_value: T,
}

impl<T: FloatingPoint> IsoParameterCurve<T> {
    pub fn new(parent: Arc<dyn ParametricGeometry<T>>, fixed_direction: usize, fixed_value: T) -> Self {
        Self {
            parent,
            fixed_direction,
            fixed_value,
        }
    }

    pub fn fixed_direction(&self) -> usize {
        self.fixed_direction
    }

    pub fn fixed_value(&self) -> T {
        self.fixed_value
    }

    fn assemble(&self, params: &[T]) -> Vec<T> {
        let mut assembled = params.to_vec();
        assembled.insert(self.fixed_direction, self.fixed_value);
        assembled
    }

    fn embed_domain(&self, domain: &ParamDomain<T>) -> ParamDomain<T> {
        domain.embedded(self.fixed_direction, self.fixed_value)
    }
}

impl<T: FloatingPoint> ParametricGeometry<T> for IsoParameterCurve<T> {
    fn parameter_count(&self) -> usize {
        self.parent.parameter_count() - 1
    }

    fn domain(&self) -> ParamDomain<T> {
        self.parent.domain().eliminated(self.fixed_direction)
    }

    fn point(&self, params: &[T]) -> Point3<T> {
        self.parent.point(&self.assemble(params))
    }

    fn derivative(&self, params: &[T], direction: usize) -> Vector3<T> {
        let parent_direction = if direction >= self.fixed_direction {
            direction + 1
        } else {
            direction
        };
        self.parent.derivative(&self.assemble(params), parent_direction)
    }

    fn hull_points(&self, domain: &ParamDomain<T>) -> Vec<Point3<T>> {
        self.parent.hull_points(&self.embed_domain(domain))
    }

    fn deviation_from_linear(&self, domain: &ParamDomain<T>) -> T {
        self.parent.deviation_from_linear(&self.embed_domain(domain))
    }

    fn is_self_intersecting(&self) -> bool {
        self.parent.is_self_intersecting()
    }
}
