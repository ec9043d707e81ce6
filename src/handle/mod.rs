use std::sync::Arc;

use nalgebra::{Point3, Vector3};

use crate::{
    bounding_box::BoundingBox,
    domain::ParamDomain,
    geometry::{IsoParameterCurve, ParametricGeometry, PointGeometry},
    misc::FloatingPoint,
};

/// Uniform wrapper around a point, curve or surface together with its
/// current parameter sub-domain. Narrowing shares the underlying geometry;
/// only the domain metadata and the cached bounding volume change.
#[derive(Clone)]
pub struct ObjectHandle<T: FloatingPoint> {
    geometry: Arc<dyn ParametricGeometry<T>>,
    domain: ParamDomain<T>,
    bounding_box: BoundingBox<T>,
}

impl<T: FloatingPoint> ObjectHandle<T> {
    /// Wrap a geometry over its full parameter domain.
    pub fn new(geometry: Arc<dyn ParametricGeometry<T>>) -> Self {
        let domain = geometry.domain();
        let bounding_box = BoundingBox::new_with_points(geometry.hull_points(&domain));
        Self {
            geometry,
            domain,
            bounding_box,
        }
    }

    /// The same geometry restricted to a sub-domain.
    pub fn narrowed(&self, domain: ParamDomain<T>) -> Self {
        let bounding_box = BoundingBox::new_with_points(self.geometry.hull_points(&domain));
        Self {
            geometry: self.geometry.clone(),
            domain,
            bounding_box,
        }
    }

    pub fn geometry(&self) -> &Arc<dyn ParametricGeometry<T>> {
        &self.geometry
    }

    pub fn parameter_count(&self) -> usize {
        self.geometry.parameter_count()
    }

    pub fn domain(&self) -> &ParamDomain<T> {
        &self.domain
    }

    /// The full domain of the underlying geometry, ignoring narrowing.
    pub fn full_domain(&self) -> ParamDomain<T> {
        self.geometry.domain()
    }

    pub fn bounding_box(&self) -> &BoundingBox<T> {
        &self.bounding_box
    }

    pub fn point(&self, params: &[T]) -> Point3<T> {
        self.geometry.point(params)
    }

    pub fn derivative(&self, params: &[T], direction: usize) -> Vector3<T> {
        self.geometry.derivative(params, direction)
    }

    pub fn hull_points(&self) -> Vec<Point3<T>> {
        self.geometry.hull_points(&self.domain)
    }

    pub fn deviation_from_linear(&self) -> T {
        self.geometry.deviation_from_linear(&self.domain)
    }

    pub fn is_self_intersecting(&self) -> bool {
        self.geometry.is_self_intersecting()
    }

    /// Whether two handles wrap the same underlying geometry object.
    pub fn same_geometry(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.geometry, &other.geometry)
    }

    /// Split one parameter axis at the given value into two narrowed handles.
    pub fn subdivide(&self, axis: usize, t: T) -> (Self, Self) {
        let (head, tail) = self.domain.split(axis, t);
        (self.narrowed(head), self.narrowed(tail))
    }

    /// Number of boundary objects: none for a point, the two end points for
    /// a curve, the four edge curves for a surface.
    pub fn boundary_count(&self) -> usize {
        match self.parameter_count() {
            0 => 0,
            1 => 2,
            _ => 4,
        }
    }

    /// The reduced-dimension boundary object with the given index.
    /// Curve boundaries are ordered start, end; surface boundaries are
    /// ordered u-min, u-max, v-min, v-max.
    pub fn boundary_at(&self, index: usize) -> BoundaryHandle<T> {
        debug_assert!(index < self.boundary_count());
        match self.parameter_count() {
            1 => {
                let interval = self.domain.interval_at(0);
                let value = if index == 0 {
                    interval.min()
                } else {
                    interval.max()
                };
                let point = self.geometry.point(&[value]);
                let handle = ObjectHandle::new(Arc::new(PointGeometry::new(point)));
                BoundaryHandle {
                    handle,
                    index,
                    eliminated_parameter: 0,
                    eliminated_value: value,
                }
            }
            _ => {
                let direction = index / 2;
                let interval = self.domain.interval_at(direction);
                let value = if index % 2 == 0 {
                    interval.min()
                } else {
                    interval.max()
                };
                let iso = IsoParameterCurve::new(self.geometry.clone(), direction, value);
                let other = *self.domain.interval_at(1 - direction);
                let handle =
                    ObjectHandle::new(Arc::new(iso)).narrowed(ParamDomain::curve(other));
                BoundaryHandle {
                    handle,
                    index,
                    eliminated_parameter: direction,
                    eliminated_value: value,
                }
            }
        }
    }
}

/// A reduced-dimension view on one boundary of a parametric object,
/// tagged with the parameter it eliminates. Read-only after creation.
#[derive(Clone)]
pub struct BoundaryHandle<T: FloatingPoint> {
    handle: ObjectHandle<T>,
    index: usize,
    eliminated_parameter: usize,
    eliminated_value: T,
}

impl<T: FloatingPoint> BoundaryHandle<T> {
    pub fn handle(&self) -> &ObjectHandle<T> {
        &self.handle
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn eliminated_parameter(&self) -> usize {
        self.eliminated_parameter
    }

    pub fn eliminated_value(&self) -> T {
        self.eliminated_value
    }
}
