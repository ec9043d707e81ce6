pub mod bezier_curve;
pub mod bezier_surface;
pub mod iso_parameter_curve;
pub mod point;

pub use bezier_curve::*;
pub use bezier_surface::*;
pub use iso_parameter_curve::*;
pub use point::*;

use nalgebra::{Point3, Vector3};

use crate::{domain::ParamDomain, misc::FloatingPoint};

/// Evaluation capability over a point, curve or surface consumed by the
/// intersection engine. Implementations are assumed correct; the engine
/// only queries, it never mutates geometry.
pub trait ParametricGeometry<T: FloatingPoint> {
    /// Number of parameters: 0 for a point, 1 for a curve, 2 for a surface.
    fn parameter_count(&self) -> usize;

    /// The full parameter domain of the geometry.
    fn domain(&self) -> ParamDomain<T>;

    /// Evaluate the geometry at a parameter tuple.
    fn point(&self, params: &[T]) -> Point3<T>;

    /// First derivative along one parameter direction.
    fn derivative(&self, params: &[T], direction: usize) -> Vector3<T>;

    /// A finite point set whose convex hull contains the restriction of the
    /// geometry to the given sub-domain. Bounding volumes and separating
    /// axis tests are derived from it.
    fn hull_points(&self, domain: &ParamDomain<T>) -> Vec<Point3<T>>;

    /// Max distance of the restricted geometry from its linear interpolant
    /// (the chord of a curve, the corner plane of a surface).
    fn deviation_from_linear(&self, domain: &ParamDomain<T>) -> T;

    /// Whether the object is known to cross itself somewhere in its domain.
    fn is_self_intersecting(&self) -> bool {
        false
    }
}
