use anyhow::ensure;
use nalgebra::{Point3, Vector3};

use crate::{
    domain::{Interval, ParamDomain},
    geometry::ParametricGeometry,
    misc::{FloatingPoint, Segment},
};

/// A polynomial Bézier curve over `[0, 1]`, the minimal curve evaluator
/// the engine is exercised with.
#[derive(Debug, Clone, PartialEq)]
pub struct BezierCurve<T: FloatingPoint> {
    control_points: Vec<Point3<T>>,
    self_intersecting: bool,
}

impl<T: FloatingPoint> BezierCurve<T> {
    /// Try to create a curve from its control points.
    /// At least two control points are required.
    pub fn try_new(control_points: Vec<Point3<T>>) -> anyhow::Result<Self> {
        ensure!(
            control_points.len() >= 2,
            "Bezier curve requires at least 2 control points, got {}",
            control_points.len()
        );
        Ok(Self {
            control_points,
            self_intersecting: false,
        })
    }

    /// Mark the curve as crossing itself somewhere in its domain.
    pub fn with_self_intersecting(mut self, flag: bool) -> Self {
        self.self_intersecting = flag;
        self
    }

    pub fn control_points(&self) -> &[Point3<T>] {
        &self.control_points
    }

    pub fn degree(&self) -> usize {
        self.control_points.len() - 1
    }
}

/// Evaluate a Bézier simplex by de Casteljau's algorithm.
pub(crate) fn de_casteljau<T: FloatingPoint>(points: &[Point3<T>], t: T) -> Point3<T> {
    let mut pts = points.to_vec();
    let one = T::one();
    for level in (1..pts.len()).rev() {
        for i in 0..level {
            pts[i] = Point3::from(pts[i].coords * (one - t) + pts[i + 1].coords * t);
        }
    }
    pts[0]
}

/// Control points of the restriction to `[t, 1]`.
fn subdivide_right<T: FloatingPoint>(points: &[Point3<T>], t: T) -> Vec<Point3<T>> {
    let mut pts = points.to_vec();
    let mut right = Vec::with_capacity(pts.len());
    let one = T::one();
    right.push(pts[pts.len() - 1]);
    for level in (1..pts.len()).rev() {
        for i in 0..level {
            pts[i] = Point3::from(pts[i].coords * (one - t) + pts[i + 1].coords * t);
        }
        right.push(pts[level - 1]);
    }
    right.reverse();
    right
}

/// Control points of the restriction to `[0, t]`.
fn subdivide_left<T: FloatingPoint>(points: &[Point3<T>], t: T) -> Vec<Point3<T>> {
    let mut pts = points.to_vec();
    let mut left = Vec::with_capacity(pts.len());
    let one = T::one();
    left.push(pts[0]);
    for level in (1..pts.len()).rev() {
        for i in 0..level {
            pts[i] = Point3::from(pts[i].coords * (one - t) + pts[i + 1].coords * t);
        }
        left.push(pts[0]);
    }
    left
}

/// Control points of the restriction to `[a, b]`.
pub(crate) fn extract_control_points<T: FloatingPoint>(
    points: &[Point3<T>],
    interval: &Interval<T>,
) -> Vec<Point3<T>> {
    let a = interval.min();
    let b = interval.max();
    let one = T::one();
    if one - a <= T::default_epsilon() {
        // Degenerate tail: the whole restriction collapses to the end point.
        let p = de_casteljau(points, a);
        return vec![p; points.len()];
    }
    let right = subdivide_right(points, a);
    let local = (b - a) / (one - a);
    subdivide_left(&right, local)
}

/// Max distance of a control point set from the chord spanned by its ends.
pub(crate) fn chord_deviation<T: FloatingPoint>(points: &[Point3<T>]) -> T {
    let chord = Segment::new(points[0], points[points.len() - 1]);
    points
        .iter()
        .map(|p| {
            let (_, closest) = chord.closest_point(p);
            (p - closest).norm()
        })
        .fold(T::zero(), |acc, d| acc.max(d))
}

impl<T: FloatingPoint> ParametricGeometry<T> for BezierCurve<T> {
    fn parameter_count(&self) -> usize {
        1
    }

    fn domain(&self) -> ParamDomain<T> {
        ParamDomain::curve(Interval::new(T::zero(), T::one()))
    }

    fn point(&self, params: &[T]) -> Point3<T> {
        de_casteljau(&self.control_points, params[0])
    }

    fn derivative(&self, params: &[T], _direction: usize) -> Vector3<T> {
        let n = T::from_usize(self.degree()).unwrap();
        let diff = self
            .control_points
            .windows(2)
            .map(|w| Point3::from(w[1] - w[0]))
            .collect::<Vec<_>>();
        de_casteljau(&diff, params[0]).coords * n
    }

    fn hull_points(&self, domain: &ParamDomain<T>) -> Vec<Point3<T>> {
        extract_control_points(&self.control_points, domain.interval_at(0))
    }

    fn deviation_from_linear(&self, domain: &ParamDomain<T>) -> T {
        chord_deviation(&extract_control_points(
            &self.control_points,
            domain.interval_at(0),
        ))
    }

    fn is_self_intersecting(&self) -> bool {
        self.self_intersecting
    }
}
