use anyhow::ensure;
use nalgebra::{Point3, Vector3};

use crate::{
    domain::{Interval, ParamDomain},
    geometry::{
        bezier_curve::{chord_deviation, de_casteljau, extract_control_points},
        ParametricGeometry,
    },
    misc::{FloatingPoint, Plane},
};

/// A tensor-product polynomial Bézier patch over `[0, 1] x [0, 1]`.
/// `control_points[i][j]` is the control point at row `i` (u direction)
/// and column `j` (v direction).
#[derive(Debug, Clone, PartialEq)]
pub struct BezierSurface<T: FloatingPoint> {
    control_points: Vec<Vec<Point3<T>>>,
    self_intersecting: bool,
}

impl<T: FloatingPoint> BezierSurface<T> {
    /// Try to create a patch from its control net.
    /// At least a 2x2 net with rows of equal length is required.
    pub fn try_new(control_points: Vec<Vec<Point3<T>>>) -> anyhow::Result<Self> {
        ensure!(
            control_points.len() >= 2,
            "Bezier surface requires at least 2 control point rows, got {}",
            control_points.len()
        );
        let columns = control_points[0].len();
        ensure!(columns >= 2, "Bezier surface requires at least 2 columns");
        ensure!(
            control_points.iter().all(|row| row.len() == columns),
            "Bezier surface control net must be rectangular"
        );
        Ok(Self {
            control_points,
            self_intersecting: false,
        })
    }

    /// Mark the patch as crossing itself somewhere in its domain.
    pub fn with_self_intersecting(mut self, flag: bool) -> Self {
        self.self_intersecting = flag;
        self
    }

    pub fn control_points(&self) -> &[Vec<Point3<T>>] {
        &self.control_points
    }

    pub fn u_degree(&self) -> usize {
        self.control_points.len() - 1
    }

    pub fn v_degree(&self) -> usize {
        self.control_points[0].len() - 1
    }

    /// Control net restricted to a sub-domain, extracted row- and column-wise.
    fn extract_net(&self, domain: &ParamDomain<T>) -> Vec<Vec<Point3<T>>> {
        let u = domain.interval_at(0);
        let v = domain.interval_at(1);
        let rows = self
            .control_points
            .iter()
            .map(|row| extract_control_points(row, v))
            .collect::<Vec<_>>();
        let columns = rows[0].len();
        (0..columns)
            .map(|j| {
                let column = rows.iter().map(|row| row[j]).collect::<Vec<_>>();
                extract_control_points(&column, u)
            })
            .fold(
                vec![Vec::with_capacity(columns); self.control_points.len()],
                |mut net, column| {
                    for (row, p) in net.iter_mut().zip(column) {
                        row.push(p);
                    }
                    net
                },
            )
    }
}

impl<T: FloatingPoint> ParametricGeometry<T> for BezierSurface<T> {
    fn parameter_count(&self) -> usize {
        2
    }

    fn domain(&self) -> ParamDomain<T> {
        let unit = Interval::new(T::zero(), T::one());
        ParamDomain::surface(unit, unit)
    }

    fn point(&self, params: &[T]) -> Point3<T> {
        let column = self
            .control_points
            .iter()
            .map(|row| de_casteljau(row, params[1]))
            .collect::<Vec<_>>();
        de_casteljau(&column, params[0])
    }

    fn derivative(&self, params: &[T], direction: usize) -> Vector3<T> {
        match direction {
            0 => {
                let column = self
                    .control_points
                    .iter()
                    .map(|row| de_casteljau(row, params[1]))
                    .collect::<Vec<_>>();
                let n = T::from_usize(self.u_degree()).unwrap();
                let diff = column
                    .windows(2)
                    .map(|w| Point3::from(w[1] - w[0]))
                    .collect::<Vec<_>>();
                de_casteljau(&diff, params[0]).coords * n
            }
            _ => {
                let row = (0..=self.v_degree())
                    .map(|j| {
                        let column = self
                            .control_points
                            .iter()
                            .map(|r| r[j])
                            .collect::<Vec<_>>();
                        de_casteljau(&column, params[0])
                    })
                    .collect::<Vec<_>>();
                let m = T::from_usize(self.v_degree()).unwrap();
                let diff = row
                    .windows(2)
                    .map(|w| Point3::from(w[1] - w[0]))
                    .collect::<Vec<_>>();
                de_casteljau(&diff, params[1]).coords * m
            }
        }
    }

    fn hull_points(&self, domain: &ParamDomain<T>) -> Vec<Point3<T>> {
        self.extract_net(domain).into_iter().flatten().collect()
    }

    fn deviation_from_linear(&self, domain: &ParamDomain<T>) -> T {
        let net = self.extract_net(domain);
        let c00 = net[0][0];
        let c10 = net[net.len() - 1][0];
        let c01 = net[0][net[0].len() - 1];
        match Plane::from_spanning_vectors(&c00, &(c10 - c00), &(c01 - c00)) {
            Some(plane) => net
                .iter()
                .flatten()
                .map(|p| plane.signed_distance(p).abs())
                .fold(T::zero(), |acc, d| acc.max(d)),
            // Corner-degenerate net: fall back to the diagonal chord.
            None => chord_deviation(&net.into_iter().flatten().collect::<Vec<_>>()),
        }
    }

    fn is_self_intersecting(&self) -> bool {
        self.self_intersecting
    }
}
