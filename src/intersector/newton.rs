use argmin::argmin_error_closure;
use argmin::core::{
    ArgminFloat, Error, Executor, IterState, Jacobian, Operator, Problem, Solver, State,
    TerminationReason, TerminationStatus, KV,
};
use nalgebra::{DMatrix, DVector, Point3};

use crate::{
    domain::Interval, handle::ObjectHandle, misc::FloatingPoint, tolerance::GeoTolerance,
};

/// Residual provider for the seeded local solve: the difference between the
/// two objects evaluated at a combined parameter vector.
pub struct PairDistanceProblem<'a, T: FloatingPoint> {
    a: &'a ObjectHandle<T>,
    b: &'a ObjectHandle<T>,
}

impl<'a, T: FloatingPoint> PairDistanceProblem<'a, T> {
    pub fn new(a: &'a ObjectHandle<T>, b: &'a ObjectHandle<T>) -> Self {
        Self { a, b }
    }

    fn split<'p>(&self, param: &'p DVector<T>) -> (&'p [T], &'p [T]) {
        param.as_slice().split_at(self.a.parameter_count())
    }
}

impl<T: FloatingPoint> Operator for PairDistanceProblem<'_, T> {
    type Param = DVector<T>;
    type Output = DVector<T>;

    fn apply(&self, param: &Self::Param) -> Result<Self::Output, Error> {
        let (pa, pb) = self.split(param);
        let d = self.a.point(pa) - self.b.point(pb);
        Ok(DVector::from_row_slice(d.as_slice()))
    }
}

impl<T: FloatingPoint> Jacobian for PairDistanceProblem<'_, T> {
    type Param = DVector<T>;
    type Jacobian = DMatrix<T>;

    fn jacobian(&self, param: &Self::Param) -> Result<Self::Jacobian, Error> {
        let (pa, pb) = self.split(param);
        let na = pa.len();
        let nb = pb.len();
        let mut jacobian = DMatrix::zeros(3, na + nb);
        for i in 0..na {
            let d = self.a.derivative(pa, i);
            for r in 0..3 {
                jacobian[(r, i)] = d[r];
            }
        }
        for i in 0..nb {
            let d = self.b.derivative(pb, i);
            for r in 0..3 {
                jacobian[(r, na + i)] = -d[r];
            }
        }
        Ok(jacobian)
    }
}

type NewtonState<T> = IterState<DVector<T>, (), (), (), DVector<T>, T>;

/// Gauss-Newton refinement constrained to the current parameter box.
/// Original source: https://argmin-rs.github.io/argmin/argmin/solver/gaussnewton/struct.GaussNewton.html
#[derive(Clone)]
pub struct BoxedGaussNewton<T: FloatingPoint> {
    bounds: Vec<Interval<T>>,
    tol_residual: T,
    tol_step: T,
}

impl<T: FloatingPoint> BoxedGaussNewton<T> {
    pub fn new(bounds: Vec<Interval<T>>, tol_residual: T, tol_step: T) -> Self {
        Self {
            bounds,
            tol_residual,
            tol_step,
        }
    }
}

impl<O, T> Solver<O, NewtonState<T>> for BoxedGaussNewton<T>
where
    O: Operator<Param = DVector<T>, Output = DVector<T>>
        + Jacobian<Param = DVector<T>, Jacobian = DMatrix<T>>,
    T: FloatingPoint + ArgminFloat,
{
    const NAME: &'static str = "Boxed Gauss-Newton";

    fn next_iter(
        &mut self,
        problem: &mut Problem<O>,
        mut state: NewtonState<T>,
    ) -> Result<(NewtonState<T>, Option<KV>), Error> {
        let param = state.take_param().ok_or_else(argmin_error_closure!(
            NotInitialized,
            concat!(
                "`BoxedGaussNewton` requires an initial parameter vector. ",
                "Please provide an initial guess via `Executor`s `configure` method."
            )
        ))?;

        let residuals = problem.apply(&param)?;
        let jacobian = problem.jacobian(&param)?;

        let jt = jacobian.transpose();
        let jtj = &jt * &jacobian;
        let rhs = &jt * &residuals;
        // A singular system means tangential contact in this box; report it
        // as a non-convergent solve and let the caller subdivide instead.
        let step = jtj
            .lu()
            .solve(&rhs)
            .ok_or_else(|| anyhow::anyhow!("singular normal equations"))?;

        let mut next = param - step;
        for (i, interval) in self.bounds.iter().enumerate() {
            next[i] = interval.clamp(next[i]);
        }

        let cost = residuals.norm();
        Ok((state.param(next).cost(cost).residuals(residuals), None))
    }

    fn terminate(&mut self, state: &NewtonState<T>) -> TerminationStatus {
        if state.get_cost() < self.tol_residual {
            return TerminationStatus::Terminated(TerminationReason::SolverConverged);
        }
        match (state.get_param(), state.get_prev_param()) {
            (Some(current), Some(prev)) => {
                if (current - prev).norm() < self.tol_step {
                    TerminationStatus::Terminated(TerminationReason::SolverConverged)
                } else {
                    TerminationStatus::NotTerminated
                }
            }
            _ => TerminationStatus::NotTerminated,
        }
    }
}

/// A refined intersection candidate with its residual distance.
#[derive(Debug, Clone)]
pub(crate) struct RefinedPoint<T: FloatingPoint> {
    pub params1: Vec<T>,
    pub params2: Vec<T>,
    pub point: Point3<T>,
    pub distance: T,
}

/// Run the boxed Gauss-Newton from a seed parameter tuple. Returns the best
/// candidate found, or `None` for a non-convergent solve; acceptance against
/// the spatial tolerance is up to the caller.
pub(crate) fn refine_pair_point<T: FloatingPoint + ArgminFloat>(
    a: &ObjectHandle<T>,
    b: &ObjectHandle<T>,
    seed: &[T],
    tol: &GeoTolerance<T>,
) -> Option<RefinedPoint<T>> {
    let half = T::from_f64(0.5).unwrap();
    let bounds = a
        .domain()
        .intervals()
        .iter()
        .chain(b.domain().intervals())
        .copied()
        .collect::<Vec<_>>();

    if bounds.is_empty() {
        // Point against point, nothing to iterate on.
        let pa = a.point(&[]);
        let pb = b.point(&[]);
        return Some(RefinedPoint {
            params1: vec![],
            params2: vec![],
            point: Point3::from((pa.coords + pb.coords) * half),
            distance: (pa - pb).norm(),
        });
    }

    let problem = PairDistanceProblem::new(a, b);
    let solver = BoxedGaussNewton::new(bounds, tol.numerical(), tol.numerical());
    let res = Executor::new(problem, solver)
        .configure(|state| state.param(DVector::from_row_slice(seed)).max_iters(32))
        .run();

    match res {
        Ok(r) => r.state().get_best_param().map(|param| {
            let (pa, pb) = param.as_slice().split_at(a.parameter_count());
            let p1 = a.point(pa);
            let p2 = b.point(pb);
            RefinedPoint {
                params1: pa.to_vec(),
                params2: pb.to_vec(),
                point: Point3::from((p1.coords + p2.coords) * half),
                distance: (p1 - p2).norm(),
            }
        }),
        Err(_) => None,
    }
}
