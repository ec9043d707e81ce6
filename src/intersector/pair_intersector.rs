use std::sync::Arc;

use anyhow::{ensure, Result};
use argmin::core::ArgminFloat;
use itertools::Itertools;
use log::{debug, trace, warn};
use nalgebra::{ComplexField, Point3, RealField};

use crate::{
    domain::{Interval, ParamDomain},
    geometry::PointGeometry,
    handle::ObjectHandle,
    intersector::{
        classification::{
            is_simple_case, normal_cone, rotated_box_separated, tangent_cone, Interception,
        },
        linear_case::linear_intersections,
        newton::refine_pair_point,
        results::{compare_params, EliminatedParameter, Intersection, IntersectionPoint, Side},
    },
    misc::{FloatingPoint, Segment},
    tolerance::GeoTolerance,
};

/// Find all intersections between two parametric objects.
///
/// Results are points, linear pieces of intersection curves, and coincidence
/// regions, each carrying parameters in both objects' parameter spaces.
///
/// # Examples
/// ```
/// use std::sync::Arc;
/// use nalgebra::Point3;
/// use parisect::prelude::*;
///
/// let line = BezierCurve::try_new(vec![
///     Point3::new(0.4, 0.7, -0.3),
///     Point3::new(0.4, 0.7, 0.7),
/// ])
/// .unwrap();
/// let patch = BezierSurface::try_new(vec![
///     vec![Point3::new(0., 0., 0.), Point3::new(0., 1., 0.)],
///     vec![Point3::new(1., 0., 0.), Point3::new(1., 1., 0.)],
/// ])
/// .unwrap();
///
/// let results = intersect(
///     &ObjectHandle::new(Arc::new(line)),
///     &ObjectHandle::new(Arc::new(patch)),
///     &GeoTolerance::new(1e-7),
/// )
/// .unwrap();
/// assert_eq!(results.len(), 1);
/// assert!(results[0].is_point());
/// ```
pub fn intersect<T: FloatingPoint + ArgminFloat>(
    obj1: &ObjectHandle<T>,
    obj2: &ObjectHandle<T>,
    tol: &GeoTolerance<T>,
) -> Result<Vec<Intersection<T>>> {
    PairIntersector::new(tol.clone()).solve(obj1, obj2)
}

/// [`intersect`] with a spatial epsilon only; the remaining tolerances are
/// derived from it.
pub fn intersect_with_epsge<T: FloatingPoint + ArgminFloat>(
    obj1: &ObjectHandle<T>,
    obj2: &ObjectHandle<T>,
    epsge: T,
) -> Result<Vec<Intersection<T>>> {
    intersect(obj1, obj2, &GeoTolerance::new(epsge))
}

/// Find the self-intersections of a single curve or surface.
///
/// The object is split into parts and the parts are intersected pairwise;
/// contacts along the shared split boundaries (equal parameters on both
/// sides) are filtered out, leaving genuine self-crossings.
pub fn self_intersections<T: FloatingPoint + ArgminFloat>(
    obj: &ObjectHandle<T>,
    tol: &GeoTolerance<T>,
) -> Result<Vec<Intersection<T>>> {
    let engine = PairIntersector::new(tol.clone()).with_self_intersection_case(true);
    engine.validate(obj, obj)?;
    if obj.parameter_count() == 0 {
        return Ok(vec![]);
    }
    debug!(
        "self-intersecting a {}-parameter object",
        obj.parameter_count()
    );
    let raw = engine.collect_self(obj, 0)?;
    Ok(engine.finalize(raw, obj, obj))
}

/// One node of the recursion: the two objects narrowed to their current
/// sub-domains. Children are built by value; nodes never point back at
/// their parents.
struct NodeContext<T: FloatingPoint> {
    obj1: ObjectHandle<T>,
    obj2: ObjectHandle<T>,
    depth: usize,
}

/// Recursive intersection engine for a pair of parametric objects.
pub struct PairIntersector<T: FloatingPoint> {
    tol: GeoTolerance<T>,
    selfint: bool,
}

impl<T: FloatingPoint + ArgminFloat> PairIntersector<T> {
    pub fn new(tol: GeoTolerance<T>) -> Self {
        Self {
            tol,
            selfint: false,
        }
    }

    /// Mark this engine as part of a self-intersection computation. The two
    /// objects then always share geometry, and contacts with equal
    /// parameters on both sides are discarded as trivial.
    pub fn with_self_intersection_case(mut self, selfint: bool) -> Self {
        self.selfint = selfint;
        self
    }

    pub fn is_self_intersection_case(&self) -> bool {
        self.selfint
    }

    pub fn tolerance(&self) -> &GeoTolerance<T> {
        &self.tol
    }

    pub fn solve(
        &self,
        obj1: &ObjectHandle<T>,
        obj2: &ObjectHandle<T>,
    ) -> Result<Vec<Intersection<T>>> {
        self.validate(obj1, obj2)?;
        debug!(
            "intersecting a {}-parameter and a {}-parameter object",
            obj1.parameter_count(),
            obj2.parameter_count()
        );
        let root = NodeContext {
            obj1: obj1.clone(),
            obj2: obj2.clone(),
            depth: 0,
        };
        let raw = self.solve_with_boundaries(&root)?;
        Ok(self.finalize(raw, obj1, obj2))
    }

    fn validate(&self, obj1: &ObjectHandle<T>, obj2: &ObjectHandle<T>) -> Result<()> {
        for obj in [obj1, obj2] {
            ensure!(
                obj.parameter_count() <= 2,
                "only points, curves and surfaces are supported"
            );
            ensure!(
                obj.domain()
                    .intervals()
                    .iter()
                    .all(|i| i.min().is_finite() && i.max().is_finite()),
                "parameter domains must be finite"
            );
            ensure!(
                obj.parameter_count() == 0 || !obj.domain().is_degenerate(),
                "parameter domains must not be degenerate"
            );
        }
        ensure!(
            self.tol.epsge() > T::zero(),
            "spatial tolerance must be positive"
        );
        Ok(())
    }

    /// Solve the boundary pairings first, then the pair itself. Results of a
    /// reduced-dimension child are re-embedded through the eliminated
    /// parameter record of its boundary.
    fn solve_with_boundaries(&self, ctx: &NodeContext<T>) -> Result<Vec<Intersection<T>>> {
        let mut results = Vec::new();
        for index in 0..ctx.obj1.boundary_count() {
            let boundary = ctx.obj1.boundary_at(index);
            let eliminated = EliminatedParameter {
                side: Side::First,
                index: boundary.eliminated_parameter(),
                value: boundary.eliminated_value(),
            };
            let child = NodeContext {
                obj1: boundary.handle().clone(),
                obj2: ctx.obj2.clone(),
                depth: ctx.depth,
            };
            for r in self.solve_with_boundaries(&child)? {
                results.push(r.embedded(&eliminated));
            }
        }
        for index in 0..ctx.obj2.boundary_count() {
            let boundary = ctx.obj2.boundary_at(index);
            let eliminated = EliminatedParameter {
                side: Side::Second,
                index: boundary.eliminated_parameter(),
                value: boundary.eliminated_value(),
            };
            let child = NodeContext {
                obj1: ctx.obj1.clone(),
                obj2: boundary.handle().clone(),
                depth: ctx.depth,
            };
            for r in self.solve_with_boundaries(&child)? {
                results.push(r.embedded(&eliminated));
            }
        }
        results.extend(self.solve_node(ctx)?);
        Ok(results)
    }

    /// The per-node state machine: prune, classify, resolve or subdivide.
    fn solve_node(&self, ctx: &NodeContext<T>) -> Result<Vec<Intersection<T>>> {
        trace!(
            "node depth {}: {:?} x {:?}",
            ctx.depth,
            ctx.obj1.domain(),
            ctx.obj2.domain()
        );

        match self.perform_interception(ctx) {
            Interception::Separated => return Ok(vec![]),
            Interception::Resolved(results) => return Ok(results),
            Interception::Inconclusive => {}
        }

        if self.is_linear(&ctx.obj1) && self.is_linear(&ctx.obj2) {
            if let Some(results) = linear_intersections(&ctx.obj1, &ctx.obj2, &self.tol) {
                return Ok(results);
            }
        }

        if is_simple_case(&ctx.obj1, &ctx.obj2) {
            match self.solve_simple(ctx) {
                Some(results) => return Ok(results),
                None => warn!(
                    "local solve did not converge in a monotone box at depth {}, subdividing",
                    ctx.depth
                ),
            }
        }

        if let Some(coincidence) = self.check_coincidence(ctx) {
            return Ok(vec![coincidence]);
        }

        if self.is_micro(ctx) {
            return Ok(self.micro_case(ctx));
        }

        self.subdivide(ctx)
    }

    /// Cheap necessary-condition tests before any classification work.
    fn perform_interception(&self, ctx: &NodeContext<T>) -> Interception<T> {
        if !ctx
            .obj1
            .bounding_box()
            .intersects(ctx.obj2.bounding_box(), Some(self.tol.epsge()))
        {
            return Interception::Separated;
        }
        if rotated_box_separated(&ctx.obj1, &ctx.obj2, self.tol.epsge()) {
            return Interception::Separated;
        }
        // Two views of one geometry coincide wherever their domains overlap,
        // unless the geometry crosses itself.
        if !self.selfint
            && ctx.obj1.parameter_count() > 0
            && ctx.obj1.same_geometry(&ctx.obj2)
            && !ctx.obj1.is_self_intersecting()
        {
            if let Some(overlap) = ctx.obj1.domain().overlap(ctx.obj2.domain()) {
                if !overlap.is_degenerate() {
                    return Interception::Resolved(vec![Intersection::Coincidence {
                        domain1: overlap.clone(),
                        domain2: overlap,
                    }]);
                }
            }
        }
        Interception::Inconclusive
    }

    fn is_linear(&self, obj: &ObjectHandle<T>) -> bool {
        obj.deviation_from_linear() <= self.tol.epsge()
    }

    /// In a monotone box the local solve is guaranteed to reach the unique
    /// intersection if one exists, so its verdict is final either way.
    fn solve_simple(&self, ctx: &NodeContext<T>) -> Option<Vec<Intersection<T>>> {
        let seed = [
            ctx.obj1.domain().mid_params(),
            ctx.obj2.domain().mid_params(),
        ]
        .concat();
        let refined = refine_pair_point(&ctx.obj1, &ctx.obj2, &seed, &self.tol)?;
        if refined.distance <= self.tol.epsge() {
            Some(vec![Intersection::Point(IntersectionPoint::new(
                refined.point,
                refined.params1,
                refined.params2,
            ))])
        } else {
            Some(vec![])
        }
    }

    /// Sampled coincidence test: every sample of the lower-dimensional
    /// object must lie on the other one within the spatial tolerance. The
    /// midpoint is probed first so disjoint pairs exit after one projection.
    /// On the higher-dimensional side only the parameter region the samples
    /// actually project onto is claimed, not its whole current box.
    fn check_coincidence(&self, ctx: &NodeContext<T>) -> Option<Intersection<T>> {
        let swap = ctx.obj1.parameter_count() > ctx.obj2.parameter_count();
        let (lower, upper) = if swap {
            (&ctx.obj2, &ctx.obj1)
        } else {
            (&ctx.obj1, &ctx.obj2)
        };
        if lower.parameter_count() == 0 {
            return None;
        }

        let mut samples = vec![lower.domain().mid_params()];
        samples.extend(lower.domain().sample_params());
        let mut projections = Vec::with_capacity(samples.len());
        for sample in &samples {
            let probe = ObjectHandle::new(Arc::new(PointGeometry::new(lower.point(sample))));
            let seed = upper.domain().mid_params();
            let projected = refine_pair_point(&probe, upper, &seed, &self.tol)?;
            if projected.distance > self.tol.epsge() {
                return None;
            }
            projections.push(projected.params2);
        }

        let hull = ParamDomain::from_intervals(
            (0..upper.parameter_count())
                .map(|axis| {
                    let big = <T as RealField>::max_value().unwrap();
                    let lo = projections.iter().fold(big, |a, p| RealField::min(a, p[axis]));
                    let hi = projections.iter().fold(-big, |a, p| RealField::max(a, p[axis]));
                    Interval::new(lo, hi)
                })
                .collect(),
        );
        let (domain1, domain2) = if swap {
            (hull, lower.domain().clone())
        } else {
            (lower.domain().clone(), hull)
        };
        Some(Intersection::Coincidence { domain1, domain2 })
    }

    /// A node is micro when neither domain can be meaningfully subdivided
    /// any further, or the recursion depth cutoff is reached.
    fn is_micro(&self, ctx: &NodeContext<T>) -> bool {
        if ctx.depth >= self.tol.max_depth() {
            return true;
        }
        let micro = |obj: &ObjectHandle<T>| {
            obj.domain()
                .intervals()
                .iter()
                .zip(obj.full_domain().intervals())
                .all(|(i, full)| i.length() <= self.tol.rel_par_res() * full.length())
        };
        micro(&ctx.obj1) && micro(&ctx.obj2)
    }

    fn micro_case(&self, ctx: &NodeContext<T>) -> Vec<Intersection<T>> {
        let m1 = ctx.obj1.domain().mid_params();
        let m2 = ctx.obj2.domain().mid_params();
        let seed = [m1.as_slice(), m2.as_slice()].concat();
        let candidate = refine_pair_point(&ctx.obj1, &ctx.obj2, &seed, &self.tol);
        match candidate {
            Some(refined) if refined.distance <= self.tol.epsge() => {
                vec![Intersection::Point(IntersectionPoint::new(
                    refined.point,
                    refined.params1,
                    refined.params2,
                ))]
            }
            _ => {
                let p1 = ctx.obj1.point(&m1);
                let p2 = ctx.obj2.point(&m2);
                if (p1 - p2).norm() <= self.tol.epsge() {
                    let half = T::from_f64(0.5).unwrap();
                    let mid = Point3::from((p1.coords + p2.coords) * half);
                    vec![Intersection::Point(IntersectionPoint::new(mid, m1, m2))]
                } else {
                    vec![]
                }
            }
        }
    }

    /// Halve the relatively longest parameter interval of either object and
    /// recurse on the child pairings.
    fn subdivide(&self, ctx: &NodeContext<T>) -> Result<Vec<Intersection<T>>> {
        let mut best: Option<(Side, usize, T)> = None;
        for (side, obj) in [(Side::First, &ctx.obj1), (Side::Second, &ctx.obj2)] {
            let full = obj.full_domain();
            for (axis, (i, f)) in obj
                .domain()
                .intervals()
                .iter()
                .zip(full.intervals())
                .enumerate()
            {
                let rel = if f.length() > T::default_epsilon() {
                    i.length() / f.length()
                } else {
                    T::zero()
                };
                if best.map_or(true, |(_, _, b)| rel > b) {
                    best = Some((side, axis, rel));
                }
            }
        }
        let Some((side, axis, _)) = best else {
            return Ok(vec![]);
        };

        let halves = |obj: &ObjectHandle<T>, axis: usize| {
            let mid = obj.domain().interval_at(axis).mid();
            let (a, b) = obj.subdivide(axis, mid);
            vec![a, b]
        };
        // Surface pairs split both objects at once; otherwise only the side
        // with the relatively longest interval is split.
        let both_surfaces =
            ctx.obj1.parameter_count() == 2 && ctx.obj2.parameter_count() == 2;
        let (parts1, parts2) = if both_surfaces {
            let longest = |obj: &ObjectHandle<T>| {
                let d = obj.domain();
                if d.interval_at(0).length() >= d.interval_at(1).length() {
                    0
                } else {
                    1
                }
            };
            (
                halves(&ctx.obj1, longest(&ctx.obj1)),
                halves(&ctx.obj2, longest(&ctx.obj2)),
            )
        } else {
            match side {
                Side::First => (halves(&ctx.obj1, axis), vec![ctx.obj2.clone()]),
                Side::Second => (vec![ctx.obj1.clone()], halves(&ctx.obj2, axis)),
            }
        };

        let mut results = Vec::new();
        for c1 in &parts1 {
            for c2 in &parts2 {
                let child = NodeContext {
                    obj1: c1.clone(),
                    obj2: c2.clone(),
                    depth: ctx.depth + 1,
                };
                if self.complexity_reduced(ctx, &child) {
                    results.extend(self.solve_node(&child)?);
                } else {
                    results.extend(self.micro_case(&child));
                }
            }
        }
        Ok(results)
    }

    /// Safeguard against recursion that fails to make progress: a child
    /// whose sub-domain did not shrink falls back to the micro heuristic
    /// instead of recursing. Midpoint splits always shrink, so this only
    /// triggers once an interval midpoint is no longer representable.
    fn complexity_reduced(&self, parent: &NodeContext<T>, child: &NodeContext<T>) -> bool {
        parent.obj1.domain() != child.obj1.domain() || parent.obj2.domain() != child.obj2.domain()
    }

    /// Split every axis at its midpoint and intersect the parts pairwise;
    /// recurse into parts that could still cross themselves.
    fn collect_self(&self, obj: &ObjectHandle<T>, depth: usize) -> Result<Vec<Intersection<T>>> {
        if depth >= self.tol.max_depth() || self.cannot_self_intersect(obj) {
            return Ok(vec![]);
        }
        let mut parts = vec![obj.clone()];
        for axis in 0..obj.parameter_count() {
            parts = parts
                .into_iter()
                .flat_map(|p| {
                    let mid = p.domain().interval_at(axis).mid();
                    let (a, b) = p.subdivide(axis, mid);
                    [a, b]
                })
                .collect();
        }
        let mut results = Vec::new();
        for (i, a) in parts.iter().enumerate() {
            for b in &parts[i + 1..] {
                let pairing = NodeContext {
                    obj1: a.clone(),
                    obj2: b.clone(),
                    depth,
                };
                results.extend(self.solve_with_boundaries(&pairing)?);
            }
            results.extend(self.collect_self(a, depth + 1)?);
        }
        Ok(results)
    }

    /// A part whose direction field never reverses is injective and cannot
    /// cross itself; only such reversals force further splitting.
    fn cannot_self_intersect(&self, obj: &ObjectHandle<T>) -> bool {
        let half_pi = T::frac_pi_2();
        match obj.parameter_count() {
            0 => true,
            1 => tangent_cone(obj, 0).is_some_and(|c| c.half_angle < half_pi),
            _ => normal_cone(obj).is_some_and(|c| c.half_angle < half_pi),
        }
    }

    /// Post-processing over the raw result pool: merge coincidence regions,
    /// stitch and deduplicate segments, drop covered and duplicate points,
    /// and order the survivors canonically.
    fn finalize(
        &self,
        raw: Vec<Intersection<T>>,
        obj1: &ObjectHandle<T>,
        obj2: &ObjectHandle<T>,
    ) -> Vec<Intersection<T>> {
        let snaps1 = self.par_snaps(obj1);
        let snaps2 = self.par_snaps(obj2);
        let epsge = self.tol.epsge();

        let mut points = Vec::new();
        let mut segments = Vec::new();
        let mut coincidences = Vec::new();
        for r in raw {
            match r {
                Intersection::Point(p) => points.push(p),
                Intersection::Segment { start, end } => segments.push((start, end)),
                Intersection::Coincidence { domain1, domain2 } => {
                    coincidences.push((domain1, domain2))
                }
            }
        }

        if self.selfint {
            points.retain(|p| !params_close(p.params1(), p.params2(), &snaps1));
            segments.retain(|(s, e)| {
                !(params_close(s.params1(), s.params2(), &snaps1)
                    && params_close(e.params1(), e.params2(), &snaps1))
            });
            coincidences.retain(|(d1, d2)| !domains_close(d1, d2, &snaps1));
        }

        // A region flattened to zero thickness by re-embedding describes a
        // one-dimensional contact. Replace it with its chord when the chord
        // is faithful, so it cannot absorb genuine segment results.
        let (flattened, regions): (Vec<_>, Vec<_>) = coincidences
            .into_iter()
            .partition(|(d1, d2)| d1.is_degenerate() || d2.is_degenerate());
        coincidences = regions;
        for (d1, d2) in flattened {
            match region_chord(&d1, &d2, obj1, obj2, epsge) {
                Some(ends) => segments.push(ends),
                None => coincidences.push((d1, d2)),
            }
        }

        merge_coincidences(&mut coincidences);

        segments.retain(|(s, e)| (s.point() - e.point()).norm() > epsge);
        segments.retain(|(s, e)| {
            !coincidences.iter().any(|(d1, d2)| {
                [s, e].iter().all(|p| {
                    d1.contains(p.params1(), max_snap(&snaps1))
                        && d2.contains(p.params2(), max_snap(&snaps2))
                })
            })
        });
        dedup_segments(&mut segments, epsge);
        stitch_segments(&mut segments, epsge, &snaps1, &snaps2);

        points.retain(|p| {
            !coincidences.iter().any(|(d1, d2)| {
                d1.contains(p.params1(), max_snap(&snaps1))
                    && d2.contains(p.params2(), max_snap(&snaps2))
            })
        });
        points.retain(|p| {
            !segments
                .iter()
                .any(|(s, e)| point_on_segment(p, s, e, epsge, &snaps1))
        });

        points.sort_by(|a, b| {
            compare_params(a.params1(), b.params1())
                .then_with(|| compare_params(a.params2(), b.params2()))
        });
        let at_edge = |p: &IntersectionPoint<T>| {
            near_domain_edge(p.params1(), obj1, &snaps1)
                || near_domain_edge(p.params2(), obj2, &snaps2)
        };
        let points = points
            .into_iter()
            .coalesce(|a, b| {
                let same = (a.point() - b.point()).norm() <= epsge
                    && params_close(a.params1(), b.params1(), &snaps1)
                    && params_close(a.params2(), b.params2(), &snaps2);
                if same {
                    // Keep the representative pinned to a domain edge, if any.
                    if at_edge(&b) && !at_edge(&a) {
                        Ok(b)
                    } else {
                        Ok(a)
                    }
                } else {
                    Err((a, b))
                }
            })
            .collect::<Vec<_>>();

        let mut results = Vec::new();
        results.extend(
            coincidences
                .into_iter()
                .map(|(domain1, domain2)| Intersection::Coincidence { domain1, domain2 }),
        );
        results.extend(
            segments
                .into_iter()
                .map(|(start, end)| Intersection::Segment { start, end }),
        );
        results.extend(points.into_iter().map(Intersection::Point));
        results.sort_by(Intersection::compare);
        results
    }

    /// Per-axis parameter snapping distances for deduplication, derived
    /// from the full parameter spans.
    fn par_snaps(&self, obj: &ObjectHandle<T>) -> Vec<T> {
        let snap = ComplexField::sqrt(self.tol.rel_par_res());
        obj.full_domain()
            .intervals()
            .iter()
            .map(|i| snap * i.length())
            .collect()
    }
}

fn max_snap<T: FloatingPoint>(snaps: &[T]) -> T {
    snaps
        .iter()
        .copied()
        .fold(T::default_epsilon(), |acc, s| acc.max(s))
}

fn params_close<T: FloatingPoint>(a: &[T], b: &[T], snaps: &[T]) -> bool {
    a.len() == b.len()
        && a.iter()
            .zip(b)
            .zip(snaps)
            .all(|((&x, &y), &s)| (x - y).abs() <= s)
}

fn domains_close<T: FloatingPoint>(a: &ParamDomain<T>, b: &ParamDomain<T>, snaps: &[T]) -> bool {
    a.parameter_count() == b.parameter_count()
        && a.intervals()
            .iter()
            .zip(b.intervals())
            .zip(snaps)
            .all(|((x, y), &s)| (x.min() - y.min()).abs() <= s && (x.max() - y.max()).abs() <= s)
}

fn near_domain_edge<T: FloatingPoint>(params: &[T], obj: &ObjectHandle<T>, snaps: &[T]) -> bool {
    params
        .iter()
        .zip(obj.full_domain().intervals())
        .zip(snaps)
        .any(|((&t, i), &s)| (t - i.min()).abs() <= s || (t - i.max()).abs() <= s)
}

/// Union overlapping coincidence regions until a fixed point is reached.
fn merge_coincidences<T: FloatingPoint>(regions: &mut Vec<(ParamDomain<T>, ParamDomain<T>)>) {
    let mut changed = true;
    while changed {
        changed = false;
        'outer: for i in 0..regions.len() {
            for j in (i + 1)..regions.len() {
                let touches = regions[i].0.overlap(&regions[j].0).is_some()
                    && regions[i].1.overlap(&regions[j].1).is_some();
                if touches {
                    let (d1, d2) = regions.swap_remove(j);
                    regions[i].0 = regions[i].0.union(&d1);
                    regions[i].1 = regions[i].1.union(&d2);
                    changed = true;
                    break 'outer;
                }
            }
        }
    }
}

type SegmentEnds<T> = (IntersectionPoint<T>, IntersectionPoint<T>);

/// Remove segments whose end points duplicate an earlier segment, in either
/// orientation.
fn dedup_segments<T: FloatingPoint>(segments: &mut Vec<SegmentEnds<T>>, epsge: T) {
    let mut kept: Vec<SegmentEnds<T>> = Vec::with_capacity(segments.len());
    for (start, end) in segments.drain(..) {
        let duplicate = kept.iter().any(|(ks, ke)| {
            let forward = (start.point() - ks.point()).norm() <= epsge
                && (end.point() - ke.point()).norm() <= epsge;
            let reverse = (start.point() - ke.point()).norm() <= epsge
                && (end.point() - ks.point()).norm() <= epsge;
            forward || reverse
        });
        if !duplicate {
            kept.push((start, end));
        }
    }
    *segments = kept;
}

/// Join chains of adjacent segments into single pieces. Two segments merge
/// when they share an end and the dropped joint stays within `epsge` of the
/// merged chord, so a chain never strays further from the traced curve than
/// the geometric tolerance.
fn stitch_segments<T: FloatingPoint>(
    segments: &mut Vec<SegmentEnds<T>>,
    epsge: T,
    snaps1: &[T],
    snaps2: &[T],
) {
    let joined = |tail: &IntersectionPoint<T>, head: &IntersectionPoint<T>| {
        (tail.point() - head.point()).norm() <= epsge
            && params_close(tail.params1(), head.params1(), snaps1)
            && params_close(tail.params2(), head.params2(), snaps2)
    };
    let chord_holds = |start: &IntersectionPoint<T>,
                       joint: &IntersectionPoint<T>,
                       end: &IntersectionPoint<T>| {
        let chord = Segment::new(*start.point(), *end.point());
        let (_, closest) = chord.closest_point(joint.point());
        (joint.point() - closest).norm() <= epsge
    };

    let mut changed = true;
    while changed {
        changed = false;
        'outer: for i in 0..segments.len() {
            for j in 0..segments.len() {
                if i == j {
                    continue;
                }
                if joined(&segments[i].1, &segments[j].0)
                    && chord_holds(&segments[i].0, &segments[i].1, &segments[j].1)
                {
                    let (_, end) = segments.swap_remove(j);
                    let i = if j < i { i - 1 } else { i };
                    segments[i].1 = end;
                    changed = true;
                    break 'outer;
                }
                if joined(&segments[j].1, &segments[i].0)
                    && chord_holds(&segments[j].0, &segments[j].1, &segments[i].1)
                {
                    let (start, _) = segments.swap_remove(j);
                    let i = if j < i { i - 1 } else { i };
                    segments[i].0 = start;
                    changed = true;
                    break 'outer;
                }
            }
        }
    }
}

/// Turn a zero-thickness coincidence region into a segment between its
/// parameter extremes, provided both sides actually follow that chord.
fn region_chord<T: FloatingPoint>(
    d1: &ParamDomain<T>,
    d2: &ParamDomain<T>,
    obj1: &ObjectHandle<T>,
    obj2: &ObjectHandle<T>,
    epsge: T,
) -> Option<SegmentEnds<T>> {
    let half = T::from_f64(0.5).unwrap();
    let lo = |d: &ParamDomain<T>| d.intervals().iter().map(|i| i.min()).collect::<Vec<_>>();
    let hi = |d: &ParamDomain<T>| d.intervals().iter().map(|i| i.max()).collect::<Vec<_>>();
    let (s1, e1) = (lo(d1), hi(d1));
    let (mut s2, mut e2) = (lo(d2), hi(d2));
    let p1s = obj1.point(&s1);
    let p1e = obj1.point(&e1);
    // The second side may run against the first side's parameter direction.
    if (p1s - obj2.point(&s2)).norm() > (p1s - obj2.point(&e2)).norm() {
        std::mem::swap(&mut s2, &mut e2);
    }
    let p2s = obj2.point(&s2);
    let p2e = obj2.point(&e2);
    if (p1s - p2s).norm() > epsge || (p1e - p2e).norm() > epsge {
        return None;
    }
    let m1 = obj1.point(&d1.mid_params());
    let m2 = obj2.point(&d2.mid_params());
    let chord = Segment::new(p1s, p1e);
    let on_chord = |p: &Point3<T>| {
        let (_, closest) = chord.closest_point(p);
        (p - closest).norm() <= epsge
    };
    if !on_chord(&m1) || !on_chord(&m2) {
        return None;
    }
    let mid = |a: Point3<T>, b: Point3<T>| Point3::from((a.coords + b.coords) * half);
    Some((
        IntersectionPoint::new(mid(p1s, p2s), s1, s2),
        IntersectionPoint::new(mid(p1e, p2e), e1, e2),
    ))
}

/// A point is absorbed by a segment when it lies on it spatially and its
/// parameters fall inside the segment's parameter range.
fn point_on_segment<T: FloatingPoint>(
    p: &IntersectionPoint<T>,
    start: &IntersectionPoint<T>,
    end: &IntersectionPoint<T>,
    epsge: T,
    snaps1: &[T],
) -> bool {
    let chord = Segment::new(*start.point(), *end.point());
    let (_, closest) = chord.closest_point(p.point());
    if (p.point() - closest).norm() > epsge {
        return false;
    }
    p.params1()
        .iter()
        .zip(start.params1().iter().zip(end.params1()))
        .zip(snaps1)
        .all(|((&t, (&a, &b)), &s)| {
            let lo = a.min(b) - s;
            let hi = a.max(b) + s;
            lo <= t && t <= hi
        })
}
