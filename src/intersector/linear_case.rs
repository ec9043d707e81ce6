use argmin::core::ArgminFloat;
use nalgebra::{ComplexField, Point3, Vector3};

use crate::{
    domain::{Interval, ParamDomain},
    handle::ObjectHandle,
    intersector::{
        newton::{refine_pair_point, RefinedPoint},
        results::{Intersection, IntersectionPoint},
    },
    misc::{FloatingPoint, Plane, Segment},
    tolerance::GeoTolerance,
};

/// Closed-form intersection of a pair whose deviation from linearity is
/// within the spatial tolerance over the current sub-domains.
///
/// Returns `None` when the pair is too degenerate to classify here, e.g. a
/// surface patch whose corner frame collapses; the caller falls back to
/// subdivision. `Some(vec![])` is a definite empty answer.
pub(crate) fn linear_intersections<T: FloatingPoint + ArgminFloat>(
    obj1: &ObjectHandle<T>,
    obj2: &ObjectHandle<T>,
    tol: &GeoTolerance<T>,
) -> Option<Vec<Intersection<T>>> {
    if obj1.parameter_count() <= obj2.parameter_count() {
        solve_ordered(obj1, obj2, tol)
    } else {
        solve_ordered(obj2, obj1, tol)
            .map(|results| results.into_iter().map(Intersection::swapped).collect())
    }
}

/// Dispatch with `obj1.parameter_count() <= obj2.parameter_count()`.
fn solve_ordered<T: FloatingPoint + ArgminFloat>(
    obj1: &ObjectHandle<T>,
    obj2: &ObjectHandle<T>,
    tol: &GeoTolerance<T>,
) -> Option<Vec<Intersection<T>>> {
    match (obj1.parameter_count(), obj2.parameter_count()) {
        (0, 0) => Some(point_point(obj1, obj2, tol)),
        (0, 1) => Some(point_line(obj1, obj2, tol)),
        (0, 2) => point_plane(obj1, obj2, tol),
        (1, 1) => Some(line_line(obj1, obj2, tol)),
        (1, 2) => line_plane(obj1, obj2, tol),
        (2, 2) => plane_plane(obj1, obj2, tol),
        _ => unreachable!("parameter counts beyond surfaces are not supported"),
    }
}

fn point_point<T: FloatingPoint>(
    obj1: &ObjectHandle<T>,
    obj2: &ObjectHandle<T>,
    tol: &GeoTolerance<T>,
) -> Vec<Intersection<T>> {
    let p1 = obj1.point(&[]);
    let p2 = obj2.point(&[]);
    if (p1 - p2).norm() <= tol.epsge() {
        let mid = Point3::from((p1.coords + p2.coords) * T::from_f64(0.5).unwrap());
        vec![Intersection::Point(IntersectionPoint::new(
            mid,
            vec![],
            vec![],
        ))]
    } else {
        vec![]
    }
}

fn point_line<T: FloatingPoint + ArgminFloat>(
    obj1: &ObjectHandle<T>,
    obj2: &ObjectHandle<T>,
    tol: &GeoTolerance<T>,
) -> Vec<Intersection<T>> {
    let p = obj1.point(&[]);
    let (seg, interval) = segment_proxy(obj2);
    let (t, _) = seg.closest_point(&p);
    polished_point(obj1, obj2, &[interval.lerp(t)], tol)
        .into_iter()
        .collect()
}

fn point_plane<T: FloatingPoint + ArgminFloat>(
    obj1: &ObjectHandle<T>,
    obj2: &ObjectHandle<T>,
    tol: &GeoTolerance<T>,
) -> Option<Vec<Intersection<T>>> {
    let p = obj1.point(&[]);
    let patch = PatchProxy::new(obj2)?;
    let seed = match patch.invert(&p) {
        Some((x, y)) => patch.params(clamp_unit(x), clamp_unit(y)),
        None => return Some(vec![]),
    };
    Some(polished_point(obj1, obj2, &seed, tol).into_iter().collect())
}

fn line_line<T: FloatingPoint + ArgminFloat>(
    obj1: &ObjectHandle<T>,
    obj2: &ObjectHandle<T>,
    tol: &GeoTolerance<T>,
) -> Vec<Intersection<T>> {
    let (s1, i1) = segment_proxy(obj1);
    let (s2, i2) = segment_proxy(obj2);

    // Overlapping collinear segments yield a coincidence interval instead of
    // a point. The test is against the infinite carrier line of the first
    // segment; the overlap may extend past either segment end.
    let len1 = s1.length();
    if len1 > T::default_epsilon() {
        let u = s1.direction() / len1;
        let line_distance = |p: &Point3<T>| {
            let v = p - s1.a;
            (v - u * v.dot(&u)).norm()
        };
        if line_distance(&s2.a) <= tol.epsge() && line_distance(&s2.b) <= tol.epsge() {
            let ta = (s2.a - s1.a).dot(&u) / len1;
            let tb = (s2.b - s1.a).dot(&u) / len1;
            let on1 = Interval::new(ta, tb).overlap(&Interval::new(T::zero(), T::one()));
            if let Some(on1) = on1 {
                if on1.length() * len1 > tol.epsge() {
                    let (ra, _) = s2.closest_point(&s1.point_at(on1.min()));
                    let (rb, _) = s2.closest_point(&s1.point_at(on1.max()));
                    return vec![Intersection::Coincidence {
                        domain1: ParamDomain::curve(Interval::new(
                            i1.lerp(on1.min()),
                            i1.lerp(on1.max()),
                        )),
                        domain2: ParamDomain::curve(Interval::new(i2.lerp(ra), i2.lerp(rb))),
                    }];
                }
            }
        }
    }

    let (s, t) = s1.closest_parameters(&s2);
    polished_point(obj1, obj2, &[i1.lerp(s), i2.lerp(t)], tol)
        .into_iter()
        .collect()
}

fn line_plane<T: FloatingPoint + ArgminFloat>(
    obj1: &ObjectHandle<T>,
    obj2: &ObjectHandle<T>,
    tol: &GeoTolerance<T>,
) -> Option<Vec<Intersection<T>>> {
    let (seg, interval) = segment_proxy(obj1);
    let patch = PatchProxy::new(obj2)?;
    let pad = tol.rel_par_res();

    if seg.length() <= tol.epsge() {
        // Degenerate chord, handle it as a point probe.
        let (x, y) = patch.invert(&seg.a)?;
        let mut seed = vec![interval.mid()];
        seed.extend(patch.params(clamp_unit(x), clamp_unit(y)));
        return Some(polished_point(obj1, obj2, &seed, tol).into_iter().collect());
    }

    let da = patch.plane.signed_distance(&seg.a);
    let db = patch.plane.signed_distance(&seg.b);
    if ComplexField::abs(da) <= tol.epsge() && ComplexField::abs(db) <= tol.epsge() {
        // The segment lies in the plane: clip it against the patch region.
        let (xa, ya) = patch.invert(&seg.a)?;
        let (xb, yb) = patch.invert(&seg.b)?;
        let range = clip_unit_box((xa, ya), (xb - xa, yb - ya), pad)
            .and_then(|r| r.overlap(&Interval::new(T::zero(), T::one())));
        let Some(range) = range else {
            return Some(vec![]);
        };
        let at = |t: T| {
            let x = clamp_unit(xa + (xb - xa) * t);
            let y = clamp_unit(ya + (yb - ya) * t);
            IntersectionPoint::new(seg.point_at(t), vec![interval.lerp(t)], patch.params(x, y))
        };
        if range.length() * seg.length() > tol.epsge() {
            return Some(vec![Intersection::Segment {
                start: at(range.min()),
                end: at(range.max()),
            }]);
        }
        let mid = at(range.mid());
        let seed = [mid.params1(), mid.params2()].concat();
        return Some(polished_point(obj1, obj2, &seed, tol).into_iter().collect());
    }

    match seg.plane_parameter(&patch.plane) {
        Some(t) if Interval::new(T::zero(), T::one()).contains(t, pad) => {
            let p = seg.point_at(t);
            let Some((x, y)) = patch.invert(&p) else {
                return Some(vec![]);
            };
            let unit = Interval::new(T::zero(), T::one());
            if !unit.contains(x, pad) || !unit.contains(y, pad) {
                return Some(vec![]);
            }
            let mut seed = vec![interval.lerp(unit.clamp(t))];
            seed.extend(patch.params(clamp_unit(x), clamp_unit(y)));
            Some(polished_point(obj1, obj2, &seed, tol).into_iter().collect())
        }
        _ => Some(vec![]),
    }
}

fn plane_plane<T: FloatingPoint + ArgminFloat>(
    obj1: &ObjectHandle<T>,
    obj2: &ObjectHandle<T>,
    tol: &GeoTolerance<T>,
) -> Option<Vec<Intersection<T>>> {
    let p1 = PatchProxy::new(obj1)?;
    let p2 = PatchProxy::new(obj2)?;
    let pad = tol.rel_par_res();

    let coplanar = obj2
        .domain()
        .corner_params()
        .iter()
        .all(|c| ComplexField::abs(p1.plane.signed_distance(&obj2.point(c))) <= tol.epsge())
        && obj1
            .domain()
            .corner_params()
            .iter()
            .all(|c| ComplexField::abs(p2.plane.signed_distance(&obj1.point(c))) <= tol.epsge());
    if coplanar {
        return Some(coplanar_patches(obj1, obj2, &p1, &p2, tol));
    }

    let Some((anchor, dir)) = p1.plane.intersection_line(&p2.plane) else {
        // Parallel and offset beyond tolerance.
        return Some(vec![]);
    };

    let range1 = clip_on_patch(&p1, &anchor, &dir, pad)?;
    let range2 = clip_on_patch(&p2, &anchor, &dir, pad)?;
    let Some(range) = range1.and_then(|a| range2.and_then(|b| a.overlap(&b))) else {
        return Some(vec![]);
    };

    let at = |t: T| -> Option<IntersectionPoint<T>> {
        let p = anchor + dir * t;
        let (x1, y1) = p1.invert(&p)?;
        let (x2, y2) = p2.invert(&p)?;
        Some(IntersectionPoint::new(
            p,
            p1.params(clamp_unit(x1), clamp_unit(y1)),
            p2.params(clamp_unit(x2), clamp_unit(y2)),
        ))
    };
    if range.length() * dir.norm() > tol.epsge() {
        let start = at(range.min())?;
        let end = at(range.max())?;
        Some(vec![Intersection::Segment { start, end }])
    } else {
        let mid = at(range.mid())?;
        let seed = [mid.params1(), mid.params2()].concat();
        Some(polished_point(obj1, obj2, &seed, tol).into_iter().collect())
    }
}

/// Overlap of two coplanar patches: a coincidence region, or a segment when
/// the overlap collapses along one axis.
fn coplanar_patches<T: FloatingPoint + ArgminFloat>(
    obj1: &ObjectHandle<T>,
    obj2: &ObjectHandle<T>,
    p1: &PatchProxy<T>,
    p2: &PatchProxy<T>,
    tol: &GeoTolerance<T>,
) -> Vec<Intersection<T>> {
    let region_on = |patch: &PatchProxy<T>, other: &ObjectHandle<T>| -> Option<(Interval<T>, Interval<T>)> {
        let mut x = Interval::new(T::one(), T::one());
        let mut y = Interval::new(T::one(), T::one());
        let mut first = true;
        for corner in other.domain().corner_params() {
            let (cx, cy) = patch.invert(&other.point(&corner))?;
            if first {
                x = Interval::new(cx, cx);
                y = Interval::new(cy, cy);
                first = false;
            } else {
                x = x.union(&Interval::new(cx, cx));
                y = y.union(&Interval::new(cy, cy));
            }
        }
        let unit = Interval::new(T::zero(), T::one());
        Some((x.overlap(&unit)?, y.overlap(&unit)?))
    };

    let Some((x1, y1)) = region_on(p1, obj2) else {
        return vec![];
    };
    let Some((x2, y2)) = region_on(p2, obj1) else {
        return vec![];
    };

    let region1 = ParamDomain::surface(
        Interval::new(p1.u.lerp(x1.min()), p1.u.lerp(x1.max())),
        Interval::new(p1.v.lerp(y1.min()), p1.v.lerp(y1.max())),
    );
    let region2 = ParamDomain::surface(
        Interval::new(p2.u.lerp(x2.min()), p2.u.lerp(x2.max())),
        Interval::new(p2.v.lerp(y2.min()), p2.v.lerp(y2.max())),
    );

    let res = tol.rel_par_res();
    let thin1 = x1.length() <= res || y1.length() <= res;
    if thin1 {
        // Edge contact: the region collapses to a parameter line on the
        // first patch.
        let mk = |x: T, y: T| -> Option<IntersectionPoint<T>> {
            let p = Point3::from(p1.origin.coords + p1.e1 * x + p1.e2 * y);
            let (x2c, y2c) = p2.invert(&p)?;
            Some(IntersectionPoint::new(
                p,
                p1.params(x, y),
                p2.params(clamp_unit(x2c), clamp_unit(y2c)),
            ))
        };
        let (Some(start), Some(end)) = (mk(x1.min(), y1.min()), mk(x1.max(), y1.max())) else {
            return vec![];
        };
        if (start.point() - end.point()).norm() <= tol.epsge() {
            let seed = [start.params1(), start.params2()].concat();
            return polished_point(obj1, obj2, &seed, tol).into_iter().collect();
        }
        return vec![Intersection::Segment { start, end }];
    }

    vec![Intersection::Coincidence {
        domain1: region1,
        domain2: region2,
    }]
}

/// Clip a 3D line against a patch region; the interval is in units of the
/// line parameter. `None` when the line leaves the patch plane frame,
/// `Some(None)` when it misses the region.
#[allow(clippy::type_complexity)]
fn clip_on_patch<T: FloatingPoint>(
    patch: &PatchProxy<T>,
    anchor: &Point3<T>,
    dir: &Vector3<T>,
    pad: T,
) -> Option<Option<Interval<T>>> {
    let o = patch.invert(anchor)?;
    let d = patch.invert_direction(dir)?;
    Some(clip_unit_box(o, d, pad))
}

/// Liang-Barsky clip of the parametric line `o + t * d` against the padded
/// unit box; `t` is unrestricted.
fn clip_unit_box<T: FloatingPoint>(o: (T, T), d: (T, T), pad: T) -> Option<Interval<T>> {
    let big = T::max_value().unwrap();
    let mut t0 = -big;
    let mut t1 = big;
    let lo = -pad;
    let hi = T::one() + pad;
    for (oi, di) in [(o.0, d.0), (o.1, d.1)] {
        if di.abs() <= T::default_epsilon() {
            if oi < lo || oi > hi {
                return None;
            }
            continue;
        }
        let ta = (lo - oi) / di;
        let tb = (hi - oi) / di;
        let (ta, tb) = if ta <= tb { (ta, tb) } else { (tb, ta) };
        t0 = t0.max(ta);
        t1 = t1.min(tb);
    }
    (t0 <= t1).then(|| Interval::new(t0, t1))
}

fn clamp_unit<T: FloatingPoint>(t: T) -> T {
    t.clamp(T::zero(), T::one())
}

/// Seed the local solve from the closed-form estimate and accept the result
/// only within the spatial tolerance. A refinement that fails or strays,
/// as on the singular system of an exact tangential contact, falls back to
/// the seed itself.
fn polished_point<T: FloatingPoint + ArgminFloat>(
    obj1: &ObjectHandle<T>,
    obj2: &ObjectHandle<T>,
    seed: &[T],
    tol: &GeoTolerance<T>,
) -> Option<Intersection<T>> {
    let seeded = seed_candidate(obj1, obj2, seed);
    let refined = match refine_pair_point(obj1, obj2, seed, tol) {
        Some(r) if r.distance < seeded.distance => r,
        _ => seeded,
    };
    (refined.distance <= tol.epsge()).then(|| {
        Intersection::Point(IntersectionPoint::new(
            refined.point,
            refined.params1,
            refined.params2,
        ))
    })
}

/// The closed-form estimate evaluated directly, without refinement.
fn seed_candidate<T: FloatingPoint>(
    obj1: &ObjectHandle<T>,
    obj2: &ObjectHandle<T>,
    seed: &[T],
) -> RefinedPoint<T> {
    let (pa, pb) = seed.split_at(obj1.parameter_count());
    let p1 = obj1.point(pa);
    let p2 = obj2.point(pb);
    RefinedPoint {
        params1: pa.to_vec(),
        params2: pb.to_vec(),
        point: Point3::from((p1.coords + p2.coords) * T::from_f64(0.5).unwrap()),
        distance: (p1 - p2).norm(),
    }
}

/// Chord of a curve over its current sub-domain, with the interval it spans.
fn segment_proxy<T: FloatingPoint>(obj: &ObjectHandle<T>) -> (Segment<T>, Interval<T>) {
    let interval = *obj.domain().interval_at(0);
    let seg = Segment::new(obj.point(&[interval.min()]), obj.point(&[interval.max()]));
    (seg, interval)
}

/// Corner frame of a surface patch over its current sub-domain.
struct PatchProxy<T: FloatingPoint> {
    origin: Point3<T>,
    e1: Vector3<T>,
    e2: Vector3<T>,
    plane: Plane<T>,
    u: Interval<T>,
    v: Interval<T>,
}

impl<T: FloatingPoint> PatchProxy<T> {
    fn new(obj: &ObjectHandle<T>) -> Option<Self> {
        let u = *obj.domain().interval_at(0);
        let v = *obj.domain().interval_at(1);
        let origin = obj.point(&[u.min(), v.min()]);
        let e1 = obj.point(&[u.max(), v.min()]) - origin;
        let e2 = obj.point(&[u.min(), v.max()]) - origin;
        let plane = Plane::from_spanning_vectors(&origin, &e1, &e2)?;
        Some(Self {
            origin,
            e1,
            e2,
            plane,
            u,
            v,
        })
    }

    /// Normalized frame coordinates of a point, via the normal equations of
    /// the two edge vectors.
    fn invert(&self, p: &Point3<T>) -> Option<(T, T)> {
        self.solve_frame(&(p - self.origin))
    }

    fn invert_direction(&self, d: &Vector3<T>) -> Option<(T, T)> {
        self.solve_frame(d)
    }

    fn solve_frame(&self, rhs: &Vector3<T>) -> Option<(T, T)> {
        let a = self.e1.norm_squared();
        let b = self.e1.dot(&self.e2);
        let c = self.e2.norm_squared();
        let det = a * c - b * b;
        if det <= T::default_epsilon() * a * c {
            return None;
        }
        let r1 = self.e1.dot(rhs);
        let r2 = self.e2.dot(rhs);
        Some(((c * r1 - b * r2) / det, (a * r2 - b * r1) / det))
    }

    /// Map normalized frame coordinates back into patch parameters.
    fn params(&self, x: T, y: T) -> Vec<T> {
        vec![self.u.lerp(x), self.v.lerp(y)]
    }
}
