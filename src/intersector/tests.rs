use std::sync::Arc;

use approx::assert_relative_eq;
use nalgebra::Point3;

use crate::{
    geometry::{BezierCurve, BezierSurface, ParametricGeometry, PointGeometry},
    handle::ObjectHandle,
    intersector::{intersect, intersect_with_epsge, self_intersections, Intersection},
    tolerance::GeoTolerance,
};

const TOL: f64 = 1e-7;

fn handle<G: ParametricGeometry<f64> + 'static>(geometry: G) -> ObjectHandle<f64> {
    ObjectHandle::new(Arc::new(geometry))
}

fn quadratic_arch() -> ObjectHandle<f64> {
    handle(
        BezierCurve::try_new(vec![
            Point3::new(-1., 0., 0.),
            Point3::new(0., 1., 0.),
            Point3::new(1., 0., 0.),
        ])
        .unwrap(),
    )
}

fn line(a: Point3<f64>, b: Point3<f64>) -> ObjectHandle<f64> {
    handle(BezierCurve::try_new(vec![a, b]).unwrap())
}

/// A unit planar patch spanning `[x0, x0 + 1] x [y0, y0 + 1]` at z = 0.
fn planar_patch(x0: f64, y0: f64) -> ObjectHandle<f64> {
    handle(
        BezierSurface::try_new(vec![
            vec![Point3::new(x0, y0, 0.), Point3::new(x0, y0 + 1., 0.)],
            vec![Point3::new(x0 + 1., y0, 0.), Point3::new(x0 + 1., y0 + 1., 0.)],
        ])
        .unwrap(),
    )
}

/// The arch profile swept along y: S(u, v) = (2u - 1, v, 2u(1 - u)).
fn arch_sweep() -> ObjectHandle<f64> {
    handle(
        BezierSurface::try_new(vec![
            vec![Point3::new(-1., 0., 0.), Point3::new(-1., 1., 0.)],
            vec![Point3::new(0., 0., 1.), Point3::new(0., 1., 1.)],
            vec![Point3::new(1., 0., 0.), Point3::new(1., 1., 0.)],
        ])
        .unwrap(),
    )
}

#[test]
fn arch_crosses_line_twice() {
    let arch = quadratic_arch();
    let chord = line(Point3::new(-2., 0.375, 0.), Point3::new(2., 0.375, 0.));

    let results = intersect(&arch, &chord, &GeoTolerance::new(TOL)).unwrap();
    assert_eq!(results.len(), 2);

    let Intersection::Point(first) = &results[0] else {
        panic!("expected a point");
    };
    assert_relative_eq!(first.params1()[0], 0.25, epsilon = 1e-6);
    assert_relative_eq!(first.params2()[0], 0.375, epsilon = 1e-6);
    assert_relative_eq!(first.point().x, -0.5, epsilon = 1e-6);
    assert_relative_eq!(first.point().y, 0.375, epsilon = 1e-6);

    let Intersection::Point(second) = &results[1] else {
        panic!("expected a point");
    };
    assert_relative_eq!(second.params1()[0], 0.75, epsilon = 1e-6);
    assert_relative_eq!(second.params2()[0], 0.625, epsilon = 1e-6);
}

#[test]
fn tangent_line_touches_arch_apex() {
    let arch = quadratic_arch();
    let grazing = line(Point3::new(-2., 0.5, 0.), Point3::new(2., 0.5, 0.));

    let results = intersect(&arch, &grazing, &GeoTolerance::new(TOL)).unwrap();
    assert_eq!(results.len(), 1);

    let Intersection::Point(p) = &results[0] else {
        panic!("expected a point");
    };
    assert_relative_eq!(p.point().x, 0., epsilon = 1e-6);
    assert_relative_eq!(p.point().y, 0.5, epsilon = 1e-6);
    assert_relative_eq!(p.params1()[0], 0.5, epsilon = 1e-4);
    assert_relative_eq!(p.params2()[0], 0.5, epsilon = 1e-4);
}

#[test]
fn line_pierces_patch() {
    let needle = line(Point3::new(0.4, 0.7, -0.3), Point3::new(0.4, 0.7, 0.7));
    let patch = planar_patch(0., 0.);

    let results = intersect(&needle, &patch, &GeoTolerance::new(TOL)).unwrap();
    assert_eq!(results.len(), 1);

    let Intersection::Point(p) = &results[0] else {
        panic!("expected a point");
    };
    assert_relative_eq!(p.params1()[0], 0.3, epsilon = 1e-9);
    assert_relative_eq!(p.params2()[0], 0.4, epsilon = 1e-9);
    assert_relative_eq!(p.params2()[1], 0.7, epsilon = 1e-9);
    assert_relative_eq!(p.point().z, 0., epsilon = 1e-9);
}

#[test]
fn repeated_solves_are_identical() {
    let arch = quadratic_arch();
    let chord = line(Point3::new(-2., 0.375, 0.), Point3::new(2., 0.375, 0.));
    let tol = GeoTolerance::new(TOL);

    let first = intersect(&arch, &chord, &tol).unwrap();
    let second = intersect(&arch, &chord, &tol).unwrap();
    assert_eq!(first, second);
}

#[test]
fn point_lands_on_curve() {
    let probe = handle(PointGeometry::new(Point3::new(-0.5, 0.375, 0.)));
    let arch = quadratic_arch();

    let results = intersect(&probe, &arch, &GeoTolerance::new(TOL)).unwrap();
    assert_eq!(results.len(), 1);

    let Intersection::Point(p) = &results[0] else {
        panic!("expected a point");
    };
    assert!(p.params1().is_empty());
    assert_relative_eq!(p.params2()[0], 0.25, epsilon = 1e-6);
}

#[test]
fn point_misses_curve() {
    let probe = handle(PointGeometry::new(Point3::new(-0.5, 0.5, 0.)));
    let arch = quadratic_arch();

    let results = intersect(&probe, &arch, &GeoTolerance::new(TOL)).unwrap();
    assert!(results.is_empty());
}

#[test]
fn overlapping_collinear_lines_coincide() {
    let a = line(Point3::new(0., 0., 0.), Point3::new(2., 0., 0.));
    let b = line(Point3::new(1., 0., 0.), Point3::new(3., 0., 0.));

    let results = intersect(&a, &b, &GeoTolerance::new(TOL)).unwrap();
    assert_eq!(results.len(), 1);

    let Intersection::Coincidence { domain1, domain2 } = &results[0] else {
        panic!("expected a coincidence");
    };
    assert_relative_eq!(domain1.interval_at(0).min(), 0.5, epsilon = 1e-6);
    assert_relative_eq!(domain1.interval_at(0).max(), 1., epsilon = 1e-6);
    assert_relative_eq!(domain2.interval_at(0).min(), 0., epsilon = 1e-6);
    assert_relative_eq!(domain2.interval_at(0).max(), 0.5, epsilon = 1e-6);
}

#[test]
fn offset_coplanar_patches_coincide_over_quarter() {
    let base = planar_patch(0., 0.);
    let shifted = planar_patch(0.5, 0.5);

    let results = intersect(&base, &shifted, &GeoTolerance::new(TOL)).unwrap();
    assert_eq!(results.len(), 1);

    let Intersection::Coincidence { domain1, domain2 } = &results[0] else {
        panic!("expected a coincidence");
    };
    for axis in 0..2 {
        assert_relative_eq!(domain1.interval_at(axis).min(), 0.5, epsilon = 1e-6);
        assert_relative_eq!(domain1.interval_at(axis).max(), 1., epsilon = 1e-6);
        assert_relative_eq!(domain2.interval_at(axis).min(), 0., epsilon = 1e-6);
        assert_relative_eq!(domain2.interval_at(axis).max(), 0.5, epsilon = 1e-6);
    }
}

#[test]
fn transversal_patches_meet_along_shared_edge() {
    let floor = planar_patch(0., 0.);
    // A patch leaning out of the floor plane along the y = 1 edge.
    let wall = handle(
        BezierSurface::try_new(vec![
            vec![Point3::new(0., 1., 0.), Point3::new(0., 2., 1.)],
            vec![Point3::new(1., 1., 0.), Point3::new(1., 2., 1.)],
        ])
        .unwrap(),
    );

    let results = intersect(&floor, &wall, &GeoTolerance::new(TOL)).unwrap();
    assert_eq!(results.len(), 1);

    let Intersection::Segment { start, end } = &results[0] else {
        panic!("expected a segment");
    };
    assert_relative_eq!(start.point().y, 1., epsilon = 1e-6);
    assert_relative_eq!(end.point().y, 1., epsilon = 1e-6);
    assert_relative_eq!(start.point().z, 0., epsilon = 1e-6);
    assert_relative_eq!((end.point().x - start.point().x).abs(), 1., epsilon = 1e-6);
    assert_relative_eq!(start.params1()[1], 1., epsilon = 1e-6);
    assert_relative_eq!(start.params2()[1], 0., epsilon = 1e-6);
}

#[test]
fn swept_arch_cut_by_tilted_plane_chains_the_crossing_curves() {
    let dome = arch_sweep();
    let slab = handle(
        BezierSurface::try_new(vec![
            vec![Point3::new(-2., 0., 0.375), Point3::new(-2., 1., 0.425)],
            vec![Point3::new(2., 0., 0.375), Point3::new(2., 1., 0.425)],
        ])
        .unwrap(),
    );

    let results = intersect(&dome, &slab, &GeoTolerance::new(1e-4)).unwrap();
    assert!(!results.is_empty());
    // Each of the two crossing curves should resolve to a handful of
    // chained pieces, not a cloud of leaf-sized fragments.
    assert!(results.len() <= 20, "got {} pieces", results.len());

    for r in &results {
        let Intersection::Segment { start, end } = r else {
            panic!("expected segments");
        };
        for p in [start, end] {
            let (u, v) = (p.params1()[0], p.params1()[1]);
            assert_relative_eq!(p.point().x, 2. * u - 1., epsilon = 1e-3);
            assert_relative_eq!(p.point().z, 2. * u * (1. - u), epsilon = 1e-3);
            assert_relative_eq!(p.point().z, 0.375 + 0.05 * v, epsilon = 1e-3);
        }
    }
}

#[test]
fn arch_profile_lies_on_its_sweep() {
    let profile = handle(
        BezierCurve::try_new(vec![
            Point3::new(-1., 0.5, 0.),
            Point3::new(0., 0.5, 1.),
            Point3::new(1., 0.5, 0.),
        ])
        .unwrap(),
    );
    let dome = arch_sweep();

    let results = intersect(&profile, &dome, &GeoTolerance::new(TOL)).unwrap();
    assert_eq!(results.len(), 1);

    let Intersection::Coincidence { domain1, domain2 } = &results[0] else {
        panic!("expected a coincidence");
    };
    assert_relative_eq!(domain1.interval_at(0).min(), 0., epsilon = 1e-6);
    assert_relative_eq!(domain1.interval_at(0).max(), 1., epsilon = 1e-6);
    // The contact runs along the u axis of the sweep at fixed v.
    assert_relative_eq!(domain2.interval_at(0).min(), 0., epsilon = 1e-6);
    assert_relative_eq!(domain2.interval_at(0).max(), 1., epsilon = 1e-6);
    assert_relative_eq!(domain2.interval_at(1).min(), 0.5, epsilon = 1e-6);
    assert_relative_eq!(domain2.interval_at(1).max(), 0.5, epsilon = 1e-6);
}

#[test]
fn disjoint_objects_yield_nothing() {
    let a = line(Point3::new(0., 0., 0.), Point3::new(1., 0., 0.));
    let b = line(Point3::new(0., 0., 5.), Point3::new(1., 0., 5.));

    let results = intersect(&a, &b, &GeoTolerance::new(TOL)).unwrap();
    assert!(results.is_empty());
}

#[test]
fn self_crossing_cubic_finds_its_loop() {
    // The loop closes at t = 1/2 -+ sqrt(3)/4, both branches through
    // (0, 9/16, 0).
    let cubic = handle(
        BezierCurve::try_new(vec![
            Point3::new(1., 0., 0.),
            Point3::new(-5., 3., 0.),
            Point3::new(5., 3., 0.),
            Point3::new(-1., 0., 0.),
        ])
        .unwrap()
        .with_self_intersecting(true),
    );

    let results = self_intersections(&cubic, &GeoTolerance::new(TOL)).unwrap();
    assert_eq!(results.len(), 1);

    let Intersection::Point(p) = &results[0] else {
        panic!("expected a point");
    };
    let t1 = p.params1()[0].min(p.params2()[0]);
    let t2 = p.params1()[0].max(p.params2()[0]);
    assert_relative_eq!(t1 + t2, 1., epsilon = 1e-5);
    assert_relative_eq!(t1 * t2, 1. / 16., epsilon = 1e-5);
    assert_relative_eq!(p.point().x, 0., epsilon = 1e-5);
    assert_relative_eq!(p.point().y, 9. / 16., epsilon = 1e-5);
}

#[test]
fn simple_curve_has_no_self_intersections() {
    let arch = quadratic_arch();
    let results = self_intersections(&arch, &GeoTolerance::new(TOL)).unwrap();
    assert!(results.is_empty());
}

#[test]
fn zero_tolerance_is_rejected() {
    let a = line(Point3::new(0., 0., 0.), Point3::new(1., 0., 0.));
    let b = line(Point3::new(0., 1., 0.), Point3::new(1., 1., 0.));
    assert!(intersect_with_epsge(&a, &b, 0.).is_err());
}
