use std::sync::Arc;

use nalgebra::Point3;
use parisect::prelude::*;

#[test]
fn curve_surface_crossing() {
    let needle = BezierCurve::try_new(vec![
        Point3::new(0.25, 0.25, -1.),
        Point3::new(0.25, 0.25, 1.),
    ])
    .unwrap();
    let patch = BezierSurface::try_new(vec![
        vec![Point3::new(0., 0., 0.), Point3::new(0., 1., 0.)],
        vec![Point3::new(1., 0., 0.), Point3::new(1., 1., 0.)],
    ])
    .unwrap();

    let results: Vec<Intersection<f64>> = intersect(
        &ObjectHandle::new(Arc::new(needle)),
        &ObjectHandle::new(Arc::new(patch)),
        &GeoTolerance::new(1e-7),
    )
    .unwrap();

    assert_eq!(results.len(), 1);
    let Intersection::Point(p) = &results[0] else {
        panic!("expected a point");
    };
    assert!((p.params1()[0] - 0.5).abs() < 1e-6);
    assert!((p.params2()[0] - 0.25).abs() < 1e-6);
    assert!((p.params2()[1] - 0.25).abs() < 1e-6);
}

#[test]
fn curve_curve_crossing_with_custom_tolerances() {
    let a = BezierCurve::try_new(vec![
        Point3::new(-1., 0., 0.),
        Point3::new(0., 1., 0.),
        Point3::new(1., 0., 0.),
    ])
    .unwrap();
    let b = BezierCurve::try_new(vec![Point3::new(-2., 0.375, 0.), Point3::new(2., 0.375, 0.)])
        .unwrap();

    let tol = GeoTolerance::new(1e-6).with_max_depth(40);
    let results: Vec<Intersection<f64>> = intersect(
        &ObjectHandle::new(Arc::new(a)),
        &ObjectHandle::new(Arc::new(b)),
        &tol,
    )
    .unwrap();

    assert_eq!(results.len(), 2);
    assert!(results.iter().all(Intersection::is_point));
}
