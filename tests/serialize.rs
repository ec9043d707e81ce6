#![cfg(feature = "serde")]

use std::sync::Arc;

use nalgebra::Point3;
use parisect::prelude::*;

#[test]
fn test_serialization() {
    let a = BezierCurve::try_new(vec![Point3::new(0., 0., 0.), Point3::new(1., 1., 0.)]).unwrap();
    let b = BezierCurve::try_new(vec![Point3::new(0., 1., 0.), Point3::new(1., 0., 0.)]).unwrap();
    let results = intersect(
        &ObjectHandle::new(Arc::new(a)),
        &ObjectHandle::new(Arc::new(b)),
        &GeoTolerance::new(1e-7),
    )
    .unwrap();
    let json = serde_json::to_string_pretty(&results).unwrap();
    println!("{}", json);
}
