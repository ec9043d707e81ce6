use nalgebra::Vector3;

use crate::{
    bounding_box::projected_interval,
    handle::ObjectHandle,
    intersector::results::Intersection,
    misc::FloatingPoint,
};

/// Outcome of the cheap necessary-condition tests.
pub(crate) enum Interception<T: FloatingPoint> {
    /// The domains cannot intersect; prune this node.
    Separated,
    /// The intersection is already known without classification.
    Resolved(Vec<Intersection<T>>),
    /// Proceed to classification.
    Inconclusive,
}

/// A cone of directions: an axis and a half-angle in radians.
#[derive(Debug, Clone)]
pub(crate) struct DirectionCone<T: FloatingPoint> {
    pub axis: Vector3<T>,
    pub half_angle: T,
}

fn cone_of_directions<T: FloatingPoint>(dirs: &[Vector3<T>]) -> Option<DirectionCone<T>> {
    let mut sum = Vector3::zeros();
    let mut units = Vec::with_capacity(dirs.len());
    for d in dirs {
        let n = d.norm();
        if n <= T::default_epsilon() {
            // A vanishing direction makes the cone unbounded.
            return None;
        }
        let u = d / n;
        sum += u;
        units.push(u);
    }
    let axis_norm = sum.norm();
    if axis_norm <= T::default_epsilon() {
        return None;
    }
    let axis = sum / axis_norm;
    let one = T::one();
    let half_angle = units
        .iter()
        .map(|u| axis.dot(u).clamp(-one, one).acos())
        .fold(T::zero(), |acc, a| acc.max(a));
    Some(DirectionCone { axis, half_angle })
}

/// Tangent direction cone of a curve (or of one parameter direction of a
/// surface) sampled over the current sub-domain.
pub(crate) fn tangent_cone<T: FloatingPoint>(
    obj: &ObjectHandle<T>,
    direction: usize,
) -> Option<DirectionCone<T>> {
    let dirs = obj
        .domain()
        .sample_params()
        .iter()
        .map(|p| obj.derivative(p, direction))
        .collect::<Vec<_>>();
    cone_of_directions(&dirs)
}

/// Normal direction cone of a surface sampled over the current sub-domain.
pub(crate) fn normal_cone<T: FloatingPoint>(obj: &ObjectHandle<T>) -> Option<DirectionCone<T>> {
    let dirs = obj
        .domain()
        .sample_params()
        .iter()
        .map(|p| obj.derivative(p, 0).cross(&obj.derivative(p, 1)))
        .collect::<Vec<_>>();
    cone_of_directions(&dirs)
}

fn angle_between<T: FloatingPoint>(a: &Vector3<T>, b: &Vector3<T>) -> T {
    let one = T::one();
    // Cones are direction sets without orientation.
    let half_pi = T::frac_pi_2();
    let angle = a.dot(b).clamp(-one, one).acos();
    if angle > half_pi {
        T::pi() - angle
    } else {
        angle
    }
}

/// Monotonic-separation test: decide whether the current sub-domain is
/// simple enough that a seeded local solve is guaranteed to converge to the
/// unique intersection in this box.
pub(crate) fn is_simple_case<T: FloatingPoint>(
    obj1: &ObjectHandle<T>,
    obj2: &ObjectHandle<T>,
) -> bool {
    let quarter_pi = T::frac_pi_4();
    let half_pi = T::frac_pi_2();
    match (obj1.parameter_count(), obj2.parameter_count()) {
        // Two points never reach classification; the linear case covers them.
        (0, 0) => false,
        (0, 1) | (1, 0) => {
            let curve = if obj1.parameter_count() == 1 { obj1 } else { obj2 };
            tangent_cone(curve, 0).is_some_and(|c| c.half_angle < quarter_pi)
        }
        (0, 2) | (2, 0) => {
            let surface = if obj1.parameter_count() == 2 { obj1 } else { obj2 };
            normal_cone(surface).is_some_and(|c| c.half_angle < quarter_pi)
        }
        (1, 1) => match (tangent_cone(obj1, 0), tangent_cone(obj2, 0)) {
            (Some(c1), Some(c2)) => {
                c1.half_angle < quarter_pi
                    && c2.half_angle < quarter_pi
                    && angle_between(&c1.axis, &c2.axis) > c1.half_angle + c2.half_angle
            }
            _ => false,
        },
        (1, 2) | (2, 1) => {
            let (curve, surface) = if obj1.parameter_count() == 1 {
                (obj1, obj2)
            } else {
                (obj2, obj1)
            };
            match (tangent_cone(curve, 0), normal_cone(surface)) {
                (Some(t), Some(n)) => {
                    // Transversal crossing: every curve tangent keeps a
                    // positive component along every surface normal.
                    angle_between(&t.axis, &n.axis) + t.half_angle + n.half_angle < half_pi
                }
                _ => false,
            }
        }
        // Surface pairs intersect along curves; never a unique point.
        _ => false,
    }
}

/// Separating axis test over the hull points of both objects, using axes
/// aligned with the objects' dominant directions. A tighter rejection than
/// the axis-aligned box test.
pub(crate) fn rotated_box_separated<T: FloatingPoint>(
    obj1: &ObjectHandle<T>,
    obj2: &ObjectHandle<T>,
    epsge: T,
) -> bool {
    let mut axes: Vec<Vector3<T>> = Vec::with_capacity(3);
    for obj in [obj1, obj2] {
        for direction in 0..obj.parameter_count() {
            if let Some(cone) = tangent_cone(obj, direction) {
                let mut axis = cone.axis;
                for prev in &axes {
                    axis -= prev * prev.dot(&axis);
                }
                let n = axis.norm();
                if n > T::from_f64(1e-8).unwrap() {
                    axes.push(axis / n);
                }
            }
        }
    }
    if axes.len() == 2 {
        let cross = axes[0].cross(&axes[1]);
        axes.push(cross);
    }

    let h1 = obj1.hull_points();
    let h2 = obj2.hull_points();
    for axis in &axes {
        let (a0, a1) = projected_interval(h1.iter(), axis);
        let (b0, b1) = projected_interval(h2.iter(), axis);
        if b0 - a1 > epsge || a0 - b1 > epsge {
            return true;
        }
    }
    false
}
