use std::cmp::Ordering;

use nalgebra::Point3;

use crate::{domain::ParamDomain, misc::FloatingPoint};

/// Which of the two objects of a pairing a parameter refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Side {
    First,
    Second,
}

/// Bookkeeping for a dimension-reduced child node: the parameter that was
/// fixed to a constant value relative to its parent pairing. Results of the
/// child are re-embedded through this record, never silently reinterpreted.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EliminatedParameter<T: FloatingPoint> {
    pub side: Side,
    pub index: usize,
    pub value: T,
}

/// A single location where two parametric objects meet, carrying the
/// parameter coordinates in both objects' own parameter spaces.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IntersectionPoint<T: FloatingPoint> {
    point: Point3<T>,
    params1: Vec<T>,
    params2: Vec<T>,
}

impl<T: FloatingPoint> IntersectionPoint<T> {
    pub fn new(point: Point3<T>, params1: Vec<T>, params2: Vec<T>) -> Self {
        Self {
            point,
            params1,
            params2,
        }
    }

    pub fn point(&self) -> &Point3<T> {
        &self.point
    }

    pub fn params1(&self) -> &[T] {
        &self.params1
    }

    pub fn params2(&self) -> &[T] {
        &self.params2
    }

    pub fn params(&self, side: Side) -> &[T] {
        match side {
            Side::First => &self.params1,
            Side::Second => &self.params2,
        }
    }

    /// The same location with the roles of the two objects exchanged.
    pub(crate) fn swapped(self) -> Self {
        Self {
            point: self.point,
            params1: self.params2,
            params2: self.params1,
        }
    }

    fn embedded(&self, e: &EliminatedParameter<T>) -> Self {
        let mut next = self.clone();
        match e.side {
            Side::First => next.params1.insert(e.index, e.value),
            Side::Second => next.params2.insert(e.index, e.value),
        }
        next
    }
}

/// One intersection result, expressed in the parameter spaces of the two
/// original objects.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Intersection<T: FloatingPoint> {
    /// The objects meet at an isolated location.
    Point(IntersectionPoint<T>),
    /// The objects meet along a curve; one linear piece of it.
    Segment {
        start: IntersectionPoint<T>,
        end: IntersectionPoint<T>,
    },
    /// The objects overlap over a full sub-region of both domains.
    Coincidence {
        domain1: ParamDomain<T>,
        domain2: ParamDomain<T>,
    },
}

impl<T: FloatingPoint> Intersection<T> {
    pub fn is_point(&self) -> bool {
        matches!(self, Self::Point(_))
    }

    pub fn is_segment(&self) -> bool {
        matches!(self, Self::Segment { .. })
    }

    pub fn is_coincidence(&self) -> bool {
        matches!(self, Self::Coincidence { .. })
    }

    /// Re-embed a result of a dimension-reduced child into the parent's
    /// parameter space by re-inserting the eliminated parameter.
    pub(crate) fn embedded(&self, e: &EliminatedParameter<T>) -> Self {
        match self {
            Self::Point(p) => Self::Point(p.embedded(e)),
            Self::Segment { start, end } => Self::Segment {
                start: start.embedded(e),
                end: end.embedded(e),
            },
            Self::Coincidence { domain1, domain2 } => match e.side {
                Side::First => Self::Coincidence {
                    domain1: domain1.embedded(e.index, e.value),
                    domain2: domain2.clone(),
                },
                Side::Second => Self::Coincidence {
                    domain1: domain1.clone(),
                    domain2: domain2.embedded(e.index, e.value),
                },
            },
        }
    }

    /// The same result with the roles of the two objects exchanged.
    pub(crate) fn swapped(self) -> Self {
        match self {
            Self::Point(p) => Self::Point(p.swapped()),
            Self::Segment { start, end } => Self::Segment {
                start: start.swapped(),
                end: end.swapped(),
            },
            Self::Coincidence { domain1, domain2 } => Self::Coincidence {
                domain1: domain2,
                domain2: domain1,
            },
        }
    }

    /// Representative first-object parameters, used for result ordering.
    pub(crate) fn sort_params(&self) -> (Vec<T>, Vec<T>) {
        match self {
            Self::Point(p) => (p.params1.clone(), p.params2.clone()),
            Self::Segment { start, .. } => (start.params1.clone(), start.params2.clone()),
            Self::Coincidence { domain1, domain2 } => (
                domain1.intervals().iter().map(|i| i.min()).collect(),
                domain2.intervals().iter().map(|i| i.min()).collect(),
            ),
        }
    }

    pub(crate) fn compare(&self, other: &Self) -> Ordering {
        let (a1, a2) = self.sort_params();
        let (b1, b2) = other.sort_params();
        compare_params(&a1, &b1).then_with(|| compare_params(&a2, &b2))
    }
}

pub(crate) fn compare_params<T: FloatingPoint>(a: &[T], b: &[T]) -> Ordering {
    for (x, y) in a.iter().zip(b) {
        match x.partial_cmp(y).unwrap_or(Ordering::Equal) {
            Ordering::Equal => continue,
            ord => return ord,
        }
    }
    Ordering::Equal
}
