use crate::misc::FloatingPoint;

/// A closed parameter interval.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Interval<T: FloatingPoint> {
    min: T,
    max: T,
}

impl<T: FloatingPoint> Interval<T> {
    pub fn new(min: T, max: T) -> Self {
        if min <= max {
            Self { min, max }
        } else {
            Self { min: max, max: min }
        }
    }

    pub fn min(&self) -> T {
        self.min
    }

    pub fn max(&self) -> T {
        self.max
    }

    pub fn length(&self) -> T {
        self.max - self.min
    }

    pub fn mid(&self) -> T {
        (self.min + self.max) * T::from_f64(0.5).unwrap()
    }

    /// Map a normalized parameter in `[0, 1]` into the interval.
    pub fn lerp(&self, t: T) -> T {
        self.min + self.length() * t
    }

    /// Normalize a contained parameter into `[0, 1]`.
    pub fn normalize(&self, t: T) -> T {
        let l = self.length();
        if l <= T::default_epsilon() {
            T::zero()
        } else {
            (t - self.min) / l
        }
    }

    pub fn contains(&self, t: T, tolerance: T) -> bool {
        self.min - tolerance <= t && t <= self.max + tolerance
    }

    pub fn clamp(&self, t: T) -> T {
        t.clamp(self.min, self.max)
    }

    /// Overlap with another interval, `None` if they are disjoint.
    pub fn overlap(&self, other: &Self) -> Option<Self> {
        let min = self.min.max(other.min);
        let max = self.max.min(other.max);
        (min <= max).then(|| Self { min, max })
    }

    pub fn union(&self, other: &Self) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    pub fn split(&self, t: T) -> (Self, Self) {
        (Self::new(self.min, t), Self::new(t, self.max))
    }
}

/// The parameter domain of a parametric object: zero (point), one (curve)
/// or two (surface) ordered intervals.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ParamDomain<T: FloatingPoint> {
    intervals: Vec<Interval<T>>,
}

impl<T: FloatingPoint> ParamDomain<T> {
    /// Domain of a point object (no parameters).
    pub fn point() -> Self {
        Self { intervals: vec![] }
    }

    /// Domain of a curve object.
    pub fn curve(interval: Interval<T>) -> Self {
        Self {
            intervals: vec![interval],
        }
    }

    /// Domain of a surface object.
    pub fn surface(u: Interval<T>, v: Interval<T>) -> Self {
        Self {
            intervals: vec![u, v],
        }
    }

    pub fn from_intervals(intervals: Vec<Interval<T>>) -> Self {
        Self { intervals }
    }

    pub fn parameter_count(&self) -> usize {
        self.intervals.len()
    }

    pub fn intervals(&self) -> &[Interval<T>] {
        &self.intervals
    }

    pub fn interval_at(&self, axis: usize) -> &Interval<T> {
        &self.intervals[axis]
    }

    /// A domain is degenerate when any of its intervals has zero length.
    pub fn is_degenerate(&self) -> bool {
        self.intervals
            .iter()
            .any(|i| i.length() <= T::default_epsilon())
    }

    /// Insert a degenerate interval, fixing a parameter at a constant value.
    pub fn embedded(&self, axis: usize, value: T) -> Self {
        let mut intervals = self.intervals.clone();
        intervals.insert(axis, Interval::new(value, value));
        Self { intervals }
    }

    /// Remove one parameter direction.
    pub fn eliminated(&self, axis: usize) -> Self {
        let mut intervals = self.intervals.clone();
        intervals.remove(axis);
        Self { intervals }
    }

    /// Split one axis at the given parameter.
    pub fn split(&self, axis: usize, t: T) -> (Self, Self) {
        let (head, tail) = self.intervals[axis].split(t);
        let mut a = self.intervals.clone();
        let mut b = self.intervals.clone();
        a[axis] = head;
        b[axis] = tail;
        (Self { intervals: a }, Self { intervals: b })
    }

    pub fn mid_params(&self) -> Vec<T> {
        self.intervals.iter().map(|i| i.mid()).collect()
    }

    /// All corner parameter tuples (2^n corners; a single empty tuple for points).
    pub fn corner_params(&self) -> Vec<Vec<T>> {
        let mut corners = vec![vec![]];
        for interval in &self.intervals {
            let mut next = Vec::with_capacity(corners.len() * 2);
            for c in &corners {
                for value in [interval.min(), interval.max()] {
                    let mut extended = c.clone();
                    extended.push(value);
                    next.push(extended);
                }
            }
            corners = next;
        }
        corners
    }

    /// A (min, mid, max)^n sampling grid over the domain.
    pub fn sample_params(&self) -> Vec<Vec<T>> {
        let mut samples = vec![vec![]];
        for interval in &self.intervals {
            let mut next = Vec::with_capacity(samples.len() * 3);
            for s in &samples {
                for value in [interval.min(), interval.mid(), interval.max()] {
                    let mut extended = s.clone();
                    extended.push(value);
                    next.push(extended);
                }
            }
            samples = next;
        }
        samples
    }

    pub fn contains(&self, params: &[T], tolerance: T) -> bool {
        params.len() == self.intervals.len()
            && self
                .intervals
                .iter()
                .zip(params)
                .all(|(i, &t)| i.contains(t, tolerance))
    }

    pub fn clamp(&self, params: &[T]) -> Vec<T> {
        self.intervals
            .iter()
            .zip(params)
            .map(|(i, &t)| i.clamp(t))
            .collect()
    }

    /// Axis-wise overlap of two domains with equal parameter count.
    pub fn overlap(&self, other: &Self) -> Option<Self> {
        if self.intervals.len() != other.intervals.len() {
            return None;
        }
        self.intervals
            .iter()
            .zip(&other.intervals)
            .map(|(a, b)| a.overlap(b))
            .collect::<Option<Vec<_>>>()
            .map(Self::from_intervals)
    }

    /// Axis-wise union of two domains with equal parameter count.
    pub fn union(&self, other: &Self) -> Self {
        Self {
            intervals: self
                .intervals
                .iter()
                .zip(&other.intervals)
                .map(|(a, b)| a.union(b))
                .collect(),
        }
    }
}
