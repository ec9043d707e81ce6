use crate::misc::FloatingPoint;

/// Tolerance bundle governing every classification decision in an
/// intersection tree. Created once at the root and shared by reference
/// through the whole recursion; never mutated after the top-level call.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GeoTolerance<T: FloatingPoint> {
    /// Absolute spatial epsilon below which two geometric quantities are equal.
    epsge: T,
    /// Relative parameter resolution: an interval shorter than
    /// `rel_par_res * full_span` is no longer subdividable.
    rel_par_res: T,
    /// Convergence epsilon for iterative refinement, well below `epsge`.
    numerical: T,
    /// Recursion depth cutoff guarding against non-decreasing complexity.
    max_depth: usize,
}

impl<T: FloatingPoint> GeoTolerance<T> {
    /// Build a tolerance bundle from a spatial epsilon, deriving the rest.
    pub fn new(epsge: T) -> Self {
        let numerical = (epsge * T::from_f64(1e-4).unwrap())
            .max(T::default_epsilon() * T::from_f64(1e2).unwrap());
        Self {
            epsge,
            rel_par_res: T::from_f64(1e-6).unwrap(),
            numerical,
            max_depth: 48,
        }
    }

    pub fn epsge(&self) -> T {
        self.epsge
    }

    pub fn rel_par_res(&self) -> T {
        self.rel_par_res
    }

    pub fn numerical(&self) -> T {
        self.numerical
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn with_rel_par_res(mut self, rel_par_res: T) -> Self {
        self.rel_par_res = rel_par_res;
        self
    }

    pub fn with_numerical(mut self, numerical: T) -> Self {
        self.numerical = numerical;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}
