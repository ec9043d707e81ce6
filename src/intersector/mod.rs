mod classification;
mod linear_case;
mod newton;
mod pair_intersector;
mod results;

pub use newton::{BoxedGaussNewton, PairDistanceProblem};
pub use pair_intersector::*;
pub use results::*;

#[cfg(test)]
mod tests;
