pub mod plane;
pub mod segment;

pub use plane::*;
pub use segment::*;

use nalgebra::RealField;
use num_traits::ToPrimitive;

/// Scalar bound for every geometric quantity in the crate: a real field
/// with conversions to primitive floats.
pub trait FloatingPoint: RealField + ToPrimitive + Copy {}

impl FloatingPoint for f32 {}
impl FloatingPoint for f64 {}
