mod bounding_box;
mod domain;
mod geometry;
mod handle;
mod intersector;
mod misc;
mod tolerance;

pub mod prelude {
    pub use crate::bounding_box::*;
    pub use crate::domain::*;
    pub use crate::geometry::*;
    pub use crate::handle::*;
    pub use crate::intersector::*;
    pub use crate::misc::*;
    pub use crate::tolerance::*;
}
