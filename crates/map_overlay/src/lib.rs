pub mod domain;
pub mod map_overlay;

pub use domain::*;
pub use map_overlay::*;
