pub mod channel;
pub mod easing;
pub mod geometry;
pub mod surface;
