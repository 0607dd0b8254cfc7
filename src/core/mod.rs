pub mod gesture;
pub mod motion;
pub mod sync;
