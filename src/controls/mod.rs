//! Input controls.

mod pointer_tilt;

pub use pointer_tilt::{PointerTilt, TiltTarget};
