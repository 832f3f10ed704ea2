//! Application layer: the viewer, its startup sequence and the frame loop.

mod frame_loop;
mod startup;
mod viewer;

pub use frame_loop::{FrameDriver, FrameTarget, LoopControl, RunForever, StopAfter, StopCondition, StopWhen};
pub use startup::{load_assets, StartupError};
pub use viewer::Viewer;
