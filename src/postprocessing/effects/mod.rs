//! The two stages of the composer chain.

mod render_pass;
mod rgb_shift_pass;

pub use render_pass::{DrawStats, RenderPass};
pub use rgb_shift_pass::{RgbShiftPass, RgbShiftSettings};
