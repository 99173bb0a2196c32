//! State shared between the window manager runtime and the per-client handlers

pub mod window_state;

pub use window_state::{FrameExtents, Geometry, saturate_i16};
