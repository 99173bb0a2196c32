//! Arbiter
//!
//! Per-client event handling for an X11 reparenting window manager: focus
//! notification filtering, unmap/destroy lifecycle, ConfigureRequest
//! arbitration and property refresh.

pub mod config;
pub mod shared;
pub mod wm;
pub mod x11_async;
