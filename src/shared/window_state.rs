//! Window geometry shared by frames, clients and the runtime

/// Window geometry in root coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Geometry {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Geometry {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    /// Position as the core protocol carries it, saturated to `i16`
    pub fn wire_position(&self) -> (i16, i16) {
        (saturate_i16(self.x), saturate_i16(self.y))
    }

    /// Size as the core protocol carries it, saturated to `u16`
    pub fn wire_size(&self) -> (u16, u16) {
        (saturate_u16(self.width), saturate_u16(self.height))
    }
}

pub fn saturate_i16(value: i32) -> i16 {
    i16::try_from(value).unwrap_or(if value < 0 { i16::MIN } else { i16::MAX })
}

pub fn saturate_u16(value: u32) -> u16 {
    u16::try_from(value).unwrap_or(u16::MAX)
}

/// Decoration thickness on each side of a client window
///
/// A frame is exactly its client grown by these extents: the client sits at
/// `(left, top)` inside the frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameExtents {
    pub left: u32,
    pub right: u32,
    pub top: u32,
    pub bottom: u32,
}

impl FrameExtents {
    pub fn new(left: u32, right: u32, top: u32, bottom: u32) -> Self {
        Self { left, right, top, bottom }
    }

    /// Extents for a frame with a titlebar and a uniform border
    pub fn with_titlebar(titlebar_height: u32, border_width: u32) -> Self {
        Self {
            left: border_width,
            right: border_width,
            top: titlebar_height + border_width,
            bottom: border_width,
        }
    }

    pub fn horizontal(&self) -> u32 {
        self.left + self.right
    }

    pub fn vertical(&self) -> u32 {
        self.top + self.bottom
    }
}
