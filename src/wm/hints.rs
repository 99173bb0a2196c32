//! Hints Module
//!
//! ICCCM WM_HINTS and WM_NORMAL_HINTS, decoded from raw 32-bit property data.

use bitflags::bitflags;

bitflags! {
    /// WM_HINTS flags field
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct WmHintsFlags: u32 {
        const INPUT          = 1 << 0;
        const STATE          = 1 << 1;
        const ICON_PIXMAP    = 1 << 2;
        const ICON_WINDOW    = 1 << 3;
        const ICON_POSITION  = 1 << 4;
        const ICON_MASK      = 1 << 5;
        const WINDOW_GROUP   = 1 << 6;
        const URGENCY        = 1 << 8;
    }
}

bitflags! {
    /// WM_NORMAL_HINTS flags field
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct SizeHintsFlags: u32 {
        const US_POSITION    = 1 << 0;
        const US_SIZE        = 1 << 1;
        const P_POSITION     = 1 << 2;
        const P_SIZE         = 1 << 3;
        const P_MIN_SIZE     = 1 << 4;
        const P_MAX_SIZE     = 1 << 5;
        const P_RESIZE_INC   = 1 << 6;
        const P_ASPECT       = 1 << 7;
        const P_BASE_SIZE    = 1 << 8;
        const P_WIN_GRAVITY  = 1 << 9;
    }
}

/// WM hints (XWMHints equivalent)
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WmHints {
    pub flags: WmHintsFlags,
    pub input: bool,
    pub initial_state: u32,
    pub icon_pixmap: Option<u32>,
    pub icon_window: Option<u32>,
    pub icon_x: i32,
    pub icon_y: i32,
    pub icon_mask: Option<u32>,
    pub window_group: Option<u32>,
}

fn non_zero(value: u32) -> Option<u32> {
    if value != 0 {
        Some(value)
    } else {
        None
    }
}

impl WmHints {
    /// Number of 32-bit values in a current WM_HINTS property
    pub const LEN: u32 = 9;

    /// Decode WM_HINTS property data
    ///
    /// Pre-ICCCM clients write 8 values (no window group); those are
    /// accepted too.
    pub fn from_values(values: &[u32]) -> Option<Self> {
        if values.len() < 8 {
            return None;
        }

        Some(Self {
            flags: WmHintsFlags::from_bits_retain(values[0]),
            input: values[1] != 0,
            initial_state: values[2],
            icon_pixmap: non_zero(values[3]),
            icon_window: non_zero(values[4]),
            icon_x: values[5] as i32,
            icon_y: values[6] as i32,
            icon_mask: non_zero(values[7]),
            window_group: values.get(8).copied().and_then(non_zero),
        })
    }

    /// Is the UrgencyHint bit set?
    pub fn is_urgent(&self) -> bool {
        self.flags.contains(WmHintsFlags::URGENCY)
    }

    /// Does the client want keyboard input from the window manager?
    ///
    /// A missing InputHint means yes.
    pub fn accepts_input(&self) -> bool {
        !self.flags.contains(WmHintsFlags::INPUT) || self.input
    }
}

/// Size hints (XSizeHints equivalent)
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SizeHints {
    pub flags: SizeHintsFlags,
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
    pub min_width: u32,
    pub min_height: u32,
    pub max_width: u32,
    pub max_height: u32,
    pub width_inc: u32,
    pub height_inc: u32,
    pub min_aspect: (u32, u32),
    pub max_aspect: (u32, u32),
    pub base_width: u32,
    pub base_height: u32,
    pub win_gravity: u32,
}

impl SizeHints {
    /// Number of 32-bit values in a current WM_NORMAL_HINTS property
    pub const LEN: u32 = 18;

    /// Decode WM_NORMAL_HINTS property data
    ///
    /// Pre-ICCCM clients write 15 values (no base size, no gravity); those
    /// are accepted with base size and gravity left at zero.
    pub fn from_values(values: &[u32]) -> Option<Self> {
        if values.len() < 15 {
            return None;
        }

        let extra = |index: usize| values.get(index).copied().unwrap_or(0);

        Some(Self {
            flags: SizeHintsFlags::from_bits_retain(values[0]),
            x: values[1] as i32,
            y: values[2] as i32,
            width: values[3],
            height: values[4],
            min_width: values[5],
            min_height: values[6],
            max_width: values[7],
            max_height: values[8],
            width_inc: values[9],
            height_inc: values[10],
            min_aspect: (values[11], values[12]),
            max_aspect: (values[13], values[14]),
            base_width: extra(15),
            base_height: extra(16),
            win_gravity: extra(17),
        })
    }

    /// Minimum size, if the client set one
    pub fn min_size(&self) -> Option<(u32, u32)> {
        self.flags
            .contains(SizeHintsFlags::P_MIN_SIZE)
            .then_some((self.min_width, self.min_height))
    }
}
