//! EWMH and ICCCM root/client properties
//!
//! Interned atoms plus the handful of properties the window manager itself
//! publishes (_NET_SUPPORTED, _NET_CLIENT_LIST, _NET_ACTIVE_WINDOW, WM_STATE).

use anyhow::Result;
use tracing::debug;
use x11rb::connection::Connection;
use x11rb::protocol::xproto::*;
use x11rb::wrapper::ConnectionExt as _;

/// ICCCM WM_STATE values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WmState {
    Withdrawn = 0,
    Normal = 1,
    Iconic = 3,
}

/// _NET_WM_STATE client message actions
pub const NET_WM_STATE_REMOVE: u32 = 0;
pub const NET_WM_STATE_ADD: u32 = 1;
pub const NET_WM_STATE_TOGGLE: u32 = 2;

/// Holds all interned atoms
#[derive(Debug, Clone)]
pub struct Atoms {
    pub net_supported: Atom,
    pub net_client_list: Atom,
    pub net_active_window: Atom,
    pub net_supporting_wm_check: Atom,
    pub net_frame_extents: Atom,
    pub net_wm_name: Atom,
    pub net_wm_user_time: Atom,
    pub net_wm_state: Atom,
    pub net_wm_state_maximized_vert: Atom,
    pub net_wm_state_maximized_horz: Atom,
    pub utf8_string: Atom,
    pub wm_state: Atom,
    pub wm_change_state: Atom,
}

impl Atoms {
    /// Intern all required atoms
    pub fn new<C: Connection>(conn: &C) -> Result<Self> {
        let intern = |name: &str| -> Result<Atom> {
            Ok(conn.intern_atom(false, name.as_bytes())?.reply()?.atom)
        };

        Ok(Self {
            net_supported: intern("_NET_SUPPORTED")?,
            net_client_list: intern("_NET_CLIENT_LIST")?,
            net_active_window: intern("_NET_ACTIVE_WINDOW")?,
            net_supporting_wm_check: intern("_NET_SUPPORTING_WM_CHECK")?,
            net_frame_extents: intern("_NET_FRAME_EXTENTS")?,
            net_wm_name: intern("_NET_WM_NAME")?,
            net_wm_user_time: intern("_NET_WM_USER_TIME")?,
            net_wm_state: intern("_NET_WM_STATE")?,
            net_wm_state_maximized_vert: intern("_NET_WM_STATE_MAXIMIZED_VERT")?,
            net_wm_state_maximized_horz: intern("_NET_WM_STATE_MAXIMIZED_HORZ")?,
            utf8_string: intern("UTF8_STRING")?,
            wm_state: intern("WM_STATE")?,
            wm_change_state: intern("WM_CHANGE_STATE")?,
        })
    }

    /// Set up _NET_SUPPORTED on root window
    pub fn setup_supported<C: Connection>(&self, conn: &C, root: Window) -> Result<()> {
        let supported = [
            self.net_supported,
            self.net_client_list,
            self.net_active_window,
            self.net_supporting_wm_check,
            self.net_frame_extents,
            self.net_wm_name,
            self.net_wm_user_time,
            self.net_wm_state,
            self.net_wm_state_maximized_vert,
            self.net_wm_state_maximized_horz,
        ];

        conn.change_property32(
            PropMode::REPLACE,
            root,
            self.net_supported,
            AtomEnum::ATOM,
            &supported,
        )?;

        Ok(())
    }

    /// Point _NET_SUPPORTING_WM_CHECK at `check` and name it
    pub fn setup_supporting_wm_check<C: Connection>(
        &self,
        conn: &C,
        root: Window,
        check: Window,
        name: &str,
    ) -> Result<()> {
        for window in [root, check] {
            conn.change_property32(
                PropMode::REPLACE,
                window,
                self.net_supporting_wm_check,
                AtomEnum::WINDOW,
                &[check],
            )?;
        }
        conn.change_property8(
            PropMode::REPLACE,
            check,
            self.net_wm_name,
            self.utf8_string,
            name.as_bytes(),
        )?;
        Ok(())
    }

    /// Update _NET_ACTIVE_WINDOW
    pub fn update_active_window<C: Connection>(
        &self,
        conn: &C,
        root: Window,
        window: Option<Window>,
    ) -> Result<()> {
        let win = window.unwrap_or(x11rb::NONE);
        conn.change_property32(
            PropMode::REPLACE,
            root,
            self.net_active_window,
            AtomEnum::WINDOW,
            &[win],
        )?;
        Ok(())
    }

    /// Update _NET_CLIENT_LIST root property with list of managed windows
    pub fn update_client_list<C: Connection>(
        &self,
        conn: &C,
        root: Window,
        windows: &[Window],
    ) -> Result<()> {
        conn.change_property32(
            PropMode::REPLACE,
            root,
            self.net_client_list,
            AtomEnum::WINDOW,
            windows,
        )?;
        Ok(())
    }

    /// Update _NET_FRAME_EXTENTS for a window
    pub fn update_frame_extents<C: Connection>(
        &self,
        conn: &C,
        window: Window,
        extents: &crate::shared::FrameExtents,
    ) -> Result<()> {
        conn.change_property32(
            PropMode::REPLACE,
            window,
            self.net_frame_extents,
            AtomEnum::CARDINAL,
            &[extents.left, extents.right, extents.top, extents.bottom],
        )?;
        Ok(())
    }

    /// Write ICCCM WM_STATE, or delete it for `Withdrawn`
    pub fn set_wm_state<C: Connection>(&self, conn: &C, window: Window, state: WmState) -> Result<()> {
        debug!("WM_STATE of window {} -> {:?}", window, state);
        if state == WmState::Withdrawn {
            conn.delete_property(window, self.wm_state)?;
        } else {
            conn.change_property32(
                PropMode::REPLACE,
                window,
                self.wm_state,
                self.wm_state,
                &[state as u32, x11rb::NONE],
            )?;
        }
        Ok(())
    }

    /// Replace _NET_WM_STATE with exactly `states`
    pub fn set_net_wm_state<C: Connection>(&self, conn: &C, window: Window, states: &[Atom]) -> Result<()> {
        conn.change_property32(
            PropMode::REPLACE,
            window,
            self.net_wm_state,
            AtomEnum::ATOM,
            states,
        )?;
        Ok(())
    }
}
