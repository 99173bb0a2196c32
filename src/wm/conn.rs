//! Protocol transport used by the per-client handlers
//!
//! Every round trip a handler makes goes through [`ClientConn`], so the
//! handlers can be driven by a recording fake in tests.

use std::sync::Arc;

use anyhow::Result;
use thiserror::Error;
use tracing::trace;
use x11rb::connection::Connection;
use x11rb::errors::{ConnectionError, ReplyError};
use x11rb::protocol::xproto::*;
use x11rb::rust_connection::RustConnection;

use crate::shared::Geometry;
use crate::wm::ewmh::{Atoms, WmState};
use crate::wm::hints::{SizeHints, WmHints};

/// Failure of a synchronous property query
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("connection failed: {0}")]
    Connection(#[from] ConnectionError),

    #[error("request failed: {0}")]
    Reply(#[from] ReplyError),

    #[error("property {property} is not set")]
    Missing { property: &'static str },

    #[error("property {property} has an unexpected format")]
    Malformed { property: &'static str },
}

/// Requests and queries a client handler may issue
pub trait ClientConn {
    /// Resolve an atom to its name
    fn atom_name(&self, atom: Atom) -> Result<String, QueryError>;

    /// _NET_WM_NAME, falling back to WM_NAME
    fn query_name(&self, window: Window) -> Result<String, QueryError>;

    /// WM_HINTS
    fn query_hints(&self, window: Window) -> Result<WmHints, QueryError>;

    /// WM_NORMAL_HINTS
    fn query_normal_hints(&self, window: Window) -> Result<SizeHints, QueryError>;

    /// WM_TRANSIENT_FOR
    fn query_transient_for(&self, window: Window) -> Result<Window, QueryError>;

    /// _NET_WM_USER_TIME
    fn query_user_time(&self, window: Window) -> Result<Timestamp, QueryError>;

    /// SendEvent a ConfigureNotify to `target`
    fn send_configure_notify(
        &self,
        target: Window,
        mask: EventMask,
        event: ConfigureNotifyEvent,
    ) -> Result<()>;

    fn configure_window(&self, window: Window, aux: &ConfigureWindowAux) -> Result<()>;

    /// Select `mask` on `window`
    fn select_input(&self, window: Window, mask: EventMask) -> Result<()>;

    /// Give input focus to `window`, or to the root when `None`
    fn set_input_focus(&self, window: Option<Window>) -> Result<()>;

    fn map_window(&self, window: Window) -> Result<()>;

    fn unmap_window(&self, window: Window) -> Result<()>;

    fn set_wm_state(&self, window: Window, state: WmState) -> Result<()>;

    /// Hand `client` back to the root at `at` and destroy its `frame`
    fn release(&self, client: Window, frame: Window, at: Geometry) -> Result<()>;
}

/// [`ClientConn`] over a live x11rb connection
#[derive(Clone)]
pub struct X11Conn {
    conn: Arc<RustConnection>,
    atoms: Atoms,
    root: Window,
}

impl X11Conn {
    pub fn new(conn: Arc<RustConnection>, atoms: Atoms, root: Window) -> Self {
        Self { conn, atoms, root }
    }

    pub fn atoms(&self) -> &Atoms {
        &self.atoms
    }

    fn property(
        &self,
        window: Window,
        property: impl Into<Atom>,
        type_: impl Into<Atom>,
        len: u32,
        name: &'static str,
    ) -> Result<GetPropertyReply, QueryError> {
        let reply = self
            .conn
            .get_property(false, window, property, type_, 0, len)?
            .reply()?;
        if reply.type_ == x11rb::NONE {
            return Err(QueryError::Missing { property: name });
        }
        Ok(reply)
    }

    fn property32(
        &self,
        window: Window,
        property: impl Into<Atom>,
        type_: impl Into<Atom>,
        len: u32,
        name: &'static str,
    ) -> Result<Vec<u32>, QueryError> {
        let reply = self.property(window, property, type_, len, name)?;
        let values = reply
            .value32()
            .ok_or(QueryError::Malformed { property: name })?
            .collect();
        Ok(values)
    }

    fn string_property(
        &self,
        window: Window,
        property: impl Into<Atom>,
        type_: impl Into<Atom>,
        name: &'static str,
    ) -> Result<String, QueryError> {
        let reply = self.property(window, property, type_, u32::MAX / 4, name)?;
        if reply.format != 8 {
            return Err(QueryError::Malformed { property: name });
        }
        Ok(String::from_utf8_lossy(&reply.value).into_owned())
    }
}

impl ClientConn for X11Conn {
    fn atom_name(&self, atom: Atom) -> Result<String, QueryError> {
        let reply = self.conn.get_atom_name(atom)?.reply()?;
        Ok(String::from_utf8_lossy(&reply.name).into_owned())
    }

    fn query_name(&self, window: Window) -> Result<String, QueryError> {
        match self.string_property(window, self.atoms.net_wm_name, self.atoms.utf8_string, "_NET_WM_NAME") {
            Ok(name) if !name.is_empty() => Ok(name),
            Ok(_) | Err(QueryError::Missing { .. }) | Err(QueryError::Malformed { .. }) => {
                self.string_property(window, AtomEnum::WM_NAME, AtomEnum::ANY, "WM_NAME")
            }
            Err(err) => Err(err),
        }
    }

    fn query_hints(&self, window: Window) -> Result<WmHints, QueryError> {
        let values = self.property32(window, AtomEnum::WM_HINTS, AtomEnum::WM_HINTS, WmHints::LEN, "WM_HINTS")?;
        WmHints::from_values(&values).ok_or(QueryError::Malformed { property: "WM_HINTS" })
    }

    fn query_normal_hints(&self, window: Window) -> Result<SizeHints, QueryError> {
        let values = self.property32(
            window,
            AtomEnum::WM_NORMAL_HINTS,
            AtomEnum::WM_SIZE_HINTS,
            SizeHints::LEN,
            "WM_NORMAL_HINTS",
        )?;
        SizeHints::from_values(&values).ok_or(QueryError::Malformed { property: "WM_NORMAL_HINTS" })
    }

    fn query_transient_for(&self, window: Window) -> Result<Window, QueryError> {
        let values = self.property32(window, AtomEnum::WM_TRANSIENT_FOR, AtomEnum::WINDOW, 1, "WM_TRANSIENT_FOR")?;
        values
            .first()
            .copied()
            .ok_or(QueryError::Malformed { property: "WM_TRANSIENT_FOR" })
    }

    fn query_user_time(&self, window: Window) -> Result<Timestamp, QueryError> {
        let values = self.property32(window, self.atoms.net_wm_user_time, AtomEnum::CARDINAL, 1, "_NET_WM_USER_TIME")?;
        values
            .first()
            .copied()
            .ok_or(QueryError::Malformed { property: "_NET_WM_USER_TIME" })
    }

    fn send_configure_notify(
        &self,
        target: Window,
        mask: EventMask,
        event: ConfigureNotifyEvent,
    ) -> Result<()> {
        trace!("Sending synthetic ConfigureNotify to window {}", target);
        self.conn.send_event(false, target, mask, event)?;
        Ok(())
    }

    fn configure_window(&self, window: Window, aux: &ConfigureWindowAux) -> Result<()> {
        self.conn.configure_window(window, aux)?;
        Ok(())
    }

    fn select_input(&self, window: Window, mask: EventMask) -> Result<()> {
        self.conn
            .change_window_attributes(window, &ChangeWindowAttributesAux::new().event_mask(mask))?;
        Ok(())
    }

    fn set_input_focus(&self, window: Option<Window>) -> Result<()> {
        let target = window.unwrap_or(self.root);
        self.conn
            .set_input_focus(InputFocus::POINTER_ROOT, target, x11rb::CURRENT_TIME)?;
        Ok(())
    }

    fn map_window(&self, window: Window) -> Result<()> {
        self.conn.map_window(window)?;
        Ok(())
    }

    fn unmap_window(&self, window: Window) -> Result<()> {
        self.conn.unmap_window(window)?;
        Ok(())
    }

    fn set_wm_state(&self, window: Window, state: WmState) -> Result<()> {
        self.atoms.set_wm_state(self.conn.as_ref(), window, state)
    }

    fn release(&self, client: Window, frame: Window, at: Geometry) -> Result<()> {
        // The client may already be gone (DestroyNotify); the resulting
        // BadWindow errors arrive as events and are only logged.
        self.conn.change_save_set(SetMode::DELETE, client)?;
        let (x, y) = at.wire_position();
        self.conn.reparent_window(client, self.root, x, y)?;
        self.atoms.set_wm_state(self.conn.as_ref(), client, WmState::Withdrawn)?;
        self.conn.destroy_window(frame)?;
        self.conn.flush()?;
        Ok(())
    }
}
