//! ConfigureRequest arbitration
//!
//! Clients ask to move or resize themselves; the request is granted only
//! while the window manager is not driving the frame itself. A denied
//! request is answered with a synthetic ConfigureNotify (ICCCM 4.1.5).

use anyhow::Result;
use tracing::{debug, trace};
use x11rb::protocol::xproto::*;

use crate::wm::client::{Client, Context};
use crate::wm::conn::ClientConn;
use crate::wm::events::EventResult;

/// Position and size bits
pub fn geometry_mask() -> ConfigWindow {
    ConfigWindow::X | ConfigWindow::Y | ConfigWindow::WIDTH | ConfigWindow::HEIGHT
}

/// The part of a client's request the window manager will honour
///
/// Stacking is never granted from a ConfigureRequest.
pub fn granted_mask(requested: ConfigWindow) -> ConfigWindow {
    let stacking = u16::from(ConfigWindow::STACK_MODE) | u16::from(ConfigWindow::SIBLING);
    ConfigWindow::from(u16::from(requested) & !stacking)
}

/// Forward a request from a window that is not managed, unchanged
pub fn forward_configure_request(conn: &dyn ClientConn, event: &ConfigureRequestEvent) -> Result<()> {
    trace!(
        "Passing ConfigureRequest through for unmanaged window {}",
        event.window
    );
    conn.configure_window(event.window, &ConfigureWindowAux::from_configure_request(event))
}

impl Client {
    /// Whether the frame currently refuses client-driven geometry changes
    pub fn denies_configure(&self) -> bool {
        self.frame.is_moving() || self.frame.is_resizing() || self.is_maximized()
    }

    pub fn on_configure_request(
        &mut self,
        ctx: &mut Context<'_>,
        event: &ConfigureRequestEvent,
    ) -> Result<EventResult> {
        if self.denies_configure() {
            debug!(
                "Denying ConfigureRequest from window {} ({:?}, maximized: {})",
                self.id,
                self.frame.interaction(),
                self.is_maximized()
            );
            self.send_configure_notify(ctx.conn)?;
            return Ok(EventResult::Denied);
        }

        let mask = granted_mask(event.value_mask);
        let target = self.frame.client_to_frame(
            i32::from(event.x),
            i32::from(event.y),
            u32::from(event.width),
            u32::from(event.height),
        );
        trace!("Granting ConfigureRequest from window {}: {:?}", self.id, target);

        let before = self.geometry;
        self.geometry = self.frame.apply_layout(ctx.conn, self.id, mask, target)?;

        // A move alone produces no real ConfigureNotify on the client (ICCCM 4.1.5)
        let moved = (before.x, before.y) != (self.geometry.x, self.geometry.y);
        let resized = (before.width, before.height) != (self.geometry.width, self.geometry.height);
        if moved && !resized {
            self.send_configure_notify(ctx.conn)?;
        }
        Ok(EventResult::Handled)
    }

    /// ConfigureNotify describing where the client currently is
    pub fn configure_notify(&self) -> ConfigureNotifyEvent {
        let (x, y) = self.frame.geometry().wire_position();
        let (width, height) = self.geometry.wire_size();
        ConfigureNotifyEvent {
            response_type: CONFIGURE_NOTIFY_EVENT,
            event: self.id,
            window: self.id,
            above_sibling: x11rb::NONE,
            x,
            y,
            width,
            height,
            border_width: 0,
            override_redirect: false,
            ..Default::default()
        }
    }

    pub fn send_configure_notify(&self, conn: &dyn ClientConn) -> Result<()> {
        conn.send_configure_notify(self.id, EventMask::STRUCTURE_NOTIFY, self.configure_notify())
    }
}
