//! Managed client state and lifecycle
//!
//! A [`Client`] is one top-level window the window manager has wrapped in a
//! frame. Every event for it goes through [`Client::dispatch`]; the
//! handlers live next to the state they touch (configure, properties,
//! focus), lifecycle handling is here.

use anyhow::Result;
use bitflags::bitflags;
use tracing::{debug, info, trace, warn};
use x11rb::protocol::xproto::{EventMask, Timestamp, Window};

use crate::shared::Geometry;
use crate::wm::configure::geometry_mask;
use crate::wm::conn::ClientConn;
use crate::wm::ewmh::WmState;
use crate::wm::events::{ClientEvent, EventResult};
use crate::wm::focus::FocusTracker;
use crate::wm::frame::Frame;
use crate::wm::hints::{SizeHints, WmHints};
use crate::wm::registry::Registry;

/// Events selected on the client window
pub fn client_event_mask() -> EventMask {
    EventMask::PROPERTY_CHANGE | EventMask::STRUCTURE_NOTIFY
}

bitflags! {
    /// Client state flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ClientFlags: u32 {
        const ICONIFIED      = 1 << 0;
        const MAXIMIZED      = 1 << 1;
        const FOCUSED        = 1 << 2;
        const URGENT         = 1 << 3;
        const HAS_USER_TIME  = 1 << 4;
    }
}

/// Collaborators a handler may use while processing one event
pub struct Context<'a> {
    pub conn: &'a dyn ClientConn,
    pub registry: &'a dyn Registry,
    pub focus: &'a mut dyn FocusTracker,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lifecycle {
    Managed,
    Unmanaged,
}

/// Window Manager client state
#[derive(Debug)]
pub struct Client {
    /// X11 window ID
    pub id: Window,

    /// Decoration frame, owned for the client's whole managed lifetime
    pub frame: Frame,

    /// Last known geometry of the client window (root coordinates)
    pub geometry: Geometry,

    pub flags: ClientFlags,

    /// Display name (_NET_WM_NAME or WM_NAME)
    pub name: String,

    pub hints: Option<WmHints>,

    pub nhints: Option<SizeHints>,

    /// Last user interaction time (_NET_WM_USER_TIME)
    pub time: Timestamp,

    /// Window this one is transient for; only ever a managed client
    transient_for: Option<Window>,

    /// Geometry to go back to when unmaximizing
    restore_geometry: Option<Geometry>,

    /// UnmapNotify events caused by the window manager itself
    unmap_ignore: u32,

    lifecycle: Lifecycle,
}

impl Client {
    pub fn new(id: Window, frame: Frame) -> Self {
        Self {
            id,
            geometry: frame.client_geometry(),
            frame,
            flags: ClientFlags::default(),
            name: String::new(),
            hints: None,
            nhints: None,
            time: 0,
            transient_for: None,
            restore_geometry: None,
            unmap_ignore: 0,
            lifecycle: Lifecycle::Managed,
        }
    }

    pub fn is_managed(&self) -> bool {
        self.lifecycle == Lifecycle::Managed
    }

    pub fn is_iconified(&self) -> bool {
        self.flags.contains(ClientFlags::ICONIFIED)
    }

    pub fn is_maximized(&self) -> bool {
        self.flags.contains(ClientFlags::MAXIMIZED)
    }

    pub fn is_urgent(&self) -> bool {
        self.flags.contains(ClientFlags::URGENT)
    }

    /// Whether SetInputFocus may be used on this client (WM_HINTS input)
    pub fn accepts_input(&self) -> bool {
        self.hints.as_ref().is_none_or(WmHints::accepts_input)
    }

    pub fn unmap_ignore(&self) -> u32 {
        self.unmap_ignore
    }

    /// Record that the window manager is about to unmap this window, so the
    /// resulting UnmapNotify is not taken as a withdrawal
    pub fn expect_unmap(&mut self) {
        self.unmap_ignore += 1;
    }

    /// Resolve WM_TRANSIENT_FOR against the registry
    pub fn transient_for<'r>(&self, registry: &'r dyn Registry) -> Option<&'r Client> {
        self.transient_for
            .and_then(|window| registry.find_managed_client(window))
    }

    pub fn transient_for_id(&self) -> Option<Window> {
        self.transient_for
    }

    pub(crate) fn set_transient_for(&mut self, window: Window) {
        self.transient_for = Some(window);
    }

    #[cfg(test)]
    pub(crate) fn set_transient_for_unchecked(&mut self, window: Window) {
        self.set_transient_for(window);
    }

    /// Drop the transient-for link if it points at `window`
    pub fn forget_transient_for(&mut self, window: Window) {
        if self.transient_for == Some(window) {
            debug!("Window {} no longer transient for unmanaged {}", self.id, window);
            self.transient_for = None;
        }
    }

    /// Select the events this client's handlers consume
    pub fn attach_event_masks(&self, ctx: &Context<'_>) -> Result<()> {
        ctx.conn.select_input(self.id, client_event_mask())?;
        ctx.conn.select_input(
            self.frame.id,
            EventMask::FOCUS_CHANGE | EventMask::SUBSTRUCTURE_REDIRECT,
        )?;
        Ok(())
    }

    /// Route one event to its handler
    pub fn dispatch(&mut self, ctx: &mut Context<'_>, event: &ClientEvent) -> Result<EventResult> {
        if !self.is_managed() {
            warn!("{} delivered to unmanaged window {}", event.name(), self.id);
            return Ok(EventResult::Ignore);
        }

        trace!("{} for window {}", event.name(), self.id);
        match event {
            ClientEvent::UnmapNotify(_) => self.on_unmap_notify(ctx),
            ClientEvent::DestroyNotify(_) => self.on_destroy_notify(ctx),
            ClientEvent::ConfigureRequest(e) => self.on_configure_request(ctx, e),
            ClientEvent::PropertyNotify(e) => self.on_property_notify(ctx, e),
            ClientEvent::FocusIn(e) => self.on_focus_in(ctx, e),
            ClientEvent::FocusOut(e) => self.on_focus_out(ctx, e),
        }
    }

    pub fn on_destroy_notify(&mut self, ctx: &mut Context<'_>) -> Result<EventResult> {
        self.unmanage(ctx)?;
        Ok(EventResult::Handled)
    }

    pub fn on_unmap_notify(&mut self, ctx: &mut Context<'_>) -> Result<EventResult> {
        // A hidden window must not keep focus
        if self.is_iconified() && ctx.focus.current() == Some(self.id) {
            let next = ctx.focus.fallback();
            ctx.conn.set_input_focus(next)?;
        }

        if self.unmap_ignore > 0 {
            self.unmap_ignore -= 1;
            debug!(
                "Ignoring self-inflicted unmap of window {} ({} left)",
                self.id, self.unmap_ignore
            );
            return Ok(EventResult::Ignore);
        }

        self.unmanage(ctx)?;
        Ok(EventResult::Handled)
    }

    /// Stop managing this client; safe to call more than once
    pub fn unmanage(&mut self, ctx: &mut Context<'_>) -> Result<()> {
        if !self.is_managed() {
            debug!("Window {} is already unmanaged", self.id);
            return Ok(());
        }
        self.lifecycle = Lifecycle::Unmanaged;

        ctx.focus.forget(self.id);
        ctx.conn.release(self.id, self.frame.id, self.frame.geometry())?;

        info!("Unmanaged window {} ('{}')", self.id, self.name);
        Ok(())
    }

    /// Hide the client, keeping it managed
    pub fn iconify(&mut self, ctx: &mut Context<'_>) -> Result<()> {
        if self.is_iconified() {
            return Ok(());
        }
        debug!("Iconifying window {}", self.id);

        self.flags.insert(ClientFlags::ICONIFIED);
        self.expect_unmap();
        ctx.conn.unmap_window(self.id)?;
        ctx.conn.unmap_window(self.frame.id)?;
        ctx.conn.set_wm_state(self.id, WmState::Iconic)?;
        Ok(())
    }

    pub fn deiconify(&mut self, ctx: &mut Context<'_>) -> Result<()> {
        if !self.is_iconified() {
            return Ok(());
        }
        debug!("Deiconifying window {}", self.id);

        self.flags.remove(ClientFlags::ICONIFIED);
        ctx.conn.map_window(self.id)?;
        ctx.conn.map_window(self.frame.id)?;
        ctx.conn.set_wm_state(self.id, WmState::Normal)?;
        Ok(())
    }

    /// Grow the frame to `area`, remembering where it was
    pub fn maximize(&mut self, ctx: &mut Context<'_>, area: Geometry) -> Result<()> {
        if self.is_maximized() {
            return Ok(());
        }
        debug!("Maximizing window {} to {:?}", self.id, area);

        self.restore_geometry = Some(self.frame.geometry());
        self.geometry = self
            .frame
            .apply_layout(ctx.conn, self.id, geometry_mask(), area)?;
        self.flags.insert(ClientFlags::MAXIMIZED);
        Ok(())
    }

    /// Grow a frame size so the client inside keeps its WM_NORMAL_HINTS minimum
    pub fn respect_min_size(&self, target: Geometry) -> Geometry {
        match self.nhints.as_ref().and_then(SizeHints::min_size) {
            Some((width, height)) => {
                let min = self.frame.client_to_frame(0, 0, width, height);
                Geometry {
                    width: target.width.max(min.width),
                    height: target.height.max(min.height),
                    ..target
                }
            }
            None => target,
        }
    }

    pub fn unmaximize(&mut self, ctx: &mut Context<'_>) -> Result<()> {
        if !self.is_maximized() {
            return Ok(());
        }
        debug!("Restoring window {}", self.id);

        self.flags.remove(ClientFlags::MAXIMIZED);
        if let Some(restore) = self.restore_geometry.take() {
            self.geometry = self
                .frame
                .apply_layout(ctx.conn, self.id, geometry_mask(), restore)?;
        }
        Ok(())
    }
}
