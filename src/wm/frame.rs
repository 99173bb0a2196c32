//! Frame Module
//!
//! The decoration window a managed client is reparented into. The frame
//! owns the client's on-screen geometry, translates client-relative
//! requests into frame geometry, and tracks interactive move/resize state.

use anyhow::Result;
use tracing::debug;
use x11rb::connection::Connection;
use x11rb::protocol::xproto::*;

use crate::shared::{FrameExtents, Geometry};
use crate::wm::conn::ClientConn;

/// Interactive operation currently driving the frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Interaction {
    #[default]
    Idle,
    Moving,
    Resizing,
}

fn has(mask: ConfigWindow, bit: ConfigWindow) -> bool {
    u16::from(mask) & u16::from(bit) != 0
}

/// A client's decoration frame
#[derive(Debug, Clone)]
pub struct Frame {
    /// Frame window ID
    pub id: Window,
    geometry: Geometry,
    extents: FrameExtents,
    interaction: Interaction,
}

impl Frame {
    pub fn new(id: Window, geometry: Geometry, extents: FrameExtents) -> Self {
        Self {
            id,
            geometry,
            extents,
            interaction: Interaction::Idle,
        }
    }

    /// Frame sized to wrap a client currently at `client` (root coordinates)
    pub fn around(id: Window, client: Geometry, extents: FrameExtents) -> Self {
        let mut frame = Self::new(id, Geometry::default(), extents);
        frame.geometry = frame.client_to_frame(client.x, client.y, client.width, client.height);
        frame
    }

    /// Create the frame window on the server, sized around `client`
    pub fn create<C: Connection>(
        conn: &C,
        screen: &Screen,
        client: Geometry,
        extents: FrameExtents,
        background: u32,
    ) -> Result<Self> {
        let id = conn.generate_id()?;
        let frame = Self::around(id, client, extents);
        let (x, y) = frame.geometry.wire_position();
        let (width, height) = frame.geometry.wire_size();

        conn.create_window(
            screen.root_depth,
            id,
            screen.root,
            x,
            y,
            width.max(1),
            height.max(1),
            0,
            WindowClass::INPUT_OUTPUT,
            x11rb::COPY_FROM_PARENT,
            &CreateWindowAux::new().background_pixel(background),
        )?;

        debug!("Created frame {} at {:?}", id, frame.geometry);
        Ok(frame)
    }

    pub fn geometry(&self) -> Geometry {
        self.geometry
    }

    /// Where the client sits, in root coordinates
    pub fn client_geometry(&self) -> Geometry {
        Geometry {
            x: self.geometry.x + self.extents.left as i32,
            y: self.geometry.y + self.extents.top as i32,
            width: self.geometry.width.saturating_sub(self.extents.horizontal()).max(1),
            height: self.geometry.height.saturating_sub(self.extents.vertical()).max(1),
        }
    }

    /// Translate a client-relative geometry into the frame geometry that
    /// would place the client there
    pub fn client_to_frame(&self, x: i32, y: i32, width: u32, height: u32) -> Geometry {
        Geometry {
            x: x - self.extents.left as i32,
            y: y - self.extents.top as i32,
            width: width.saturating_add(self.extents.horizontal()),
            height: height.saturating_add(self.extents.vertical()),
        }
    }

    pub fn interaction(&self) -> Interaction {
        self.interaction
    }

    pub fn is_moving(&self) -> bool {
        self.interaction == Interaction::Moving
    }

    pub fn is_resizing(&self) -> bool {
        self.interaction == Interaction::Resizing
    }

    pub fn begin_move(&mut self) {
        self.interaction = Interaction::Moving;
    }

    pub fn begin_resize(&mut self) {
        self.interaction = Interaction::Resizing;
    }

    pub fn end_interaction(&mut self) {
        self.interaction = Interaction::Idle;
    }

    /// Move/resize the frame to `target`, honouring only the fields in
    /// `mask`, and keep `client` filling the frame's interior
    ///
    /// Returns the client's new geometry in root coordinates.
    pub fn apply_layout(
        &mut self,
        conn: &dyn ClientConn,
        client: Window,
        mask: ConfigWindow,
        target: Geometry,
    ) -> Result<Geometry> {
        let mut next = self.geometry;
        let mut aux = ConfigureWindowAux::new();

        if has(mask, ConfigWindow::X) {
            next.x = target.x;
            aux = aux.x(target.x);
        }
        if has(mask, ConfigWindow::Y) {
            next.y = target.y;
            aux = aux.y(target.y);
        }
        if has(mask, ConfigWindow::WIDTH) {
            next.width = target.width.max(self.extents.horizontal() + 1);
            aux = aux.width(next.width);
        }
        if has(mask, ConfigWindow::HEIGHT) {
            next.height = target.height.max(self.extents.vertical() + 1);
            aux = aux.height(next.height);
        }

        conn.configure_window(self.id, &aux)?;
        self.geometry = next;

        let inner = self.client_geometry();
        if has(mask, ConfigWindow::WIDTH | ConfigWindow::HEIGHT) {
            conn.configure_window(
                client,
                &ConfigureWindowAux::new()
                    .x(self.extents.left as i32)
                    .y(self.extents.top as i32)
                    .width(inner.width)
                    .height(inner.height)
                    .border_width(0),
            )?;
        }

        Ok(inner)
    }
}
