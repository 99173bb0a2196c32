//! Window Manager Module
//!
//! Owns the X connection, the managed clients and the focus stack, and
//! routes each incoming event either to the runtime (manage, client
//! messages, pointer drags) or to the client it belongs to.

pub mod client;
pub mod configure;
pub mod conn;
pub mod events;
pub mod ewmh;
pub mod focus;
pub mod frame;
pub mod hints;
pub mod notify;
pub mod properties;
pub mod registry;

#[cfg(test)]
pub(crate) mod testing;

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context as _, Result};
use tokio::sync::mpsc;
use tracing::{debug, error, info, trace, warn};
use x11rb::connection::Connection;
use x11rb::protocol::xproto::*;
use x11rb::protocol::Event;
use x11rb::rust_connection::RustConnection;

use crate::config::Config;
use crate::shared::{FrameExtents, Geometry, saturate_i16};
use crate::x11_async::X11EventStream;
use client::{Client, Context};
use conn::{ClientConn, X11Conn};
use events::{ClientEvent, Route};
use ewmh::{Atoms, NET_WM_STATE_ADD, NET_WM_STATE_REMOVE, NET_WM_STATE_TOGGLE, WmState};
use focus::{FocusStack, FocusTracker};
use frame::Frame;
use registry::Clients;

/// Pointer drag in progress on a client frame
#[derive(Debug, Clone, Copy)]
struct Drag {
    window: Window,
    last_x: i16,
    last_y: i16,
}

/// New maximized state requested by a _NET_WM_STATE action
fn requested_maximized(action: u32, maximized: bool) -> Option<bool> {
    match action {
        NET_WM_STATE_REMOVE => Some(false),
        NET_WM_STATE_ADD => Some(true),
        NET_WM_STATE_TOGGLE => Some(!maximized),
        _ => None,
    }
}

/// Frame change produced by dragging `frame` by (dx, dy)
fn drag_target(frame: Geometry, resizing: bool, dx: i32, dy: i32) -> (ConfigWindow, Geometry) {
    if resizing {
        let width = frame.width.saturating_add_signed(dx).max(1);
        let height = frame.height.saturating_add_signed(dy).max(1);
        (
            ConfigWindow::WIDTH | ConfigWindow::HEIGHT,
            Geometry::new(frame.x, frame.y, width, height),
        )
    } else {
        (
            ConfigWindow::X | ConfigWindow::Y,
            Geometry::new(frame.x + dx, frame.y + dy, frame.width, frame.height),
        )
    }
}

pub struct WindowManager {
    conn: Arc<RustConnection>,
    x11: X11Conn,
    screen: Screen,
    root: Window,
    clients: Clients,
    focus: FocusStack,
    extents: FrameExtents,
    frame_color: u32,
    /// Last value written to _NET_ACTIVE_WINDOW
    active: Option<Window>,
    drag: Option<Drag>,
    /// Owns the WM_S{screen} selection; also the _NET_SUPPORTING_WM_CHECK window
    wm_owner_window: Window,
}

impl WindowManager {
    /// Become the window manager of `screen_num`
    ///
    /// With `replace`, an existing window manager is asked to leave by
    /// taking its WM_S{screen} selection; otherwise its presence is an error.
    pub fn new(
        conn: Arc<RustConnection>,
        screen_num: usize,
        config: &Config,
        replace: bool,
    ) -> Result<Self> {
        info!("Initializing window manager (replace={})", replace);

        let screen = conn
            .setup()
            .roots
            .get(screen_num)
            .cloned()
            .with_context(|| format!("Screen {} does not exist", screen_num))?;
        let root = screen.root;

        let selection_name = format!("WM_S{}", screen_num);
        let selection = conn
            .intern_atom(false, selection_name.as_bytes())?
            .reply()
            .context("Failed to intern WM selection atom")?
            .atom;

        let previous_owner = conn
            .get_selection_owner(selection)?
            .reply()
            .context("Failed to get current WM selection owner")?
            .owner;

        if previous_owner != x11rb::NONE {
            if !replace {
                anyhow::bail!(
                    "Another window manager is already running (window 0x{:x}). \
                    Use --replace to replace it.",
                    previous_owner
                );
            }
            info!("Replacing window manager owning window 0x{:x}", previous_owner);
            // Watch for its DestroyNotify; it may already be gone
            let _ = conn.change_window_attributes(
                previous_owner,
                &ChangeWindowAttributesAux::new().event_mask(EventMask::STRUCTURE_NOTIFY),
            );
        }

        let wm_owner_window = conn.generate_id()?;
        conn.create_window(
            x11rb::COPY_DEPTH_FROM_PARENT,
            wm_owner_window,
            root,
            -1000,
            -1000,
            1,
            1,
            0,
            WindowClass::INPUT_ONLY,
            x11rb::COPY_FROM_PARENT,
            &CreateWindowAux::new(),
        )?;

        conn.set_selection_owner(wm_owner_window, selection, x11rb::CURRENT_TIME)?
            .check()
            .context("Failed to set WM selection owner")?;

        let owner = conn.get_selection_owner(selection)?.reply()?.owner;
        if owner != wm_owner_window {
            anyhow::bail!(
                "Failed to acquire WM selection (expected 0x{:x}, got 0x{:x})",
                wm_owner_window,
                owner
            );
        }

        if previous_owner != x11rb::NONE {
            Self::wait_for_exit(&conn, previous_owner)?;
        }

        let root_mask = EventMask::SUBSTRUCTURE_REDIRECT
            | EventMask::SUBSTRUCTURE_NOTIFY
            | EventMask::STRUCTURE_NOTIFY
            | EventMask::PROPERTY_CHANGE
            | EventMask::FOCUS_CHANGE;
        conn.change_window_attributes(root, &ChangeWindowAttributesAux::new().event_mask(root_mask))?
            .check()
            .context("Another window manager is already running")?;

        let atoms = Atoms::new(conn.as_ref())?;
        atoms.setup_supported(conn.as_ref(), root)?;
        atoms.setup_supporting_wm_check(conn.as_ref(), root, wm_owner_window, "arbiter")?;

        // Alt+Button1 moves, Alt+Button3 resizes
        for button in [ButtonIndex::M1, ButtonIndex::M3] {
            conn.grab_button(
                false,
                root,
                EventMask::BUTTON_PRESS | EventMask::BUTTON_RELEASE,
                GrabMode::ASYNC,
                GrabMode::ASYNC,
                x11rb::NONE,
                x11rb::NONE,
                button,
                ModMask::M1,
            )?;
        }

        conn.flush()?;
        info!("Registered as window manager on screen {}", screen_num);

        let x11 = X11Conn::new(conn.clone(), atoms, root);
        Ok(Self {
            conn,
            x11,
            screen,
            root,
            clients: Clients::new(),
            focus: FocusStack::new(config.focus.history_size),
            extents: config.frame_extents(),
            frame_color: config.colors.frame,
            active: None,
            drag: None,
            wm_owner_window,
        })
    }

    fn wait_for_exit(conn: &RustConnection, previous_owner: Window) -> Result<()> {
        info!("Waiting for previous window manager to exit...");
        let timeout = Duration::from_secs(15);
        let start = Instant::now();

        while start.elapsed() < timeout {
            if conn.get_window_attributes(previous_owner)?.reply().is_err() {
                info!("Previous window manager exited");
                return Ok(());
            }
            std::thread::sleep(Duration::from_millis(100));
        }

        warn!("Timeout waiting for previous window manager to exit, proceeding anyway");
        Ok(())
    }

    fn screen_area(&self) -> Geometry {
        Geometry::new(
            0,
            0,
            u32::from(self.screen.width_in_pixels),
            u32::from(self.screen.height_in_pixels),
        )
    }

    /// Manage every window that was already mapped before we started
    pub fn scan(&mut self) -> Result<()> {
        let tree = self.conn.query_tree(self.root)?.reply()?;
        for &window in &tree.children {
            if window == self.wm_owner_window {
                continue;
            }
            let viewable = match self.conn.get_window_attributes(window)?.reply() {
                Ok(attrs) => attrs.map_state == MapState::VIEWABLE,
                Err(_) => false,
            };
            if viewable {
                self.manage(window)?;
            }
        }
        info!("Startup scan managed {} windows", self.clients.len());
        Ok(())
    }

    /// Wrap `window` in a frame and start tracking it
    pub fn manage(&mut self, window: Window) -> Result<()> {
        if self.clients.contains(window) || self.clients.client_for_frame(window).is_some() {
            return Ok(());
        }

        let attrs = match self.conn.get_window_attributes(window)?.reply() {
            Ok(attrs) => attrs,
            Err(e) => {
                debug!("Window {} disappeared before it could be managed: {}", window, e);
                return Ok(());
            }
        };
        if attrs.override_redirect {
            trace!("Window {} is override-redirect, not managing", window);
            return Ok(());
        }

        let geom = match self.conn.get_geometry(window)?.reply() {
            Ok(geom) => geom,
            Err(e) => {
                debug!("Window {} disappeared before it could be managed: {}", window, e);
                return Ok(());
            }
        };
        let client_geometry = Geometry::new(
            i32::from(geom.x),
            i32::from(geom.y),
            u32::from(geom.width),
            u32::from(geom.height),
        );

        let frame = Frame::create(
            self.conn.as_ref(),
            &self.screen,
            client_geometry,
            self.extents,
            self.frame_color,
        )?;
        let frame_id = frame.id;
        let mut client = Client::new(window, frame);

        {
            let mut ctx = Context {
                conn: &self.x11,
                registry: &self.clients,
                focus: &mut self.focus,
            };
            // Selected before reparenting so the reparent's unmap is seen
            client.attach_event_masks(&ctx)?;
            client.load_properties(&mut ctx);
        }

        if attrs.map_state == MapState::VIEWABLE {
            client.expect_unmap();
        }

        self.conn.change_save_set(SetMode::INSERT, window)?;
        self.conn
            .configure_window(window, &ConfigureWindowAux::new().border_width(0))?;
        self.conn.reparent_window(
            window,
            frame_id,
            saturate_i16(i32::try_from(self.extents.left).unwrap_or(i32::MAX)),
            saturate_i16(i32::try_from(self.extents.top).unwrap_or(i32::MAX)),
        )?;

        let atoms = self.x11.atoms();
        atoms.update_frame_extents(self.conn.as_ref(), window, &self.extents)?;
        self.x11.set_wm_state(window, WmState::Normal)?;
        self.conn.map_window(window)?;
        self.conn.map_window(frame_id)?;

        info!(
            "Managing window {} ('{}') in frame {}",
            window, client.name, frame_id
        );
        self.clients.insert(client);
        self.update_client_list()?;
        Ok(())
    }

    fn update_client_list(&self) -> Result<()> {
        self.x11
            .atoms()
            .update_client_list(self.conn.as_ref(), self.root, &self.clients.windows())
    }

    /// Run `f` on a managed client with a handler context
    ///
    /// The client is taken out of the registry for the call, so it never
    /// resolves itself as a transient target; a client that ends up
    /// unmanaged is dropped from the registry afterwards.
    fn with_client<R>(
        &mut self,
        window: Window,
        f: impl FnOnce(&mut Client, &mut Context<'_>) -> Result<R>,
    ) -> Result<Option<R>> {
        let Some(mut client) = self.clients.take(window) else {
            return Ok(None);
        };

        let result = {
            let mut ctx = Context {
                conn: &self.x11,
                registry: &self.clients,
                focus: &mut self.focus,
            };
            f(&mut client, &mut ctx)
        };

        if client.is_managed() {
            self.clients.restore(client);
        } else {
            self.clients.remove(window);
            self.update_client_list()?;
        }

        result.map(Some)
    }

    /// Handle one event from the server
    pub fn handle_event(&mut self, event: Event) -> Result<()> {
        match event {
            Event::MapRequest(e) => self.on_map_request(e.window)?,
            Event::ConfigureRequest(e) if !self.clients.contains(e.window) => {
                configure::forward_configure_request(&self.x11, &e)?;
            }
            Event::FocusIn(e) if e.event == self.root => self.on_root_focus_in(&e)?,
            Event::ClientMessage(e) => self.on_client_message(&e)?,
            Event::ButtonPress(e) => self.begin_drag(&e)?,
            Event::MotionNotify(e) => self.update_drag(&e)?,
            Event::ButtonRelease(_) => self.end_drag()?,
            Event::Error(e) => warn!("X11 error: {:?}", e),
            other => {
                if let Some((route, event)) = ClientEvent::from_event(&other) {
                    self.dispatch(route, &event)?;
                }
            }
        }

        self.sync_active_window()
    }

    fn dispatch(&mut self, route: Route, event: &ClientEvent) -> Result<()> {
        let window = match route {
            Route::Client(window) => window,
            Route::Frame(frame) => match self.clients.client_for_frame(frame) {
                Some(window) => window,
                None => return Ok(()),
            },
        };

        if let Some(result) = self.with_client(window, |client, ctx| client.dispatch(ctx, event))? {
            trace!("{} on window {}: {:?}", event.name(), window, result);
        }
        Ok(())
    }

    fn on_map_request(&mut self, window: Window) -> Result<()> {
        let iconified = self.clients.get(window).map(Client::is_iconified);
        match iconified {
            Some(true) => {
                self.with_client(window, |client, ctx| client.deiconify(ctx))?;
            }
            Some(false) => trace!("MapRequest for already mapped window {}", window),
            None => self.manage(window)?,
        }
        Ok(())
    }

    fn on_root_focus_in(&mut self, event: &FocusInEvent) -> Result<()> {
        if notify::should_ignore_root_focus(event.mode, event.detail) {
            trace!(
                "Ignoring root FocusIn ({} / {})",
                notify::mode_name(event.mode),
                notify::detail_name(event.detail)
            );
            return Ok(());
        }

        debug!("Focus fell back to the root window");
        if let Some(next) = self.focus.fallback() {
            self.x11.set_input_focus(Some(next))?;
        }
        Ok(())
    }

    fn on_client_message(&mut self, event: &ClientMessageEvent) -> Result<()> {
        let atoms = self.x11.atoms().clone();
        let data = event.data.as_data32();
        let window = event.window;

        if event.type_ == atoms.wm_change_state {
            if data[0] == WmState::Iconic as u32 {
                self.with_client(window, |client, ctx| client.iconify(ctx))?;
            }
        } else if event.type_ == atoms.net_wm_state {
            let maximize_atoms = [atoms.net_wm_state_maximized_vert, atoms.net_wm_state_maximized_horz];
            if !maximize_atoms.contains(&data[1]) && !maximize_atoms.contains(&data[2]) {
                return Ok(());
            }

            let area = self.screen_area();
            let changed = self.with_client(window, |client, ctx| {
                match requested_maximized(data[0], client.is_maximized()) {
                    Some(true) => client.maximize(ctx, area)?,
                    Some(false) => client.unmaximize(ctx)?,
                    None => debug!("Unknown _NET_WM_STATE action {}", data[0]),
                }
                Ok(client.is_maximized())
            })?;

            if let Some(maximized) = changed {
                let states: &[Atom] = if maximized { &maximize_atoms } else { &[] };
                atoms.set_net_wm_state(self.conn.as_ref(), window, states)?;
            }
        } else if event.type_ == atoms.net_active_window {
            self.with_client(window, |client, ctx| {
                client.deiconify(ctx)?;
                ctx.conn.configure_window(
                    client.frame.id,
                    &ConfigureWindowAux::new().stack_mode(StackMode::ABOVE),
                )?;
                if client.accepts_input() {
                    ctx.conn.set_input_focus(Some(client.id))?;
                } else {
                    debug!("Window {} declines input focus", client.id);
                }
                Ok(())
            })?;
        }
        Ok(())
    }

    fn begin_drag(&mut self, event: &ButtonPressEvent) -> Result<()> {
        let Some(window) = self.clients.client_for_frame(event.child) else {
            return Ok(());
        };
        let resizing = match event.detail {
            1 => false,
            3 => true,
            _ => return Ok(()),
        };

        let started = self.with_client(window, |client, _| {
            if client.is_maximized() {
                return Ok(false);
            }
            if resizing {
                client.frame.begin_resize();
            } else {
                client.frame.begin_move();
            }
            Ok(true)
        })?;
        if started != Some(true) {
            return Ok(());
        }

        debug!("Starting {} of window {}", if resizing { "resize" } else { "move" }, window);
        self.conn.grab_pointer(
            false,
            self.root,
            EventMask::BUTTON_RELEASE | EventMask::POINTER_MOTION,
            GrabMode::ASYNC,
            GrabMode::ASYNC,
            x11rb::NONE,
            x11rb::NONE,
            event.time,
        )?;
        self.drag = Some(Drag {
            window,
            last_x: event.root_x,
            last_y: event.root_y,
        });
        Ok(())
    }

    fn update_drag(&mut self, event: &MotionNotifyEvent) -> Result<()> {
        let Some(drag) = self.drag else {
            return Ok(());
        };
        let dx = i32::from(event.root_x) - i32::from(drag.last_x);
        let dy = i32::from(event.root_y) - i32::from(drag.last_y);
        if dx == 0 && dy == 0 {
            return Ok(());
        }

        self.with_client(drag.window, |client, ctx| {
            let (mask, target) = drag_target(client.frame.geometry(), client.frame.is_resizing(), dx, dy);
            let target = client.respect_min_size(target);
            client.geometry = client.frame.apply_layout(ctx.conn, client.id, mask, target)?;
            Ok(())
        })?;
        self.drag = Some(Drag {
            last_x: event.root_x,
            last_y: event.root_y,
            ..drag
        });
        Ok(())
    }

    fn end_drag(&mut self) -> Result<()> {
        let Some(drag) = self.drag.take() else {
            return Ok(());
        };
        self.conn.ungrab_pointer(x11rb::CURRENT_TIME)?;
        self.with_client(drag.window, |client, ctx| {
            client.frame.end_interaction();
            client.send_configure_notify(ctx.conn)
        })?;
        debug!("Finished drag of window {}", drag.window);
        Ok(())
    }

    /// Publish the focus tracker's current window as _NET_ACTIVE_WINDOW
    fn sync_active_window(&mut self) -> Result<()> {
        let current = self.focus.current();
        if current != self.active {
            self.x11
                .atoms()
                .update_active_window(self.conn.as_ref(), self.root, current)?;
            self.active = current;
        }
        Ok(())
    }

    /// Hand every client back to the root window
    pub fn release_all(&mut self) -> Result<()> {
        for window in self.clients.windows() {
            self.with_client(window, |client, ctx| client.unmanage(ctx))?;
        }
        self.conn.flush()?;
        info!("Released all clients");
        Ok(())
    }

    /// Event loop; returns after `shutdown` fires or the connection fails
    pub async fn run(&mut self, mut shutdown: mpsc::Receiver<()>) -> Result<()> {
        let stream = X11EventStream::new(self.conn.clone())?;
        info!("Entering event loop");

        loop {
            for event in stream.drain()? {
                if let Err(e) = self.handle_event(event) {
                    error!("Error handling event: {:#}", e);
                }
            }
            stream.flush()?;

            tokio::select! {
                () = stream.wait_readable() => {}
                _ = shutdown.recv() => {
                    info!("Shutdown requested");
                    break;
                }
            }
        }

        self.release_all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requested_maximized() {
        assert_eq!(requested_maximized(NET_WM_STATE_ADD, false), Some(true));
        assert_eq!(requested_maximized(NET_WM_STATE_REMOVE, true), Some(false));
        assert_eq!(requested_maximized(NET_WM_STATE_TOGGLE, true), Some(false));
        assert_eq!(requested_maximized(NET_WM_STATE_TOGGLE, false), Some(true));
        assert_eq!(requested_maximized(7, false), None);
    }

    #[test]
    fn test_drag_move() {
        let (mask, target) = drag_target(Geometry::new(10, 20, 300, 200), false, 5, -30);
        assert_eq!(u16::from(mask), u16::from(ConfigWindow::X | ConfigWindow::Y));
        assert_eq!(target, Geometry::new(15, -10, 300, 200));
    }

    #[test]
    fn test_drag_resize_never_collapses() {
        let (mask, target) = drag_target(Geometry::new(10, 20, 300, 200), true, -400, 25);
        assert_eq!(u16::from(mask), u16::from(ConfigWindow::WIDTH | ConfigWindow::HEIGHT));
        assert_eq!(target, Geometry::new(10, 20, 1, 225));
    }
}
