//! Recording fakes for driving client handlers without an X server

use std::cell::RefCell;
use std::collections::HashMap;

use anyhow::Result;
use x11rb::protocol::xproto::*;

use crate::shared::{FrameExtents, Geometry};
use crate::wm::client::Client;
use crate::wm::conn::{ClientConn, QueryError};
use crate::wm::ewmh::WmState;
use crate::wm::focus::FocusTracker;
use crate::wm::frame::Frame;
use crate::wm::hints::{SizeHints, WmHints};

/// One request made through [`FakeConn`]
#[derive(Debug, Clone)]
pub enum Call {
    AtomName(Atom),
    QueryName(Window),
    QueryHints(Window),
    QueryNormalHints(Window),
    QueryTransientFor(Window),
    QueryUserTime(Window),
    SendConfigureNotify {
        target: Window,
        mask: EventMask,
        event: ConfigureNotifyEvent,
    },
    Configure {
        window: Window,
        aux: ConfigureWindowAux,
    },
    SelectInput(Window, EventMask),
    SetInputFocus(Option<Window>),
    Map(Window),
    Unmap(Window),
    SetWmState(Window, WmState),
    Release {
        client: Window,
        frame: Window,
        at: Geometry,
    },
}

/// Connection fake: records every call, answers queries from its fields
#[derive(Debug, Default)]
pub struct FakeConn {
    calls: RefCell<Vec<Call>>,
    pub atoms: HashMap<Atom, String>,
    pub name: Option<String>,
    pub hints: Option<WmHints>,
    pub normal_hints: Option<SizeHints>,
    pub transient_for: Option<Window>,
    pub user_time: Option<Timestamp>,
}

impl FakeConn {
    pub fn with_atom(mut self, atom: Atom, name: &str) -> Self {
        self.atoms.insert(atom, name.to_string());
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls.borrow().iter().filter(|call| pred(call)).count()
    }

    fn record(&self, call: Call) {
        self.calls.borrow_mut().push(call);
    }
}

fn answer<T: Clone>(value: &Option<T>, property: &'static str) -> Result<T, QueryError> {
    value.clone().ok_or(QueryError::Missing { property })
}

impl ClientConn for FakeConn {
    fn atom_name(&self, atom: Atom) -> Result<String, QueryError> {
        self.record(Call::AtomName(atom));
        answer(&self.atoms.get(&atom).cloned(), "atom name")
    }

    fn query_name(&self, window: Window) -> Result<String, QueryError> {
        self.record(Call::QueryName(window));
        answer(&self.name, "WM_NAME")
    }

    fn query_hints(&self, window: Window) -> Result<WmHints, QueryError> {
        self.record(Call::QueryHints(window));
        answer(&self.hints, "WM_HINTS")
    }

    fn query_normal_hints(&self, window: Window) -> Result<SizeHints, QueryError> {
        self.record(Call::QueryNormalHints(window));
        answer(&self.normal_hints, "WM_NORMAL_HINTS")
    }

    fn query_transient_for(&self, window: Window) -> Result<Window, QueryError> {
        self.record(Call::QueryTransientFor(window));
        answer(&self.transient_for, "WM_TRANSIENT_FOR")
    }

    fn query_user_time(&self, window: Window) -> Result<Timestamp, QueryError> {
        self.record(Call::QueryUserTime(window));
        answer(&self.user_time, "_NET_WM_USER_TIME")
    }

    fn send_configure_notify(
        &self,
        target: Window,
        mask: EventMask,
        event: ConfigureNotifyEvent,
    ) -> Result<()> {
        self.record(Call::SendConfigureNotify { target, mask, event });
        Ok(())
    }

    fn configure_window(&self, window: Window, aux: &ConfigureWindowAux) -> Result<()> {
        self.record(Call::Configure {
            window,
            aux: aux.clone(),
        });
        Ok(())
    }

    fn select_input(&self, window: Window, mask: EventMask) -> Result<()> {
        self.record(Call::SelectInput(window, mask));
        Ok(())
    }

    fn set_input_focus(&self, window: Option<Window>) -> Result<()> {
        self.record(Call::SetInputFocus(window));
        Ok(())
    }

    fn map_window(&self, window: Window) -> Result<()> {
        self.record(Call::Map(window));
        Ok(())
    }

    fn unmap_window(&self, window: Window) -> Result<()> {
        self.record(Call::Unmap(window));
        Ok(())
    }

    fn set_wm_state(&self, window: Window, state: WmState) -> Result<()> {
        self.record(Call::SetWmState(window, state));
        Ok(())
    }

    fn release(&self, client: Window, frame: Window, at: Geometry) -> Result<()> {
        self.record(Call::Release { client, frame, at });
        Ok(())
    }
}

/// One call made on [`FakeFocus`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusCall {
    Focused(Window),
    Unfocused(Window),
    Fallback,
    Forget(Window),
}

/// Focus tracker fake; `fallback` always yields `next`
#[derive(Debug, Default)]
pub struct FakeFocus {
    pub current: Option<Window>,
    pub next: Option<Window>,
    pub calls: Vec<FocusCall>,
}

impl FakeFocus {
    pub fn focused_on(window: Window) -> Self {
        Self {
            current: Some(window),
            ..Default::default()
        }
    }
}

impl FocusTracker for FakeFocus {
    fn current(&self) -> Option<Window> {
        self.current
    }

    fn fallback(&mut self) -> Option<Window> {
        self.calls.push(FocusCall::Fallback);
        self.current = self.next;
        self.next
    }

    fn focused(&mut self, window: Window) {
        self.calls.push(FocusCall::Focused(window));
        self.current = Some(window);
    }

    fn unfocused(&mut self, window: Window) {
        self.calls.push(FocusCall::Unfocused(window));
        if self.current == Some(window) {
            self.current = None;
        }
    }

    fn forget(&mut self, window: Window) {
        self.calls.push(FocusCall::Forget(window));
        if self.current == Some(window) {
            self.current = None;
        }
    }
}

/// Managed client at (100, 100) 800x600 inside a 24px titlebar, 4px border frame
pub fn client(id: Window, frame: Window) -> Client {
    let frame = Frame::around(
        frame,
        Geometry::new(100, 100, 800, 600),
        FrameExtents::with_titlebar(24, 4),
    );
    Client::new(id, frame)
}
