//! Events Module
//!
//! The subset of X11 events delivered to a managed client, and how each one
//! is keyed to its owner.

use x11rb::protocol::xproto::*;
use x11rb::protocol::Event;

/// Event delivered to a single managed client
#[derive(Debug, Clone, Copy)]
pub enum ClientEvent {
    UnmapNotify(UnmapNotifyEvent),
    DestroyNotify(DestroyNotifyEvent),
    ConfigureRequest(ConfigureRequestEvent),
    PropertyNotify(PropertyNotifyEvent),
    FocusIn(FocusInEvent),
    FocusOut(FocusOutEvent),
}

/// Which window a client event is keyed by
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// The client window itself
    Client(Window),
    /// The frame wrapping a client
    Frame(Window),
}

/// Result of event handling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventResult {
    /// Event was acted on
    Handled,
    /// A request was refused (the client was still notified)
    Denied,
    /// Event was filtered out
    Ignore,
}

/// Set in `response_type` for events delivered through SendEvent
const SEND_EVENT_BIT: u8 = 0x80;

fn is_synthetic(response_type: u8) -> bool {
    response_type & SEND_EVENT_BIT != 0
}

impl ClientEvent {
    /// Pick out the events a client handles, with the window they belong to
    ///
    /// Structure notifications are only taken from the client's own
    /// StructureNotify selection (`event == window`); the copies reported to
    /// the parent via SubstructureNotify are dropped so each unmap is seen
    /// once. A synthetic UnmapNotify sent to the root is the ICCCM
    /// withdrawal of an iconified client and is kept.
    pub fn from_event(event: &Event) -> Option<(Route, Self)> {
        match event {
            Event::UnmapNotify(e) if e.event == e.window || is_synthetic(e.response_type) => {
                Some((Route::Client(e.window), Self::UnmapNotify(*e)))
            }
            Event::DestroyNotify(e) if e.event == e.window => {
                Some((Route::Client(e.window), Self::DestroyNotify(*e)))
            }
            Event::ConfigureRequest(e) => Some((Route::Client(e.window), Self::ConfigureRequest(*e))),
            Event::PropertyNotify(e) => Some((Route::Client(e.window), Self::PropertyNotify(*e))),
            Event::FocusIn(e) => Some((Route::Frame(e.event), Self::FocusIn(*e))),
            Event::FocusOut(e) => Some((Route::Frame(e.event), Self::FocusOut(*e))),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::UnmapNotify(_) => "UnmapNotify",
            Self::DestroyNotify(_) => "DestroyNotify",
            Self::ConfigureRequest(_) => "ConfigureRequest",
            Self::PropertyNotify(_) => "PropertyNotify",
            Self::FocusIn(_) => "FocusIn",
            Self::FocusOut(_) => "FocusOut",
        }
    }
}
