//! PropertyNotify routing
//!
//! Maps a changed property to the cached client state it feeds and
//! re-queries it. A failed query keeps whatever was cached before.

use anyhow::Result;
use tracing::{debug, trace, warn};
use x11rb::protocol::xproto::{Property as PropertyState, PropertyNotifyEvent};

use crate::wm::client::{Client, ClientFlags, Context};
use crate::wm::events::EventResult;

/// Client properties the window manager follows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Property {
    Name,
    Icon,
    Hints,
    NormalHints,
    TransientFor,
    UserTime,
    StrutPartial,
}

impl Property {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "_NET_WM_VISIBLE_NAME" | "_NET_WM_NAME" | "WM_NAME" => Some(Self::Name),
            "_NET_WM_ICON" => Some(Self::Icon),
            "WM_HINTS" => Some(Self::Hints),
            "WM_NORMAL_HINTS" => Some(Self::NormalHints),
            "WM_TRANSIENT_FOR" => Some(Self::TransientFor),
            "_NET_WM_USER_TIME" => Some(Self::UserTime),
            "_NET_WM_STRUT_PARTIAL" => Some(Self::StrutPartial),
            _ => None,
        }
    }
}

impl Client {
    pub fn on_property_notify(
        &mut self,
        ctx: &mut Context<'_>,
        event: &PropertyNotifyEvent,
    ) -> Result<EventResult> {
        let name = match ctx.conn.atom_name(event.atom) {
            Ok(name) => name,
            Err(err) => {
                warn!(
                    "Could not get name of property atom {} on window {}: {}",
                    event.atom, self.id, err
                );
                return Ok(EventResult::Ignore);
            }
        };

        let deleted = event.state == PropertyState::DELETE;
        trace!("Property {} on window {} changed (deleted: {})", name, self.id, deleted);

        match Property::from_name(&name) {
            Some(property) => {
                self.refresh(ctx, property);
                Ok(EventResult::Handled)
            }
            None => Ok(EventResult::Ignore),
        }
    }

    /// Re-read one property into the client's cached state
    pub fn refresh(&mut self, ctx: &mut Context<'_>, property: Property) {
        match property {
            Property::Name => match ctx.conn.query_name(self.id) {
                Ok(name) => {
                    debug!("Window {} renamed '{}' -> '{}'", self.id, self.name, name);
                    self.name = name;
                }
                Err(err) => debug!("Keeping name of window {}: {}", self.id, err),
            },
            Property::Hints => match ctx.conn.query_hints(self.id) {
                Ok(hints) => {
                    self.flags.set(ClientFlags::URGENT, hints.is_urgent());
                    self.hints = Some(hints);
                }
                Err(err) => debug!("Keeping WM_HINTS of window {}: {}", self.id, err),
            },
            Property::NormalHints => match ctx.conn.query_normal_hints(self.id) {
                Ok(nhints) => self.nhints = Some(nhints),
                Err(err) => debug!("Keeping WM_NORMAL_HINTS of window {}: {}", self.id, err),
            },
            Property::TransientFor => match ctx.conn.query_transient_for(self.id) {
                Ok(window) => {
                    if ctx.registry.find_managed_client(window).is_some() {
                        self.set_transient_for(window);
                    } else {
                        debug!(
                            "Window {} is transient for unmanaged window {}",
                            self.id, window
                        );
                    }
                }
                Err(err) => debug!("Keeping WM_TRANSIENT_FOR of window {}: {}", self.id, err),
            },
            Property::UserTime => match ctx.conn.query_user_time(self.id) {
                Ok(time) => {
                    trace!("Window {} user time: old {}, new {}", self.id, self.time, time);
                    self.time = time;
                    self.flags.insert(ClientFlags::HAS_USER_TIME);
                }
                Err(err) => debug!("Keeping user time of window {}: {}", self.id, err),
            },
            Property::Icon | Property::StrutPartial => {}
        }
    }

    /// Initial read of every cached property, at manage time
    pub fn load_properties(&mut self, ctx: &mut Context<'_>) {
        for property in [
            Property::Name,
            Property::Hints,
            Property::NormalHints,
            Property::TransientFor,
            Property::UserTime,
        ] {
            self.refresh(ctx, property);
        }
    }
}
