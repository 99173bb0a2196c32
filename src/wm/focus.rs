//! Focus Module
//!
//! Global focus state (a most-recently-focused stack with fallback) and the
//! per-client FocusIn/FocusOut handlers.

use std::collections::VecDeque;

use anyhow::Result;
use tracing::{debug, trace};
use x11rb::protocol::xproto::{FocusInEvent, FocusOutEvent, Window};

use crate::wm::client::{Client, ClientFlags, Context};
use crate::wm::events::EventResult;
use crate::wm::notify::{detail_name, mode_name, should_ignore_focus};

/// Global focus state as seen by client handlers
pub trait FocusTracker {
    /// Window currently holding focus
    fn current(&self) -> Option<Window>;

    /// Drop the current window and pick the next candidate, if any
    fn fallback(&mut self) -> Option<Window>;

    fn focused(&mut self, window: Window);

    fn unfocused(&mut self, window: Window);

    /// Remove all knowledge of `window` (it is no longer managed)
    fn forget(&mut self, window: Window);
}

/// Focus stack
#[derive(Debug)]
pub struct FocusStack {
    /// Currently focused window
    current: Option<Window>,

    /// Focus history, most recent first
    history: VecDeque<Window>,

    /// Maximum history size
    max_history: usize,
}

impl FocusStack {
    pub fn new(max_history: usize) -> Self {
        Self {
            current: None,
            history: VecDeque::new(),
            max_history: max_history.max(1),
        }
    }

    #[cfg(test)]
    pub(crate) fn history(&self) -> &VecDeque<Window> {
        &self.history
    }
}

impl Default for FocusStack {
    fn default() -> Self {
        Self::new(20)
    }
}

impl FocusTracker for FocusStack {
    fn current(&self) -> Option<Window> {
        self.current
    }

    fn fallback(&mut self) -> Option<Window> {
        if let Some(old) = self.current.take() {
            self.history.retain(|&w| w != old);
        }
        self.current = self.history.front().copied();
        debug!("Focus fallback -> {:?}", self.current);
        self.current
    }

    fn focused(&mut self, window: Window) {
        self.history.retain(|&w| w != window);
        self.history.push_front(window);
        self.history.truncate(self.max_history);
        self.current = Some(window);
    }

    fn unfocused(&mut self, window: Window) {
        if self.current == Some(window) {
            self.current = None;
        }
    }

    fn forget(&mut self, window: Window) {
        self.history.retain(|&w| w != window);
        if self.current == Some(window) {
            self.current = None;
        }
    }
}

impl Client {
    pub fn on_focus_in(&mut self, ctx: &mut Context<'_>, event: &FocusInEvent) -> Result<EventResult> {
        if should_ignore_focus(event.mode, event.detail) {
            trace!(
                "Ignoring FocusIn on window {} ({} / {})",
                self.id,
                mode_name(event.mode),
                detail_name(event.detail)
            );
            return Ok(EventResult::Ignore);
        }

        self.mark_focused(ctx);
        Ok(EventResult::Handled)
    }

    pub fn on_focus_out(&mut self, ctx: &mut Context<'_>, event: &FocusOutEvent) -> Result<EventResult> {
        if should_ignore_focus(event.mode, event.detail) {
            trace!(
                "Ignoring FocusOut on window {} ({} / {})",
                self.id,
                mode_name(event.mode),
                detail_name(event.detail)
            );
            return Ok(EventResult::Ignore);
        }

        self.mark_unfocused(ctx);
        Ok(EventResult::Handled)
    }

    pub fn mark_focused(&mut self, ctx: &mut Context<'_>) {
        debug!("Window {} focused", self.id);
        self.flags.insert(ClientFlags::FOCUSED);
        ctx.focus.focused(self.id);
    }

    pub fn mark_unfocused(&mut self, ctx: &mut Context<'_>) {
        debug!("Window {} unfocused", self.id);
        self.flags.remove(ClientFlags::FOCUSED);
        ctx.focus.unfocused(self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wm::testing::{FakeConn, FakeFocus, FocusCall, client};
    use std::collections::HashMap;
    use x11rb::protocol::xproto::{NotifyDetail, NotifyMode};

    fn focus_event(mode: NotifyMode, detail: NotifyDetail) -> FocusInEvent {
        FocusInEvent {
            event: 110,
            mode,
            detail,
            ..Default::default()
        }
    }

    #[test]
    fn test_stack_fallback_skips_current() {
        let mut stack = FocusStack::new(10);
        stack.focused(1);
        stack.focused(2);
        stack.focused(3);

        assert_eq!(stack.fallback(), Some(2));
        assert_eq!(stack.current(), Some(2));
        assert_eq!(stack.history().iter().copied().collect::<Vec<_>>(), vec![2, 1]);
    }

    #[test]
    fn test_stack_fallback_empty() {
        let mut stack = FocusStack::default();
        stack.focused(1);
        assert_eq!(stack.fallback(), None);
        assert_eq!(stack.current(), None);
    }

    #[test]
    fn test_stack_history_limit() {
        let mut stack = FocusStack::new(2);
        for w in 1..=5 {
            stack.focused(w);
        }
        assert_eq!(stack.history().len(), 2);
        assert_eq!(stack.history().front(), Some(&5));
    }

    #[test]
    fn test_stack_forget() {
        let mut stack = FocusStack::default();
        stack.focused(1);
        stack.focused(2);
        stack.forget(2);
        assert_eq!(stack.current(), None);
        assert_eq!(stack.history().iter().copied().collect::<Vec<_>>(), vec![1]);

        stack.unfocused(1);
        assert_eq!(stack.current(), None);
    }

    #[test]
    fn test_focus_in_marks_focused() {
        let conn = FakeConn::default();
        let registry: HashMap<Window, Client> = HashMap::new();
        let mut focus = FakeFocus::default();
        let mut c = client(10, 110);

        let mut ctx = Context {
            conn: &conn,
            registry: &registry,
            focus: &mut focus,
        };
        let result = c
            .on_focus_in(&mut ctx, &focus_event(NotifyMode::NORMAL, NotifyDetail::NONLINEAR_VIRTUAL))
            .unwrap();

        assert_eq!(result, EventResult::Handled);
        assert!(c.flags.contains(ClientFlags::FOCUSED));
        assert_eq!(focus.calls, vec![FocusCall::Focused(10)]);
        assert!(conn.calls().is_empty());
    }

    #[test]
    fn test_focus_in_grab_is_ignored() {
        let conn = FakeConn::default();
        let registry: HashMap<Window, Client> = HashMap::new();
        let mut focus = FakeFocus::default();
        let mut c = client(10, 110);

        let mut ctx = Context {
            conn: &conn,
            registry: &registry,
            focus: &mut focus,
        };
        let result = c
            .on_focus_in(&mut ctx, &focus_event(NotifyMode::GRAB, NotifyDetail::VIRTUAL))
            .unwrap();

        assert_eq!(result, EventResult::Ignore);
        assert!(!c.flags.contains(ClientFlags::FOCUSED));
        assert!(focus.calls.is_empty());
    }

    #[test]
    fn test_focus_out_marks_unfocused() {
        let conn = FakeConn::default();
        let registry: HashMap<Window, Client> = HashMap::new();
        let mut focus = FakeFocus::default();
        let mut c = client(10, 110);
        c.flags.insert(ClientFlags::FOCUSED);

        let mut ctx = Context {
            conn: &conn,
            registry: &registry,
            focus: &mut focus,
        };

        let ignored = c
            .on_focus_out(&mut ctx, &focus_event(NotifyMode::NORMAL, NotifyDetail::INFERIOR))
            .unwrap();
        assert_eq!(ignored, EventResult::Ignore);
        assert!(c.flags.contains(ClientFlags::FOCUSED));

        let handled = c
            .on_focus_out(&mut ctx, &focus_event(NotifyMode::WHILE_GRABBED, NotifyDetail::VIRTUAL))
            .unwrap();
        assert_eq!(handled, EventResult::Handled);
        assert!(!c.flags.contains(ClientFlags::FOCUSED));
        assert_eq!(focus.calls, vec![FocusCall::Unfocused(10)]);
    }
}
