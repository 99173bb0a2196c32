//! Registry of managed clients

use std::collections::HashMap;

use x11rb::protocol::xproto::Window;

use crate::wm::client::Client;

/// Lookup of managed clients by window ID
pub trait Registry {
    fn find_managed_client(&self, window: Window) -> Option<&Client>;
}

impl Registry for HashMap<Window, Client> {
    fn find_managed_client(&self, window: Window) -> Option<&Client> {
        self.get(&window).filter(|client| client.is_managed())
    }
}

/// All managed clients, indexed by client window and by frame window
#[derive(Debug, Default)]
pub struct Clients {
    clients: HashMap<Window, Client>,
    frames: HashMap<Window, Window>,
}

impl Clients {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, client: Client) {
        self.frames.insert(client.frame.id, client.id);
        self.clients.insert(client.id, client);
    }

    /// Temporarily take a client out for dispatch; pair with [`Clients::restore`]
    pub fn take(&mut self, window: Window) -> Option<Client> {
        self.clients.remove(&window)
    }

    pub fn restore(&mut self, client: Client) {
        self.clients.insert(client.id, client);
    }

    /// Forget a client entirely, clearing every transient-for link to it
    pub fn remove(&mut self, window: Window) -> Option<Client> {
        let removed = self.clients.remove(&window);
        self.frames.retain(|_, client| *client != window);
        for client in self.clients.values_mut() {
            client.forget_transient_for(window);
        }
        removed
    }

    pub fn client_for_frame(&self, frame: Window) -> Option<Window> {
        self.frames.get(&frame).copied()
    }

    pub fn contains(&self, window: Window) -> bool {
        self.clients.contains_key(&window)
    }

    pub fn get(&self, window: Window) -> Option<&Client> {
        self.clients.get(&window)
    }

    /// Managed client windows, oldest ID first
    pub fn windows(&self) -> Vec<Window> {
        let mut windows: Vec<Window> = self.clients.keys().copied().collect();
        windows.sort_unstable();
        windows
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }
}

impl Registry for Clients {
    fn find_managed_client(&self, window: Window) -> Option<&Client> {
        self.clients.find_managed_client(window)
    }
}
