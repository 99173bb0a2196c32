//! X11 Async Event Stream
//!
//! A mio poller on a blocking tokio thread watches the X11 socket and wakes
//! the event loop through a [`Notify`]; events are then drained without
//! blocking.

use std::os::unix::io::AsRawFd;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::{Notify, oneshot};
use x11rb::connection::Connection;
use x11rb::protocol::Event;
use x11rb::rust_connection::RustConnection;

const X11_TOKEN: mio::Token = mio::Token(0);

/// Readiness-driven X11 event source
pub struct X11EventStream {
    conn: Arc<RustConnection>,
    readable: Arc<Notify>,
    /// Dropping this stops the polling thread
    _stop: oneshot::Receiver<()>,
}

impl X11EventStream {
    pub fn new(conn: Arc<RustConnection>) -> Result<Self> {
        let fd = conn.stream().as_raw_fd();
        let readable = Arc::new(Notify::new());
        let waker = readable.clone();

        let mut poll = mio::Poll::new().context("Failed to create mio Poll")?;
        poll.registry()
            .register(&mut mio::unix::SourceFd(&fd), X11_TOKEN, mio::Interest::READABLE)
            .context("Failed to register X11 socket with mio")?;

        let (stop_tx, stop_rx) = oneshot::channel::<()>();
        tokio::task::spawn_blocking(move || {
            let mut events = mio::Events::with_capacity(1);
            while !stop_tx.is_closed() {
                if let Err(err) = poll.poll(&mut events, Some(Duration::from_millis(100))) {
                    tracing::warn!("X11 socket poll failed: {:?}", err);
                    continue;
                }
                if events.iter().any(|event| event.token() == X11_TOKEN) {
                    waker.notify_one();
                }
            }
            tracing::debug!("X11 socket polling thread stopped");
        });

        Ok(Self {
            conn,
            readable,
            _stop: stop_rx,
        })
    }

    /// Wait until the socket has data
    pub async fn wait_readable(&self) {
        self.readable.notified().await;
    }

    /// Take every event already queued on the connection
    pub fn drain(&self) -> Result<Vec<Event>> {
        let mut batch = Vec::new();
        while let Some(event) = self
            .conn
            .poll_for_event()
            .context("Failed to poll for X11 events")?
        {
            batch.push(event);
        }
        Ok(batch)
    }

    pub fn flush(&self) -> Result<()> {
        self.conn.flush().context("Failed to flush X11 requests")?;
        Ok(())
    }
}
