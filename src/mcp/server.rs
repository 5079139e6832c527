//! MCP server lifecycle.
//!
//! The server binds a [`Dispatcher`] to one transport connection:
//!
//! 1. **Idle**: constructed, no transport bound, requests are rejected
//! 2. **Connected**: a transport is bound and requests are dispatched
//! 3. **Closed**: terminal; the transport has been released
//!
//! The state lives in an `AtomicU8` and only changes through
//! compare-and-set transitions, so a racing `connect` loses cleanly against
//! a `close` instead of leaving a half-bound server.

use std::io;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use tokio::sync::{Mutex, Notify};
use tracing::{debug, error, info, warn};

use crate::error::LifecycleError;
use crate::mcp::dispatcher::Dispatcher;
use crate::mcp::protocol::JsonRpcError;
use crate::mcp::transport::Transport;

/// Connection state of the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ConnectionState {
    /// Constructed, not yet connected.
    Idle = 0,
    /// Bound to a transport, accepting requests.
    Connected = 1,
    /// Shut down; terminal.
    Closed = 2,
}

impl ConnectionState {
    const fn from_u8(v: u8) -> Self {
        match v {
            0 => Self::Idle,
            1 => Self::Connected,
            _ => Self::Closed,
        }
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Connected => write!(f, "connected"),
            Self::Closed => write!(f, "closed"),
        }
    }
}

/// What ended the serve loop.
enum Event {
    Line(io::Result<Option<Vec<u8>>>),
    CloseRequested,
    Signal(&'static str),
}

/// OS shutdown signals watched while serving.
enum ShutdownSignals {
    #[cfg(unix)]
    Unix {
        sigint: tokio::signal::unix::Signal,
        sigterm: tokio::signal::unix::Signal,
    },
    #[cfg(windows)]
    CtrlC,
    Ignored,
}

impl ShutdownSignals {
    #[cfg(unix)]
    fn install() -> io::Result<Self> {
        use tokio::signal::unix::{signal, SignalKind};

        Ok(Self::Unix {
            sigint: signal(SignalKind::interrupt())?,
            sigterm: signal(SignalKind::terminate())?,
        })
    }

    #[cfg(windows)]
    #[allow(clippy::unnecessary_wraps)] // matches the unix signature
    fn install() -> io::Result<Self> {
        Ok(Self::CtrlC)
    }

    async fn recv(&mut self) -> &'static str {
        match self {
            #[cfg(unix)]
            Self::Unix { sigint, sigterm } => {
                tokio::select! {
                    _ = sigint.recv() => "SIGINT",
                    _ = sigterm.recv() => "SIGTERM",
                }
            }
            #[cfg(windows)]
            Self::CtrlC => {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    warn!(error = %e, "Failed to listen for Ctrl+C, signal shutdown disabled");
                    std::future::pending::<()>().await;
                }
                "Ctrl+C"
            }
            Self::Ignored => std::future::pending().await,
        }
    }
}

/// The MCP server: a dispatcher plus the connection it serves.
pub struct McpServer {
    /// Request routing, shared read-only.
    dispatcher: Arc<Dispatcher>,
    /// Current [`ConnectionState`] as `u8`.
    state: AtomicU8,
    /// The bound transport while connected.
    transport: Mutex<Option<Box<dyn Transport>>>,
    /// Wakes the serve loop when `close` is called.
    shutdown: Notify,
}

impl McpServer {
    /// Creates an idle server.
    #[must_use]
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self {
            dispatcher: Arc::new(dispatcher),
            state: AtomicU8::new(ConnectionState::Idle as u8),
            transport: Mutex::new(None),
            shutdown: Notify::new(),
        }
    }

    /// The dispatcher requests are routed through.
    #[must_use]
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Returns the current connection state.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        ConnectionState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Whether requests are currently accepted.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    /// Binds a transport, moving the server from idle to connected.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::AlreadyConnected`] unless the server is idle.
    pub async fn connect<T>(&self, transport: T) -> Result<(), LifecycleError>
    where
        T: Transport + 'static,
    {
        // Held across the transition so close() cannot slip in before the
        // transport is stored.
        let mut slot = self.transport.lock().await;

        self.state
            .compare_exchange(
                ConnectionState::Idle as u8,
                ConnectionState::Connected as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .map_err(|_| LifecycleError::AlreadyConnected)?;

        *slot = Some(Box::new(transport));
        info!("Transport connected");
        Ok(())
    }

    /// Closes the server and releases the transport.
    ///
    /// Closing an already closed server does nothing.
    pub async fn close(&self) {
        let previous =
            ConnectionState::from_u8(self.state.swap(ConnectionState::Closed as u8, Ordering::AcqRel));
        if previous == ConnectionState::Closed {
            return;
        }

        self.shutdown.notify_one();
        let released = self.transport.lock().await.take();
        info!(from = %previous, transport_released = released.is_some(), "Server closed");
    }

    /// Dispatches one raw request.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::NotConnected`] unless the server is connected;
    /// the request is not dispatched in that case.
    pub async fn dispatch(&self, raw: &str) -> Result<String, LifecycleError> {
        if !self.is_connected() {
            debug!(state = %self.state(), "Rejected request while not connected");
            return Err(LifecycleError::NotConnected);
        }
        Ok(self.dispatcher.dispatch(raw).await)
    }

    /// Serves the bound transport until it reaches EOF or `close` is called.
    ///
    /// The server is closed when this returns, unless no transport was bound,
    /// in which case the state is left untouched.
    ///
    /// # Errors
    ///
    /// Returns an error if the server is not connected or transport I/O fails.
    pub async fn serve(&self) -> io::Result<()> {
        self.serve_with(ShutdownSignals::Ignored).await
    }

    /// Like [`Self::serve`], but also shuts down gracefully on SIGINT/SIGTERM
    /// (Ctrl+C on Windows).
    ///
    /// # Errors
    ///
    /// Returns an error if the server is not connected, signal handlers cannot
    /// be installed, or transport I/O fails.
    pub async fn run(&self) -> io::Result<()> {
        self.serve_with(ShutdownSignals::install()?).await
    }

    async fn serve_with(&self, mut signals: ShutdownSignals) -> io::Result<()> {
        let mut slot = self.transport.lock().await;
        let Some(transport) = slot.as_mut() else {
            return Err(io::Error::new(
                io::ErrorKind::NotConnected,
                LifecycleError::NotConnected,
            ));
        };

        let result = self.serve_loop(transport.as_mut(), &mut signals).await;
        drop(slot);

        if let Err(e) = &result {
            error!(error = %e, "Transport failure");
        }
        self.close().await;
        result
    }

    async fn serve_loop(
        &self,
        transport: &mut dyn Transport,
        signals: &mut ShutdownSignals,
    ) -> io::Result<()> {
        while self.is_connected() {
            let event = tokio::select! {
                () = self.shutdown.notified() => Event::CloseRequested,
                name = signals.recv() => Event::Signal(name),
                line = transport.read_message() => Event::Line(line),
            };

            let line = match event {
                Event::CloseRequested => {
                    debug!("Close requested, leaving serve loop");
                    return Ok(());
                }
                Event::Signal(name) => {
                    info!(signal = name, "Received shutdown signal, initiating graceful shutdown");
                    return Ok(());
                }
                Event::Line(line) => line?,
            };

            let Some(bytes) = line else {
                info!("Client closed the connection");
                return Ok(());
            };

            let line = match String::from_utf8(bytes) {
                Ok(line) => line,
                Err(e) => {
                    warn!(error = %e, "Received a message that is not valid UTF-8");
                    let body = serde_json::to_string(&JsonRpcError::parse_error())?;
                    transport.write_message(&body).await?;
                    continue;
                }
            };

            if line.trim().is_empty() {
                continue;
            }

            if let Some(response) = self.dispatcher.dispatch_line(&line).await {
                transport.write_message(&response).await?;
            }
        }

        Ok(())
    }
}

impl std::fmt::Debug for McpServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("McpServer")
            .field("state", &self.state())
            .field("dispatcher", &self.dispatcher)
            .finish_non_exhaustive()
    }
}
