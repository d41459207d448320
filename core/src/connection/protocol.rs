//! Per-connection protocol callbacks
//!
//! A protocol object is in control of one connection. Optional callbacks are
//! declared up front through `capabilities()` and resolved once when the
//! `Connection` is built, so the reactor never probes for them per call.
//!
//! All callbacks run on the reactor thread and must not block.

use bitflags::bitflags;
use tracing::debug;

use super::ConnectionId;
use super::error::ConnectionError;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Capabilities: u8 {
        /// Initialization after the connection is accepted
        const ON_OPEN = 1;

        /// Raw readiness: data available but not read yet (edge triggered)
        const ON_DATA = 1 << 1;

        /// Buffered delivery of data that was already read
        const ON_MESSAGE = 1 << 2;

        /// Custom idle-timeout handling
        const PING = 1 << 3;

        /// Server shutdown with the connection still open
        const ON_SHUTDOWN = 1 << 4;

        /// Cleanup after close
        const ON_CLOSE = 1 << 5;
    }
}

impl Capabilities {
    pub fn handles_data(&self) -> bool {
        self.intersects(Capabilities::ON_DATA | Capabilities::ON_MESSAGE)
    }
}

/// What to do with a connection whose idle timeout elapsed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PingAction {
    KeepAlive,
    Close,
}

pub trait Protocol: Send {
    /// Callbacks this protocol implements. Must include `ON_DATA` or
    /// `ON_MESSAGE`.
    fn capabilities(&self) -> Capabilities;

    fn on_open(&mut self) {}

    fn on_data(&mut self) {}

    /// `buffer` is only valid for the duration of the call
    fn on_message(&mut self, _buffer: &[u8]) {}

    fn ping(&mut self) -> PingAction {
        PingAction::Close
    }

    fn on_shutdown(&mut self) {}

    fn on_close(&mut self) {}
}

/// A protocol bound to a connection, with its capabilities resolved
pub struct Connection {
    id: ConnectionId,
    protocol: Box<dyn Protocol>,
    capabilities: Capabilities,
    /// A deferred protocol task is running; default ping keeps the connection
    busy: bool,
    closed: bool,
}

impl Connection {
    pub fn new(id: ConnectionId, protocol: Box<dyn Protocol>) -> Result<Self, ConnectionError> {
        let capabilities = protocol.capabilities();
        if !capabilities.handles_data() {
            return Err(ConnectionError::NoDataHandler { id });
        }

        Ok(Self {
            id,
            protocol,
            capabilities,
            busy: false,
            closed: false,
        })
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn set_busy(&mut self, busy: bool) {
        self.busy = busy;
    }

    pub fn open(&mut self) -> Result<(), ConnectionError> {
        self.ensure_open()?;
        if self.capabilities.contains(Capabilities::ON_OPEN) {
            self.protocol.on_open();
        }
        Ok(())
    }

    /// Deliver incoming data. A protocol that reads for itself (`on_data`)
    /// takes precedence over buffered delivery.
    pub fn receive(&mut self, buffer: &[u8]) -> Result<(), ConnectionError> {
        self.ensure_open()?;
        if self.capabilities.contains(Capabilities::ON_DATA) {
            self.protocol.on_data();
        } else {
            self.protocol.on_message(buffer);
        }
        Ok(())
    }

    /// Idle timeout elapsed.
    ///
    /// Without a custom `ping`, the connection is closed unless a protocol
    /// task is still busy.
    pub fn ping(&mut self) -> Result<PingAction, ConnectionError> {
        self.ensure_open()?;
        let action = if self.capabilities.contains(Capabilities::PING) {
            self.protocol.ping()
        } else if self.busy {
            PingAction::KeepAlive
        } else {
            PingAction::Close
        };
        debug!(connection_id = self.id, ?action, "Connection ping");
        Ok(action)
    }

    pub fn shutdown(&mut self) -> Result<(), ConnectionError> {
        self.ensure_open()?;
        if self.capabilities.contains(Capabilities::ON_SHUTDOWN) {
            self.protocol.on_shutdown();
        }
        Ok(())
    }

    /// Close the connection. Idempotent; `on_close` runs at most once.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        if self.capabilities.contains(Capabilities::ON_CLOSE) {
            self.protocol.on_close();
        }
    }

    fn ensure_open(&self) -> Result<(), ConnectionError> {
        if self.closed {
            Err(ConnectionError::Closed { id: self.id })
        } else {
            Ok(())
        }
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("capabilities", &self.capabilities)
            .field("busy", &self.busy)
            .field("closed", &self.closed)
            .finish()
    }
}
