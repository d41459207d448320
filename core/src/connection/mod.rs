//! Connection protocol capabilities and idle timeouts
//!
//! - **Protocol / Capabilities**: callback contract for one connection,
//!   resolved once into a flag set
//! - **Connection**: routes reactor events through the resolved capabilities
//! - **IdleTimeouts**: per-connection idle watchdog on a timer registry

mod error;
mod idle;
mod protocol;

pub use error::ConnectionError;
pub use idle::{IdleCallback, IdleTimeouts};
pub use protocol::{Capabilities, Connection, PingAction, Protocol};

/// Reactor-assigned connection identifier
pub type ConnectionId = u64;
