//! Error types for connection handling

use thiserror::Error;

use super::ConnectionId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConnectionError {
    #[error("protocol for connection {id} handles neither on_data nor on_message")]
    NoDataHandler { id: ConnectionId },

    #[error("connection {id} is closed")]
    Closed { id: ConnectionId },
}
