//! Endpoint-level error taxonomy.
use std::io;

use thiserror::Error;

/// An error occuring in the connection endpoint.
#[derive(Error, Debug)]
pub enum Error {
    /// An I/O error from the underlying socket.
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),

    /// A frame or packet violated the protocol and the connection was
    /// terminated. This always indicates a server bug or corrupted framing,
    /// never a transient condition.
    #[error("protocol violation: {0}")]
    Protocol(String),

    /// `connect()` was called while not `Disconnected`.
    #[error("endpoint is already connecting or connected")]
    AlreadyConnecting,

    /// An application-level write was attempted while the endpoint was not
    /// `Ready`.
    #[error("endpoint is not ready")]
    NotReady,

    /// Host resolution failed.
    #[error("could not resolve host: {0}")]
    Resolve(String),
}
