//! Where an endpoint connects to.
use std::fmt;

use crate::transport::Transport;

/// Default Gearman job server port, used when `host:port` omits the port.
pub const DEFAULT_PORT: u16 = 7003;

/// How an endpoint obtains its underlying transport.
pub enum HostSpec {
    /// A textual `host:port` address, resolved and dialed on `connect()`.
    Address(String),
    /// An already-connected channel, consumed on the first `connect()`.
    /// Useful for tests and for socket-pair-based in-process plumbing.
    Channel(Box<dyn Transport>),
    /// A factory invoked on every `connect()` attempt (including
    /// reconnects), yielding a fresh in-process channel each time.
    Factory(Box<dyn Fn() -> std::io::Result<Box<dyn Transport>> + Send>),
}

impl fmt::Debug for HostSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Address(addr) => write!(f, "Address({addr})"),
            Self::Channel(_) => write!(f, "Channel(..)"),
            Self::Factory(_) => write!(f, "Factory(..)"),
        }
    }
}

impl HostSpec {
    /// Human-readable form used by [`crate::endpoint::Endpoint::as_string`].
    pub fn display(&self) -> String {
        match self {
            Self::Address(addr) => addr.clone(),
            Self::Channel(_) => "<channel>".to_string(),
            Self::Factory(_) => "<factory>".to_string(),
        }
    }
}

impl From<&str> for HostSpec {
    fn from(s: &str) -> Self {
        Self::Address(s.to_string())
    }
}

impl From<String> for HostSpec {
    fn from(s: String) -> Self {
        Self::Address(s)
    }
}

/// Split a `host:port` spec into its parts, defaulting the port to
/// [`DEFAULT_PORT`] when omitted.
pub fn split_hostport(spec: &str) -> (&str, u16) {
    match spec.rsplit_once(':') {
        Some((host, port)) => match port.parse::<u16>() {
            Ok(port) => (host, port),
            Err(_) => (spec, DEFAULT_PORT),
        },
        None => (spec, DEFAULT_PORT),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_explicit_port() {
        assert_eq!(split_hostport("job.example.com:4730"), ("job.example.com", 4730));
    }

    #[test]
    fn defaults_port_when_missing() {
        assert_eq!(split_hostport("job.example.com"), ("job.example.com", DEFAULT_PORT));
    }
}
