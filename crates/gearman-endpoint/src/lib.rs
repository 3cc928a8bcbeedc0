//! An asynchronous connection endpoint for a Gearman-style job-dispatch
//! client: one non-blocking TCP (or in-process) link to a job server, driven
//! entirely by an externally owned I/O reactor.
//!
//! The crate models the connection as a small state machine
//! ([`endpoint::State`]) plus a handful of trackers layered on top of it:
//! outstanding task submissions, option negotiation, and — when the endpoint
//! is also acting as a worker — dispatch of assigned jobs to registered
//! function handlers. See [`Endpoint`] for the full operation surface.
//!
//! This crate deliberately does not ship a reactor of its own: building one
//! means choosing an I/O multiplexing strategy (`poll`, `epoll`, io_uring,
//! an async runtime) on behalf of every caller, which is a decision for the
//! pool that owns many endpoints, not for a single connection's state
//! machine. Integrate by registering [`Endpoint::raw_fd`] for the interest
//! reported by [`Endpoint::interest`], and calling [`Endpoint::on_readable`],
//! [`Endpoint::on_writable`], and [`Endpoint::tick`] in response.
pub mod endpoint;
mod error;
mod hostspec;
mod task;
mod time;
mod transport;
mod wire;
mod worker;

pub use endpoint::{ConnectObserver, Endpoint, Interest, State};
pub use error::Error;
pub use hostspec::{HostSpec, DEFAULT_PORT};
pub use task::{task_key, Handle, Task, WeakTask};
pub use time::LocalTime;
pub use transport::Transport;
pub use worker::{Job, WorkerHandler};
