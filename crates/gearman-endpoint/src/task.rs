//! The task collaborator contract, external to this crate's scope.
//!
//! A `Task` is the higher-level value-object representing one submitted unit
//! of work. The endpoint never owns a task strongly while it has no
//! server-assigned handle: it holds a [`Weak`] reference so an abandoned task
//! can be reclaimed even if the server is slow to reply (see
//! [`crate::endpoint::Endpoint::add_task`]).
use std::fmt;
use std::sync::{Arc, Weak};

/// Opaque server-assigned job handle.
pub type Handle = String;

/// Notifications a submitted task can receive over its lifetime.
pub trait Task: fmt::Debug + Send + Sync {
    /// The bytes of the `submit_…` packet identifying this task's work. The
    /// endpoint writes this verbatim; it does not interpret it.
    fn submit_packet_bytes(&self) -> Vec<u8>;

    /// The job finished successfully.
    fn complete(&self, payload: &[u8]);

    /// The job failed.
    fn fail(&self);

    /// A progress update. May be delivered any number of times, including
    /// zero, before a terminal notification.
    fn status(&self, numerator: u64, denominator: u64);

    /// The worker raised an application-level exception. A terminal
    /// `complete` or `fail` notification still follows.
    fn exception(&self, payload: &[u8]);
}

/// Identity key for a task, stable across `Arc` clones, usable to correlate
/// `task2handle` without requiring `Task: Hash + Eq`.
pub fn task_key(task: &Arc<dyn Task>) -> usize {
    Arc::as_ptr(task) as *const () as usize
}

/// A weak reference held by `need_handle` while a task awaits its
/// `job_created` reply.
pub type WeakTask = Weak<dyn Task>;

#[cfg(any(test, feature = "mocks"))]
mockall::mock! {
    pub TaskDouble {}

    impl fmt::Debug for TaskDouble {
        fn fmt<'a>(&self, f: &mut fmt::Formatter<'a>) -> fmt::Result;
    }

    impl Task for TaskDouble {
        fn submit_packet_bytes(&self) -> Vec<u8>;
        fn complete(&self, payload: &[u8]);
        fn fail(&self);
        fn status(&self, numerator: u64, denominator: u64);
        fn exception(&self, payload: &[u8]);
    }
}
