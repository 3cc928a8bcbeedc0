//! Worker mode: dispatches `job_assign` to registered function handlers.
use crate::endpoint::Endpoint;
use crate::task::Handle;

/// A unit of work handed to a registered function by the server.
///
/// Borrows the endpoint for the duration of the handler call so `status`,
/// `complete`, `fail` and `exception` can write their reply packets directly;
/// the handler must not retain the job past its own return.
pub struct Job<'a> {
    function: String,
    payload: Vec<u8>,
    handle: Handle,
    endpoint: &'a mut Endpoint,
}

impl<'a> Job<'a> {
    pub(crate) fn new(
        function: String,
        payload: Vec<u8>,
        handle: Handle,
        endpoint: &'a mut Endpoint,
    ) -> Self {
        Self {
            function,
            payload,
            handle,
            endpoint,
        }
    }

    pub fn function(&self) -> &str {
        &self.function
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn handle(&self) -> &str {
        &self.handle
    }

    /// Report progress. May be called any number of times.
    pub fn status(&mut self, numerator: u64, denominator: u64) {
        self.endpoint
            .send_work_status(&self.handle, numerator, denominator);
    }

    /// Report success with a result payload.
    pub fn complete(&mut self, result: &[u8]) {
        self.endpoint.send_work_complete(&self.handle, result);
    }

    /// Report failure.
    pub fn fail(&mut self) {
        self.endpoint.send_work_fail(&self.handle);
    }
}

/// A function registered with [`Endpoint::register_function`].
pub trait WorkerHandler: Send + Sync {
    fn handle(&self, job: &mut Job);
}

impl<F> WorkerHandler for F
where
    F: Fn(&mut Job) + Send + Sync,
{
    fn handle(&self, job: &mut Job) {
        self(job)
    }
}
