//! The connection endpoint: the asynchronous client↔server TCP link.
//!
//! This is the core of the crate. A single
//! [`Endpoint`] owns one connection to one job server and multiplexes
//! outbound task submissions and inbound worker job assignments over it. It
//! never blocks: every public method runs to completion synchronously, and
//! readiness notifications are pushed in by whatever I/O reactor the caller
//! is using (registering [`Endpoint::raw_fd`] for the interest reported by
//! [`Endpoint::interest`], then calling [`Endpoint::on_readable`] /
//! [`Endpoint::on_writable`] / [`Endpoint::tick`] as appropriate). Driving
//! that reactor loop itself is outside this crate's scope.
use std::collections::{HashMap, VecDeque};
use std::io::{self, Read, Write};
use std::net::{SocketAddr, ToSocketAddrs};
use std::os::unix::io::{AsRawFd, RawFd};
use std::sync::{Arc, Weak};
use std::time::Duration;

use tracing::{debug, trace, warn};

use crate::error::Error;
use crate::hostspec::{split_hostport, HostSpec};
use crate::task::{task_key, Handle, Task};
use crate::time::LocalTime;
use crate::transport::Transport;
use crate::wire::command::join;
use crate::wire::{pack, Framer, Packet, PacketType, Verb};
use crate::worker::{Job, WorkerHandler};

/// Aggressive connect deadline: this is a client in a higher-level pool that
/// can try another endpoint, so fast failure beats slow correctness here.
const CONNECT_TIMEOUT: Duration = Duration::from_millis(250);
/// Fixed dead interval after any connection failure.
const DEAD_INTERVAL: Duration = Duration::from_secs(10);
/// Read buffer size for a single `on_readable` call. `poll`-style readiness is
/// level-triggered, so there's no benefit to looping reads here: the reactor
/// will simply call us again if more data remains.
const READ_BUFFER_SIZE: usize = 8 * 1024;

/// The endpoint's connection state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Disconnected,
    Connecting,
    Ready,
}

/// I/O interest the endpoint currently wants from the reactor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Interest {
    pub read: bool,
    pub write: bool,
}

/// Observes connect-timeout events, for test instrumentation. Replaces the
/// global mutable hook of the source implementation with an injected
/// collaborator scoped to one endpoint.
pub trait ConnectObserver: Send + Sync {
    fn connect_timed_out(&self, hostspec: &str);
}

struct Io {
    socket: Box<dyn Transport>,
    out: Vec<u8>,
}

/// Where the live transport for [`HostSpec`] comes from, normalized so a
/// one-shot injected channel can be taken exactly once.
enum Source {
    Address(String),
    Channel(Option<Box<dyn Transport>>),
    Factory(Box<dyn Fn() -> io::Result<Box<dyn Transport>> + Send>),
}

impl From<HostSpec> for Source {
    fn from(spec: HostSpec) -> Self {
        match spec {
            HostSpec::Address(addr) => Source::Address(addr),
            HostSpec::Channel(transport) => Source::Channel(Some(transport)),
            HostSpec::Factory(factory) => Source::Factory(factory),
        }
    }
}

impl Source {
    fn display(&self) -> String {
        match self {
            Source::Address(addr) => addr.clone(),
            Source::Channel(_) => "<channel>".to_string(),
            Source::Factory(_) => "<factory>".to_string(),
        }
    }
}

/// Why a connection is being torn down, which decides whether it counts as
/// a failure for `alive()`'s purposes.
enum DisconnectCause {
    Closed,
    ConnectFailure,
    ReadyFailure,
}

enum DialResult {
    /// A non-blocking connect was started; wait for write-readiness.
    Pending(Box<dyn Transport>),
    /// The transport is already connected.
    Ready(Box<dyn Transport>),
}

/// One logical client↔server connection to a Gearman-style job server.
pub struct Endpoint {
    source: Source,
    state: State,
    dead_until: Option<LocalTime>,
    connect_deadline: Option<LocalTime>,
    framer: Framer,
    on_ready: Vec<Box<dyn FnOnce() + Send>>,
    on_error: Vec<Box<dyn FnOnce() + Send>>,
    options: HashMap<String, bool>,
    requests: VecDeque<String>,
    need_handle: VecDeque<Weak<dyn Task>>,
    waiting: HashMap<Handle, VecDeque<Arc<dyn Task>>>,
    task2handle: HashMap<usize, Handle>,
    worker_funcs: HashMap<String, Arc<dyn WorkerHandler>>,
    is_worker: bool,
    io: Option<Io>,
    t_offline: bool,
    observer: Option<Arc<dyn ConnectObserver>>,
}

impl Endpoint {
    /// Create a new, `Disconnected` endpoint. `options` are the server-side
    /// per-connection features to negotiate on every `Ready` transition.
    pub fn new(
        hostspec: impl Into<HostSpec>,
        options: impl IntoIterator<Item = (String, bool)>,
    ) -> Self {
        Self {
            source: hostspec.into().into(),
            state: State::Disconnected,
            dead_until: None,
            connect_deadline: None,
            framer: Framer::new(),
            on_ready: Vec::new(),
            on_error: Vec::new(),
            options: options.into_iter().collect(),
            requests: VecDeque::new(),
            need_handle: VecDeque::new(),
            waiting: HashMap::new(),
            task2handle: HashMap::new(),
            worker_funcs: HashMap::new(),
            is_worker: false,
            io: None,
            t_offline: false,
            observer: None,
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn ConnectObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    // -- readiness gate ----------------------------------------------------

    /// Invoke `on_ready` once the endpoint reaches `Ready`, or `on_error` if
    /// the in-progress (or about-to-start) connect attempt fails first. If
    /// already `Ready`, `on_ready` runs synchronously.
    pub fn get_in_ready_state<R, E>(&mut self, on_ready: R, on_error: E)
    where
        R: FnOnce() + Send + 'static,
        E: FnOnce() + Send + 'static,
    {
        match self.state {
            State::Ready => on_ready(),
            State::Disconnected => {
                self.on_ready.push(Box::new(on_ready));
                self.on_error.push(Box::new(on_error));
                let _ = self.connect();
            }
            State::Connecting => {
                self.on_ready.push(Box::new(on_ready));
                self.on_error.push(Box::new(on_error));
            }
        }
    }

    // -- connection state machine -------------------------------------------

    /// Begin connecting. Only valid while `Disconnected`.
    pub fn connect(&mut self) -> Result<(), Error> {
        if self.state != State::Disconnected {
            return Err(Error::AlreadyConnecting);
        }
        self.state = State::Connecting;

        if self.t_offline {
            trace!(target: "gearman_endpoint", "{}: t_offline set, arming deadline without dialing", self.source.display());
            self.connect_deadline = Some(LocalTime::now().add(CONNECT_TIMEOUT));
            return Ok(());
        }

        match self.dial() {
            Ok(DialResult::Pending(transport)) => {
                trace!(target: "gearman_endpoint", "{}: dial pending, waiting for writability", self.source.display());
                self.io = Some(Io {
                    socket: transport,
                    out: Vec::new(),
                });
                self.connect_deadline = Some(LocalTime::now().add(CONNECT_TIMEOUT));
            }
            Ok(DialResult::Ready(transport)) => {
                self.io = Some(Io {
                    socket: transport,
                    out: Vec::new(),
                });
                self.enter_ready();
            }
            Err(err) => {
                debug!(target: "gearman_endpoint", "{}: connect error: {err}", self.source.display());
                self.enter_disconnected(LocalTime::now(), DisconnectCause::ConnectFailure);
            }
        }
        Ok(())
    }

    fn dial(&mut self) -> Result<DialResult, Error> {
        match &mut self.source {
            Source::Address(spec) => {
                let (host, port) = split_hostport(spec);
                let addr = resolve(host, port).map_err(|e| Error::Resolve(e.to_string()))?;
                let transport = dial_tcp(addr)?;
                Ok(DialResult::Pending(transport))
            }
            Source::Channel(slot) => {
                let transport = slot.take().ok_or_else(|| {
                    Error::Io(io::Error::new(
                        io::ErrorKind::NotConnected,
                        "channel already consumed",
                    ))
                })?;
                Ok(DialResult::Ready(transport))
            }
            Source::Factory(factory) => {
                let transport = factory()?;
                Ok(DialResult::Ready(transport))
            }
        }
    }

    /// Explicitly tear down the connection, re-failing any in-flight work.
    /// Idempotent while already `Disconnected`. A caller-initiated close is
    /// not a failure, so it never marks the endpoint dead.
    pub fn close(&mut self, reason: impl Into<String>) {
        if self.state == State::Disconnected {
            return;
        }
        debug!(target: "gearman_endpoint", "{}: closing: {}", self.source.display(), reason.into());
        self.enter_disconnected(LocalTime::now(), DisconnectCause::Closed);
    }

    fn enter_ready(&mut self) {
        debug!(target: "gearman_endpoint", "{}: connected", self.source.display());
        self.state = State::Ready;
        self.connect_deadline = None;
        self.renegotiate_options();

        if self.is_worker {
            let names: Vec<String> = self.worker_funcs.keys().cloned().collect();
            for name in names {
                let bytes = pack(Verb::CanDo, name.as_bytes());
                self.write_bytes(&bytes);
            }
            self.send_grab_job();
        }

        let callbacks = std::mem::take(&mut self.on_ready);
        self.on_error.clear();
        for cb in callbacks {
            cb();
        }
    }

    /// Tear down the live connection (if any) and fail any in-flight work.
    /// `cause` decides whether this counts against `alive()`: a caller-driven
    /// `close()` never does, a failed connect attempt always does, and a
    /// failure on an already-`Ready` connection only does when work was
    /// actually outstanding at the time.
    fn enter_disconnected(&mut self, now: LocalTime, cause: DisconnectCause) {
        if let Some(io) = self.io.take() {
            shutdown_quietly(io.socket.as_raw_fd());
        }
        self.connect_deadline = None;

        let mark_dead = match cause {
            DisconnectCause::Closed => false,
            DisconnectCause::ConnectFailure => true,
            DisconnectCause::ReadyFailure => self.stuff_outstanding() > 0,
        };
        if mark_dead {
            self.dead_until = Some(now.add(DEAD_INTERVAL));
        }

        self.requeue_all();
        self.requests.clear();

        let callbacks = std::mem::take(&mut self.on_error);
        self.on_ready.clear();
        self.state = State::Disconnected;
        for cb in callbacks {
            cb();
        }
    }

    /// Snapshot in-flight work and fail it, resetting the trackers
    /// *before* notifying so a task's own fail handler can reentrantly
    /// resubmit without observing stale state.
    fn requeue_all(&mut self) {
        let need_handle = std::mem::take(&mut self.need_handle);
        let waiting = std::mem::take(&mut self.waiting);
        self.task2handle.clear();

        for weak in need_handle {
            if let Some(task) = weak.upgrade() {
                task.fail();
            }
        }
        for (_, tasks) in waiting {
            for task in tasks {
                task.fail();
            }
        }
    }

    /// Called periodically by the owning reactor to expire the connect
    /// deadline. Cheap to call more often than needed.
    pub fn tick(&mut self, now: LocalTime) {
        if self.state != State::Connecting {
            return;
        }
        let Some(deadline) = self.connect_deadline else {
            return;
        };
        if deadline.has_passed(now) {
            if let Some(observer) = &self.observer {
                observer.connect_timed_out(&self.source.display());
            }
            warn!(target: "gearman_endpoint", "{}: connect timed out", self.source.display());
            self.enter_disconnected(now, DisconnectCause::ConnectFailure);
        }
    }

    // -- reactor-facing I/O surface ---------------------------------------

    pub fn raw_fd(&self) -> Option<RawFd> {
        self.io.as_ref().map(|io| io.socket.as_raw_fd())
    }

    pub fn interest(&self) -> Interest {
        match (self.state, &self.io) {
            (State::Connecting, Some(_)) => Interest {
                read: false,
                write: true,
            },
            (State::Ready, Some(io)) => Interest {
                read: true,
                write: !io.out.is_empty(),
            },
            _ => Interest::default(),
        }
    }

    /// The fd became writable.
    pub fn on_writable(&mut self) -> Result<(), Error> {
        match self.state {
            State::Connecting => {
                let Some(fd) = self.raw_fd() else {
                    return Ok(());
                };
                match socket_error(fd) {
                    Ok(None) => {
                        self.enter_ready();
                        self.flush()
                    }
                    Ok(Some(err)) => {
                        debug!(target: "gearman_endpoint", "{}: SO_ERROR after connect: {err}", self.source.display());
                        self.enter_disconnected(LocalTime::now(), DisconnectCause::ConnectFailure);
                        Ok(())
                    }
                    Err(err) => {
                        debug!(target: "gearman_endpoint", "{}: SO_ERROR probe failed: {err}", self.source.display());
                        self.enter_disconnected(LocalTime::now(), DisconnectCause::ConnectFailure);
                        Ok(())
                    }
                }
            }
            State::Ready => self.flush(),
            State::Disconnected => Ok(()),
        }
    }

    fn flush(&mut self) -> Result<(), Error> {
        let failure = {
            let Some(io) = &mut self.io else {
                return Ok(());
            };
            loop {
                if io.out.is_empty() {
                    break None;
                }
                match io.socket.write(&io.out) {
                    Ok(0) => break Some(io::Error::from(io::ErrorKind::WriteZero)),
                    Ok(n) => {
                        io.out.drain(..n);
                    }
                    Err(e) if e.kind() == io::ErrorKind::WouldBlock => break None,
                    Err(e) => break Some(e),
                }
            }
        };
        if let Some(err) = failure {
            debug!(target: "gearman_endpoint", "{}: write error: {err}", self.source.display());
            self.enter_disconnected(LocalTime::now(), DisconnectCause::ReadyFailure);
        }
        Ok(())
    }

    /// The fd became readable.
    pub fn on_readable(&mut self) -> Result<(), Error> {
        if self.state != State::Ready {
            return Ok(());
        }
        let mut buf = [0u8; READ_BUFFER_SIZE];
        let outcome = {
            let Some(io) = &mut self.io else {
                return Ok(());
            };
            io.socket.read(&mut buf)
        };

        match outcome {
            Ok(0) => {
                trace!(target: "gearman_endpoint", "{}: EOF", self.source.display());
                self.enter_disconnected(LocalTime::now(), DisconnectCause::ReadyFailure);
                Ok(())
            }
            Ok(n) => match self.framer.feed(&buf[..n]) {
                Ok(packets) => {
                    for packet in packets {
                        if let Err(err) = self.route_packet(packet) {
                            warn!(target: "gearman_endpoint", "{}: {err}", self.source.display());
                            self.enter_disconnected(LocalTime::now(), DisconnectCause::ReadyFailure);
                            return Err(err);
                        }
                    }
                    Ok(())
                }
                Err(err) => {
                    warn!(target: "gearman_endpoint", "{}: {err}", self.source.display());
                    self.enter_disconnected(LocalTime::now(), DisconnectCause::ReadyFailure);
                    Err(err)
                }
            },
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => Ok(()),
            Err(e) => {
                debug!(target: "gearman_endpoint", "{}: read error: {e}", self.source.display());
                self.enter_disconnected(LocalTime::now(), DisconnectCause::ReadyFailure);
                Ok(())
            }
        }
    }

    fn write_bytes(&mut self, bytes: &[u8]) {
        if let Some(io) = &mut self.io {
            io.out.extend_from_slice(bytes);
        }
    }

    // -- packet router --------------------------------------------------------

    fn route_packet(&mut self, packet: Packet) -> Result<(), Error> {
        match packet.kind {
            PacketType::JobCreated => self.handle_job_created(&packet.payload),
            PacketType::WorkFail => self.handle_work_fail(&packet.payload),
            PacketType::WorkComplete => self.handle_work_complete(&packet.payload),
            PacketType::WorkStatus => self.handle_work_status(&packet.payload),
            PacketType::WorkException => self.handle_work_exception(&packet.payload),
            PacketType::Error if !self.requests.is_empty() => self.handle_option_error(),
            PacketType::OptionRes => self.handle_option_res(),
            PacketType::NoJob if self.is_worker => self.handle_no_job(),
            PacketType::JobAssign if self.is_worker => self.handle_job_assign(&packet.payload),
            PacketType::Noop if self.is_worker => self.handle_noop(),
            other => Err(Error::Protocol(format!("unexpected packet: {other:?}"))),
        }
    }

    // -- submission tracker -----------------------------------------------

    /// Submit a task. Only valid while `Ready`.
    pub fn add_task(&mut self, task: Arc<dyn Task>) -> Result<(), Error> {
        if self.state != State::Ready {
            return Err(Error::NotReady);
        }
        let bytes = task.submit_packet_bytes();
        self.write_bytes(&bytes);
        self.need_handle.push_back(Arc::downgrade(&task));
        Ok(())
    }

    /// Cancel a specific task. Best-effort; the server is not notified, so
    /// any later reply for the task's handle is silently discarded.
    pub fn give_up_on(&mut self, task: &Arc<dyn Task>) {
        let key = task_key(task);
        let Some(handle) = self.task2handle.remove(&key) else {
            return;
        };
        if let Some(tasks) = self.waiting.get_mut(&handle) {
            tasks.retain(|t| !Arc::ptr_eq(t, task));
            if tasks.is_empty() {
                self.waiting.remove(&handle);
            }
        }
    }

    fn handle_job_created(&mut self, payload: &[u8]) -> Result<(), Error> {
        let handle = String::from_utf8_lossy(payload).to_string();
        let weak = self.need_handle.pop_front().ok_or_else(|| {
            Error::Protocol("job_created received with empty need_handle".to_string())
        })?;
        if let Some(task) = weak.upgrade() {
            let key = task_key(&task);
            self.task2handle.insert(key, handle.clone());
            self.waiting.entry(handle).or_default().push_back(task);
        }
        Ok(())
    }

    fn handle_work_complete(&mut self, payload: &[u8]) -> Result<(), Error> {
        let (handle, result) = split_once_nul(payload);
        let handle = String::from_utf8_lossy(handle).to_string();
        if let Some(task) = self.pop_waiting(&handle) {
            self.task2handle.remove(&task_key(&task));
            task.complete(result);
        }
        Ok(())
    }

    fn handle_work_fail(&mut self, payload: &[u8]) -> Result<(), Error> {
        let handle = String::from_utf8_lossy(payload).to_string();
        if let Some(task) = self.pop_waiting(&handle) {
            self.task2handle.remove(&task_key(&task));
            task.fail();
        }
        Ok(())
    }

    fn handle_work_status(&mut self, payload: &[u8]) -> Result<(), Error> {
        let (handle, rest) = split_once_nul(payload);
        let (num, den) = split_once_nul(rest);
        let handle = String::from_utf8_lossy(handle).to_string();
        let (num, den) = (parse_u64(num), parse_u64(den));
        if let Some(tasks) = self.waiting.get(&handle) {
            for task in tasks {
                task.status(num, den);
            }
        }
        Ok(())
    }

    fn handle_work_exception(&mut self, payload: &[u8]) -> Result<(), Error> {
        let (handle, rest) = split_once_nul(payload);
        let handle = String::from_utf8_lossy(handle).to_string();
        if let Some(tasks) = self.waiting.get(&handle) {
            if let Some(task) = tasks.front() {
                task.exception(rest);
            }
        }
        Ok(())
    }

    fn pop_waiting(&mut self, handle: &str) -> Option<Arc<dyn Task>> {
        let Some(tasks) = self.waiting.get_mut(handle) else {
            return None;
        };
        let task = tasks.pop_front();
        if tasks.is_empty() {
            self.waiting.remove(handle);
        }
        task
    }

    // -- option negotiator --------------------------------------------------

    fn renegotiate_options(&mut self) {
        self.requests.clear();
        let names: Vec<String> = self
            .options
            .iter()
            .filter(|(_, &enabled)| enabled)
            .map(|(name, _)| name.clone())
            .collect();
        for name in names {
            let bytes = pack(Verb::OptionReq, name.as_bytes());
            self.write_bytes(&bytes);
            self.requests.push_back(name);
        }
    }

    fn handle_option_res(&mut self) -> Result<(), Error> {
        self.requests.pop_front();
        Ok(())
    }

    fn handle_option_error(&mut self) -> Result<(), Error> {
        if let Some(name) = self.requests.pop_front() {
            self.options.remove(&name);
        }
        Ok(())
    }

    // -- worker mode ------------------------------------------------------

    /// Register a worker function. Safe to call before connecting or after;
    /// `can_do` (and the initial `grab_job`) are (re)sent on every `Ready`
    /// transition, so registrations survive reconnects.
    pub fn register_function(
        &mut self,
        name: impl Into<String>,
        handler: impl WorkerHandler + 'static,
    ) {
        let name = name.into();
        let first_function = !self.is_worker;
        self.worker_funcs.insert(name.clone(), Arc::new(handler));
        self.is_worker = true;

        if self.state == State::Ready {
            let bytes = pack(Verb::CanDo, name.as_bytes());
            self.write_bytes(&bytes);
            if first_function {
                self.send_grab_job();
            }
        }
    }

    fn send_grab_job(&mut self) {
        let bytes = pack(Verb::GrabJob, b"");
        self.write_bytes(&bytes);
    }

    pub(crate) fn send_work_status(&mut self, handle: &str, numerator: u64, denominator: u64) {
        let payload = join(&[
            handle.as_bytes(),
            numerator.to_string().as_bytes(),
            denominator.to_string().as_bytes(),
        ]);
        let bytes = pack(Verb::WorkStatus, &payload);
        self.write_bytes(&bytes);
    }

    pub(crate) fn send_work_complete(&mut self, handle: &str, result: &[u8]) {
        let payload = join(&[handle.as_bytes(), result]);
        let bytes = pack(Verb::WorkComplete, &payload);
        self.write_bytes(&bytes);
    }

    pub(crate) fn send_work_fail(&mut self, handle: &str) {
        let bytes = pack(Verb::WorkFail, handle.as_bytes());
        self.write_bytes(&bytes);
    }

    fn handle_no_job(&mut self) -> Result<(), Error> {
        let bytes = pack(Verb::PreSleep, b"");
        self.write_bytes(&bytes);
        Ok(())
    }

    fn handle_noop(&mut self) -> Result<(), Error> {
        self.send_grab_job();
        Ok(())
    }

    fn handle_job_assign(&mut self, payload: &[u8]) -> Result<(), Error> {
        let (handle, rest) = split_once_nul(payload);
        let (function, job_payload) = split_once_nul(rest);
        let handle = String::from_utf8_lossy(handle).to_string();
        let function = String::from_utf8_lossy(function).to_string();

        if let Some(handler) = self.worker_funcs.get(&function).cloned() {
            let mut job = Job::new(function, job_payload.to_vec(), handle, self);
            handler.handle(&mut job);
        } else {
            self.send_work_fail(&handle);
        }
        self.send_grab_job();
        Ok(())
    }

    // -- misc accessors -------------------------------------------------------

    pub fn state(&self) -> State {
        self.state
    }

    pub fn hostspec(&self) -> String {
        self.source.display()
    }

    pub fn as_string(&self) -> String {
        let waiting: usize = self.waiting.values().map(|v| v.len()).sum();
        format!(
            "{}({}waiting, {}need_handle, {}requests)",
            self.source.display(),
            waiting,
            self.need_handle.len(),
            self.requests.len()
        )
    }

    /// Whether the endpoint is outside its dead interval.
    pub fn alive(&self) -> bool {
        match self.dead_until {
            None => true,
            Some(deadline) => deadline.has_passed(LocalTime::now()),
        }
    }

    pub fn is_worker(&self) -> bool {
        self.is_worker
    }

    /// Total tasks currently tracked, whether awaiting a handle or awaiting
    /// a terminal reply.
    pub fn stuff_outstanding(&self) -> usize {
        self.need_handle.len() + self.waiting.values().map(|v| v.len()).sum::<usize>()
    }

    /// Test hook: suppress the actual dial but still arm the connect
    /// deadline, so offline behavior can be exercised deterministically.
    pub fn t_set_offline(&mut self, offline: bool) {
        self.t_offline = offline;
    }
}

impl std::fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Endpoint({:?}, {})", self.state, self.as_string())
    }
}

fn split_once_nul(payload: &[u8]) -> (&[u8], &[u8]) {
    match payload.iter().position(|b| *b == 0) {
        Some(idx) => (&payload[..idx], &payload[idx + 1..]),
        None => (payload, &[]),
    }
}

fn parse_u64(bytes: &[u8]) -> u64 {
    std::str::from_utf8(bytes)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(0)
}

fn resolve(host: &str, port: u16) -> io::Result<SocketAddr> {
    (host, port)
        .to_socket_addrs()?
        .next()
        .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, format!("no addresses for {host}")))
}

fn dial_tcp(addr: SocketAddr) -> io::Result<Box<dyn Transport>> {
    use socket2::{Domain, Socket, Type};

    let domain = if addr.is_ipv4() {
        Domain::IPV4
    } else {
        Domain::IPV6
    };
    let socket = Socket::new(domain, Type::STREAM, None)?;
    socket.set_nonblocking(true)?;
    socket.set_nodelay(true)?;

    match socket.connect(&addr.into()) {
        Ok(()) => {}
        Err(e) if e.raw_os_error() == Some(libc::EINPROGRESS) => {}
        Err(e) if e.kind() == io::ErrorKind::WouldBlock => {}
        Err(e) => return Err(e),
    }

    let stream: std::net::TcpStream = socket.into();
    Ok(Box::new(stream))
}

/// Read `SO_ERROR` off a non-blocking socket that just became writable, to
/// tell a completed connect from a failed one.
fn socket_error(fd: RawFd) -> io::Result<Option<io::Error>> {
    let mut err: libc::c_int = 0;
    let mut len = std::mem::size_of::<libc::c_int>() as libc::socklen_t;

    let ret = unsafe {
        libc::getsockopt(
            fd,
            libc::SOL_SOCKET,
            libc::SO_ERROR,
            &mut err as *mut _ as *mut libc::c_void,
            &mut len,
        )
    };
    if ret != 0 {
        return Err(io::Error::last_os_error());
    }
    if err == 0 {
        Ok(None)
    } else {
        Ok(Some(io::Error::from_raw_os_error(err)))
    }
}

fn shutdown_quietly(fd: RawFd) {
    unsafe {
        libc::shutdown(fd, libc::SHUT_RDWR);
    }
}
