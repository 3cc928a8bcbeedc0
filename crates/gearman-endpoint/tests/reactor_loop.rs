//! Drives a real `Endpoint` over loopback TCP through a small `popol`-based
//! poll loop, standing in for the external reactor the crate itself does not
//! ship.
use std::io::{Read, Write};
use std::net::TcpListener;
use std::os::unix::io::{AsRawFd, RawFd};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use gearman_endpoint::{Endpoint, HostSpec, LocalTime, State, Task};

#[derive(Debug)]
struct RecordingTask {
    result: Mutex<Option<Vec<u8>>>,
}

impl Task for RecordingTask {
    fn submit_packet_bytes(&self) -> Vec<u8> {
        let payload = b"reverse\0\0abc";
        let mut out = Vec::new();
        out.extend_from_slice(b"\0REQ");
        out.extend_from_slice(&7u32.to_be_bytes());
        out.extend_from_slice(&(payload.len() as u32).to_be_bytes());
        out.extend_from_slice(payload);
        out
    }

    fn complete(&self, payload: &[u8]) {
        *self.result.lock().unwrap() = Some(payload.to_vec());
    }

    fn fail(&self) {
        panic!("task should not fail in this test");
    }

    fn status(&self, _numerator: u64, _denominator: u64) {}

    fn exception(&self, _payload: &[u8]) {}
}

fn response_frame(type_code: u32, payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(b"\0RES");
    out.extend_from_slice(&type_code.to_be_bytes());
    out.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    out.extend_from_slice(payload);
    out
}

/// A registration handle for `popol` that doesn't own the fd — the endpoint
/// keeps the real socket; this just lets `popol` poll it.
struct FdSource(RawFd);

impl AsRawFd for FdSource {
    fn as_raw_fd(&self) -> RawFd {
        self.0
    }
}

#[test]
fn endpoint_round_trip_over_loopback_tcp() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();

    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    let server = std::thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();

        let mut header = [0u8; 12];
        stream.read_exact(&mut header).unwrap();
        let len = u32::from_be_bytes(header[8..12].try_into().unwrap()) as usize;
        let mut payload = vec![0u8; len];
        stream.read_exact(&mut payload).unwrap();
        assert_eq!(payload, b"reverse\0\0abc");

        stream.write_all(&response_frame(8, b"H1")).unwrap();
        stream.write_all(&response_frame(13, b"H1\0cba")).unwrap();
    });

    let mut endpoint = Endpoint::new(HostSpec::Address(addr.to_string()), Vec::new());
    let task = Arc::new(RecordingTask {
        result: Mutex::new(None),
    });
    let mut submitted = false;

    endpoint.connect().unwrap();

    let mut sources: popol::Sources<()> = popol::Sources::new();
    let fd = endpoint.raw_fd().expect("socket exists immediately after connect()");
    sources.register((), &FdSource(fd), popol::interest::ALL);

    let mut events = Vec::with_capacity(4);
    let deadline = Instant::now() + Duration::from_secs(2);

    while task.result.lock().unwrap().is_none() {
        assert!(Instant::now() < deadline, "test timed out waiting for completion");

        match sources.wait_timeout(&mut events, Duration::from_millis(50)) {
            Ok(_) => {
                for event in events.drain(..) {
                    if event.is_writable() {
                        endpoint.on_writable().unwrap();
                    }
                    if event.is_readable() {
                        endpoint.on_readable().unwrap();
                    }
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::TimedOut => {}
            Err(e) => panic!("poll error: {e}"),
        }

        endpoint.tick(LocalTime::now());

        if !submitted && endpoint.state() == State::Ready {
            let task_handle: Arc<dyn Task> = task.clone();
            endpoint.add_task(task_handle).unwrap();
            submitted = true;
        }
    }

    assert_eq!(task.result.lock().unwrap().as_deref(), Some(b"cba".as_ref()));
    server.join().unwrap();
}
