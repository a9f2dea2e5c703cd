//! Tests for the socket listener.

use std::io::Read;
use std::net::TcpStream;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use rstest::{fixture, rstest};

use dirbridge_config::SocketEndpoint;

use super::listener::SocketListener;
use super::{ConnectionHandler, ConnectionStream, ListenerError};

/// Counts connections and records the name of the serving thread.
#[derive(Default)]
struct CountingHandler {
    count: AtomicUsize,
    thread_names: Mutex<Vec<String>>,
}

impl ConnectionHandler for CountingHandler {
    fn handle(&self, mut stream: ConnectionStream) {
        if let Some(name) = std::thread::current().name() {
            self.thread_names
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
                .push(name.to_owned());
        }
        self.count.fetch_add(1, Ordering::SeqCst);
        let mut buffer = [0_u8; 1];
        let _ = stream.read(&mut buffer);
    }
}

#[fixture]
fn handler() -> Arc<CountingHandler> {
    Arc::new(CountingHandler::default())
}

#[fixture]
fn tcp_endpoint() -> SocketEndpoint {
    SocketEndpoint::tcp("127.0.0.1", 0)
}

fn wait_for_count(count: &AtomicUsize, expected: usize) -> bool {
    let deadline = Instant::now() + Duration::from_secs(2);
    while Instant::now() < deadline {
        if count.load(Ordering::SeqCst) >= expected {
            return true;
        }
        std::thread::sleep(Duration::from_millis(10));
    }
    false
}

#[rstest]
fn tcp_listener_serves_connections_concurrently(
    tcp_endpoint: SocketEndpoint,
    handler: Arc<CountingHandler>,
) {
    let listener = SocketListener::bind(&tcp_endpoint).expect("bind tcp listener");
    let addr = listener
        .local_addr()
        .expect("listener should report local address");
    let shared: Arc<dyn ConnectionHandler> = handler.clone();
    let handle = listener.start(shared).expect("start listener");

    // Both clients stay open, so each handler blocks until shutdown.
    let first = TcpStream::connect(addr).expect("connect first client");
    let second = TcpStream::connect(addr).expect("connect second client");

    assert!(
        wait_for_count(&handler.count, 2),
        "expected two concurrent connections"
    );
    let names = handler
        .thread_names
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
        .clone();
    assert!(names.iter().all(|name| name.starts_with("ldap-conn-")));

    drop(first);
    drop(second);
    handle.shutdown();
    handle.join().expect("join listener");
}

#[cfg(unix)]
#[fixture]
fn unix_tempdir() -> tempfile::TempDir {
    tempfile::tempdir().expect("temp dir")
}

#[cfg(unix)]
#[rstest]
fn unix_listener_cleans_stale_socket_files(
    unix_tempdir: tempfile::TempDir,
    handler: Arc<CountingHandler>,
) {
    let path = unix_tempdir.path().join("dirbridged.sock");
    {
        let _stale = std::os::unix::net::UnixListener::bind(&path).expect("bind stale listener");
    }
    assert!(path.exists(), "stale socket should remain");

    let endpoint = SocketEndpoint::unix(path.to_str().expect("utf8 path").to_string());
    let listener = SocketListener::bind(&endpoint).expect("bind new listener");
    assert!(listener.local_addr().is_none());
    let handle = listener.start(handler.clone()).expect("start listener");

    drop(std::os::unix::net::UnixStream::connect(&path).expect("connect unix client"));
    assert!(wait_for_count(&handler.count, 1), "expected one connection");

    handle.shutdown();
    handle.join().expect("join listener");
    assert!(
        !path.exists(),
        "listener should remove unix socket on shutdown"
    );
}

#[cfg(unix)]
#[rstest]
fn unix_listener_rejects_in_use_socket(unix_tempdir: tempfile::TempDir) {
    let path = unix_tempdir.path().join("dirbridged.sock");
    let _existing = std::os::unix::net::UnixListener::bind(&path).expect("bind existing listener");

    let endpoint = SocketEndpoint::unix(path.to_str().expect("utf8 path").to_string());
    let error = SocketListener::bind(&endpoint).expect_err("should fail bind");
    assert!(matches!(error, ListenerError::UnixInUse { .. }));
}

#[cfg(unix)]
#[rstest]
fn unix_listener_refuses_regular_files(unix_tempdir: tempfile::TempDir) {
    let path = unix_tempdir.path().join("dirbridged.sock");
    std::fs::write(&path, b"not a socket").expect("write file");

    let endpoint = SocketEndpoint::unix(path.to_str().expect("utf8 path").to_string());
    let error = SocketListener::bind(&endpoint).expect_err("should fail bind");
    assert!(matches!(error, ListenerError::UnixNotSocket { .. }));
}
