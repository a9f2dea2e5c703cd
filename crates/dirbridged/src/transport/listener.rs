//! Listener implementation for the directory endpoint.
//!
//! Accepting runs on a non-blocking socket polled by one background thread,
//! so shutdown only needs to flip a flag. Each accepted connection is served
//! on a named thread of its own.

use std::io;
use std::net::{SocketAddr, TcpListener, ToSocketAddrs};
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use std::thread;
use std::time::Duration;

use tracing::{debug, info, warn};

use dirbridge_config::SocketEndpoint;

use super::{ConnectionHandler, ConnectionStream, LISTENER_TARGET, ListenerError};

#[cfg(unix)]
use std::os::unix::net::UnixListener;

const IDLE_POLL: Duration = Duration::from_millis(25);
const FAILURE_PAUSE: Duration = Duration::from_millis(150);
const CONNECTION_THREAD_PREFIX: &str = "ldap-conn-";
const ACCEPT_THREAD_NAME: &str = "ldap-accept";

/// Listener bound to the configured directory endpoint.
#[derive(Debug)]
pub(crate) struct SocketListener {
    endpoint: SocketEndpoint,
    acceptor: Acceptor,
}

#[derive(Debug)]
enum Acceptor {
    Tcp(TcpListener),
    #[cfg(unix)]
    Unix(UnixListener),
}

impl Acceptor {
    fn set_nonblocking(&self) -> io::Result<()> {
        match self {
            Self::Tcp(listener) => listener.set_nonblocking(true),
            #[cfg(unix)]
            Self::Unix(listener) => listener.set_nonblocking(true),
        }
    }

    /// Returns `Ok(None)` when no client is waiting.
    fn poll(&self) -> io::Result<Option<ConnectionStream>> {
        let accepted = match self {
            Self::Tcp(listener) => listener.accept().and_then(|(stream, _)| {
                stream.set_nonblocking(false)?;
                Ok(ConnectionStream::Tcp(stream))
            }),
            #[cfg(unix)]
            Self::Unix(listener) => listener.accept().and_then(|(stream, _)| {
                stream.set_nonblocking(false)?;
                Ok(ConnectionStream::Unix(stream))
            }),
        };
        match accepted {
            Ok(stream) => Ok(Some(stream)),
            Err(error) if error.kind() == io::ErrorKind::WouldBlock => Ok(None),
            Err(error) => Err(error),
        }
    }
}

impl SocketListener {
    pub(crate) fn bind(endpoint: &SocketEndpoint) -> Result<Self, ListenerError> {
        let acceptor = match endpoint {
            SocketEndpoint::Tcp { host, port } => Acceptor::Tcp(bind_tcp(host, *port)?),
            #[cfg(unix)]
            SocketEndpoint::Unix { path } => {
                socket_file::reclaim(path.as_std_path())?;
                let listener = UnixListener::bind(path.as_std_path()).map_err(|source| {
                    ListenerError::BindUnix {
                        path: path.to_string(),
                        source,
                    }
                })?;
                Acceptor::Unix(listener)
            }
            #[cfg(not(unix))]
            SocketEndpoint::Unix { .. } => {
                return Err(ListenerError::UnsupportedUnix {
                    endpoint: endpoint.to_string(),
                });
            }
        };
        Ok(Self {
            endpoint: endpoint.clone(),
            acceptor,
        })
    }

    /// Bound TCP address; `None` for Unix endpoints.
    pub(crate) fn local_addr(&self) -> Option<SocketAddr> {
        match &self.acceptor {
            Acceptor::Tcp(listener) => listener.local_addr().ok(),
            #[cfg(unix)]
            Acceptor::Unix(_) => None,
        }
    }

    pub(crate) fn start(
        self,
        handler: Arc<dyn ConnectionHandler>,
    ) -> Result<ListenerHandle, ListenerError> {
        if let Err(source) = self.acceptor.set_nonblocking() {
            #[cfg(unix)]
            socket_file::release(&self.endpoint);
            return Err(ListenerError::NonBlocking { source });
        }

        let stop = Arc::new(AtomicBool::new(false));
        let accept_loop = AcceptLoop {
            listener: self,
            stop: Arc::clone(&stop),
            handler,
            accepted: 0,
            last_failure: None,
        };
        let thread = thread::Builder::new()
            .name(ACCEPT_THREAD_NAME.to_owned())
            .spawn(move || accept_loop.run())
            .map_err(|source| ListenerError::Spawn { source })?;
        Ok(ListenerHandle {
            stop,
            thread: Some(thread),
        })
    }
}

/// Handle to the background accept loop.
pub(crate) struct ListenerHandle {
    stop: Arc<AtomicBool>,
    thread: Option<thread::JoinHandle<()>>,
}

impl ListenerHandle {
    /// Asks the accept loop to stop; in-flight connections run to completion.
    pub(crate) fn shutdown(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }

    pub(crate) fn join(mut self) -> Result<(), ListenerError> {
        match self.thread.take() {
            Some(thread) => thread.join().map_err(|_| ListenerError::ThreadPanic),
            None => Ok(()),
        }
    }
}

impl Drop for ListenerHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

struct AcceptLoop {
    listener: SocketListener,
    stop: Arc<AtomicBool>,
    handler: Arc<dyn ConnectionHandler>,
    accepted: u64,
    last_failure: Option<io::ErrorKind>,
}

impl AcceptLoop {
    fn run(mut self) {
        info!(
            target: LISTENER_TARGET,
            endpoint = %self.listener.endpoint,
            "directory listener accepting connections"
        );
        while !self.stop.load(Ordering::SeqCst) {
            let pause = self.poll_once();
            if let Some(pause) = pause {
                thread::sleep(pause);
            }
        }
        #[cfg(unix)]
        socket_file::release(&self.listener.endpoint);
        info!(
            target: LISTENER_TARGET,
            endpoint = %self.listener.endpoint,
            accepted = self.accepted,
            "directory listener stopped"
        );
    }

    /// Handles at most one pending client and returns how long to wait
    /// before polling again.
    fn poll_once(&mut self) -> Option<Duration> {
        match self.listener.acceptor.poll() {
            Ok(Some(stream)) => {
                self.last_failure = None;
                self.accepted += 1;
                self.dispatch(stream);
                None
            }
            Ok(None) => Some(IDLE_POLL),
            Err(error) => {
                // Repeats of the same failure are logged once.
                if self.last_failure != Some(error.kind()) {
                    warn!(
                        target: LISTENER_TARGET,
                        error = %error,
                        "failed to accept directory connection"
                    );
                }
                self.last_failure = Some(error.kind());
                Some(FAILURE_PAUSE)
            }
        }
    }

    fn dispatch(&self, stream: ConnectionStream) {
        let id = self.accepted;
        let peer = stream.peer();
        debug!(
            target: LISTENER_TARGET,
            connection = id,
            peer = %peer,
            "accepted connection"
        );
        let handler = Arc::clone(&self.handler);
        let spawned = thread::Builder::new()
            .name(format!("{CONNECTION_THREAD_PREFIX}{id}"))
            .spawn(move || handler.handle(stream));
        if let Err(error) = spawned {
            warn!(
                target: LISTENER_TARGET,
                connection = id,
                peer = %peer,
                error = %error,
                "failed to spawn connection thread"
            );
        }
    }
}

fn bind_tcp(host: &str, port: u16) -> Result<TcpListener, ListenerError> {
    let addr = (host, port)
        .to_socket_addrs()
        .map_err(|source| ListenerError::Resolve {
            host: host.to_owned(),
            port,
            source,
        })?
        .next()
        .ok_or_else(|| ListenerError::ResolveEmpty {
            host: host.to_owned(),
            port,
        })?;
    TcpListener::bind(addr).map_err(|source| ListenerError::BindTcp { addr, source })
}

/// Ownership of the socket file backing a Unix endpoint.
#[cfg(unix)]
mod socket_file {
    use std::fs;
    use std::io;
    use std::os::unix::fs::FileTypeExt;
    use std::os::unix::net::UnixStream;
    use std::path::Path;

    use tracing::{info, warn};

    use dirbridge_config::SocketEndpoint;

    use super::super::{LISTENER_TARGET, ListenerError};

    /// Clears a leftover socket file so the path can be bound again.
    ///
    /// A file that is not a socket, or a socket another process still
    /// answers on, is left alone and reported.
    pub(super) fn reclaim(path: &Path) -> Result<(), ListenerError> {
        let display = || path.display().to_string();
        let metadata = match fs::symlink_metadata(path) {
            Ok(metadata) => metadata,
            Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(source) => {
                return Err(ListenerError::UnixMetadata {
                    path: display(),
                    source,
                });
            }
        };
        if !metadata.file_type().is_socket() {
            return Err(ListenerError::UnixNotSocket { path: display() });
        }

        match UnixStream::connect(path) {
            Ok(_live) => Err(ListenerError::UnixInUse { path: display() }),
            Err(error)
                if matches!(
                    error.kind(),
                    io::ErrorKind::ConnectionRefused | io::ErrorKind::NotFound
                ) =>
            {
                fs::remove_file(path).map_err(|source| ListenerError::UnixCleanup {
                    path: display(),
                    source,
                })?;
                info!(
                    target: LISTENER_TARGET,
                    path = %path.display(),
                    "removed stale directory socket"
                );
                Ok(())
            }
            Err(source) => Err(ListenerError::UnixConnect {
                path: display(),
                source,
            }),
        }
    }

    pub(super) fn release(endpoint: &SocketEndpoint) {
        let SocketEndpoint::Unix { path } = endpoint else {
            return;
        };
        match fs::remove_file(path.as_std_path()) {
            Ok(()) => {}
            Err(error) if error.kind() == io::ErrorKind::NotFound => {}
            Err(error) => warn!(
                target: LISTENER_TARGET,
                path = %path,
                error = %error,
                "failed to remove directory socket"
            ),
        }
    }
}
