//! JSON-lines client for the accounts service.
//!
//! One request per connection: the client writes `{"query": "..."}` followed
//! by a newline and reads a single reply line, either
//! `{"accounts": [...]}` or `{"error": "..."}`.

use std::io::{self, BufRead, BufReader, Read, Write};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

use dirbridge_config::SocketEndpoint;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[cfg(unix)]
use socket2::{Domain, SockAddr, Socket, Type};
#[cfg(unix)]
use std::os::fd::OwnedFd;
#[cfg(unix)]
use std::os::unix::net::UnixStream;

use crate::transport::ConnectionStream;

use super::{ACCOUNTS_TARGET, AccountRecord, AccountsService, BackendError};

/// Maximum time spent establishing a connection.
pub const CONNECTION_TIMEOUT: Duration = Duration::from_secs(5);

/// Maximum time a single read or write may block.
pub const IO_TIMEOUT: Duration = Duration::from_secs(30);

const MAX_REPLY_BYTES: usize = 16 * 1024 * 1024;

#[derive(Serialize)]
struct QueryRequest<'a> {
    query: &'a str,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum QueryReply {
    Accounts { accounts: Vec<AccountRecord> },
    Error { error: String },
}

/// Accounts service client speaking JSON lines over a socket endpoint.
#[derive(Debug, Clone)]
pub struct SocketAccountsClient {
    endpoint: SocketEndpoint,
}

impl SocketAccountsClient {
    /// Builds a client for `endpoint`. No connection is made until the first
    /// call.
    #[must_use]
    pub const fn new(endpoint: SocketEndpoint) -> Self {
        Self { endpoint }
    }

    /// Endpoint the client connects to.
    #[must_use]
    pub fn endpoint(&self) -> &SocketEndpoint {
        &self.endpoint
    }

    fn connect(&self) -> Result<ConnectionStream, BackendError> {
        let stream = match &self.endpoint {
            SocketEndpoint::Tcp { host, port } => {
                let address =
                    resolve_tcp_address(host, *port).map_err(|source| BackendError::Resolve {
                        endpoint: self.endpoint.to_string(),
                        source,
                    })?;
                TcpStream::connect_timeout(&address, CONNECTION_TIMEOUT)
                    .map(ConnectionStream::Tcp)
                    .map_err(|source| BackendError::Connect {
                        endpoint: self.endpoint.to_string(),
                        source,
                    })?
            }
            SocketEndpoint::Unix { path } => {
                #[cfg(unix)]
                {
                    connect_unix(path.as_str()).map_err(|source| BackendError::Connect {
                        endpoint: self.endpoint.to_string(),
                        source,
                    })?
                }

                #[cfg(not(unix))]
                {
                    let _ = path;
                    return Err(BackendError::UnsupportedUnix {
                        endpoint: self.endpoint.to_string(),
                    });
                }
            }
        };
        stream.set_timeouts(Some(IO_TIMEOUT))?;
        Ok(stream)
    }
}

impl AccountsService for SocketAccountsClient {
    fn list_accounts(&self, query: &str) -> Result<Vec<AccountRecord>, BackendError> {
        let mut stream = self.connect()?;
        let mut request = serde_json::to_vec(&QueryRequest { query })?;
        request.push(b'\n');
        stream.write_all(&request)?;
        stream.flush()?;

        let line = read_reply_line(&mut stream)?;
        match serde_json::from_slice::<QueryReply>(&line)? {
            QueryReply::Accounts { accounts } => {
                debug!(
                    target: ACCOUNTS_TARGET,
                    endpoint = %self.endpoint,
                    count = accounts.len(),
                    "accounts service replied"
                );
                Ok(accounts)
            }
            QueryReply::Error { error } => Err(BackendError::Service { message: error }),
        }
    }
}

fn read_reply_line<R: Read>(stream: R) -> Result<Vec<u8>, BackendError> {
    let limit = u64::try_from(MAX_REPLY_BYTES).unwrap_or(u64::MAX);
    let mut reader = BufReader::new(stream.take(limit + 1));
    let mut line = Vec::new();
    let read = reader.read_until(b'\n', &mut line)?;
    if read == 0 {
        return Err(BackendError::EmptyReply);
    }
    if line.len() > MAX_REPLY_BYTES {
        return Err(BackendError::ReplyTooLarge {
            limit: MAX_REPLY_BYTES,
        });
    }
    Ok(line)
}

fn resolve_tcp_address(host: &str, port: u16) -> io::Result<SocketAddr> {
    let mut addrs = (host, port).to_socket_addrs()?;
    addrs
        .find(|addr| matches!(addr, SocketAddr::V4(_) | SocketAddr::V6(_)))
        .ok_or_else(|| io::Error::new(io::ErrorKind::AddrNotAvailable, "no resolved addresses"))
}

#[cfg(unix)]
fn connect_unix(path: &str) -> io::Result<ConnectionStream> {
    let socket = Socket::new(Domain::UNIX, Type::STREAM, None)?;
    let address = SockAddr::unix(path)?;
    socket.connect_timeout(&address, CONNECTION_TIMEOUT)?;
    let stream = UnixStream::from(OwnedFd::from(socket));
    Ok(ConnectionStream::Unix(stream))
}

#[cfg(test)]
mod tests {
    use std::io::{BufRead, BufReader, Write};
    use std::net::TcpListener;
    use std::thread;

    use rstest::rstest;

    use super::*;

    fn serve_once(reply: &'static str) -> (SocketEndpoint, thread::JoinHandle<String>) {
        let listener = TcpListener::bind(("127.0.0.1", 0)).expect("bind listener");
        let port = listener.local_addr().expect("address").port();
        let server = thread::spawn(move || {
            let (stream, _) = listener.accept().expect("accept");
            let mut reader = BufReader::new(stream.try_clone().expect("clone stream"));
            let mut request = String::new();
            reader.read_line(&mut request).expect("read request");
            let mut writer = stream;
            writer.write_all(reply.as_bytes()).expect("write reply");
            request
        });
        (SocketEndpoint::tcp("127.0.0.1", port), server)
    }

    #[test]
    fn lists_accounts_over_tcp() {
        let (endpoint, server) = serve_once(
            "{\"accounts\":[{\"preferredName\":\"alice\",\"mail\":\"alice@example.org\",\"uidNumber\":1000}]}\n",
        );
        let client = SocketAccountsClient::new(endpoint);

        let accounts = client
            .list_accounts("preferred_name eq 'alice'")
            .expect("accounts");

        assert_eq!(
            accounts,
            vec![AccountRecord {
                preferred_name: "alice".to_owned(),
                mail: "alice@example.org".to_owned(),
                uid_number: 1000,
                ..AccountRecord::default()
            }]
        );
        let request = server.join().expect("join server");
        assert_eq!(request, "{\"query\":\"preferred_name eq 'alice'\"}\n");
    }

    #[cfg(unix)]
    #[test]
    fn lists_accounts_over_unix_sockets() {
        use std::os::unix::net::UnixListener;

        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("accounts.sock");
        let listener = UnixListener::bind(&path).expect("bind unix listener");
        let server = thread::spawn(move || {
            let (stream, _) = listener.accept().expect("accept");
            let mut reader = BufReader::new(stream.try_clone().expect("clone stream"));
            let mut request = String::new();
            reader.read_line(&mut request).expect("read request");
            let mut writer = stream;
            writer
                .write_all(b"{\"accounts\":[{\"preferredName\":\"bob\"}]}\n")
                .expect("write reply");
            request
        });
        let client = SocketAccountsClient::new(SocketEndpoint::unix(
            path.to_str().expect("utf-8 socket path"),
        ));

        let accounts = client.list_accounts("uid_number eq '7'").expect("accounts");

        assert_eq!(accounts.len(), 1);
        assert_eq!(accounts.first().map(|record| record.preferred_name.as_str()), Some("bob"));
        assert_eq!(
            server.join().expect("join server"),
            "{\"query\":\"uid_number eq '7'\"}\n"
        );
    }

    #[test]
    fn surfaces_service_errors() {
        let (endpoint, server) = serve_once("{\"error\":\"query rejected\"}\n");
        let client = SocketAccountsClient::new(endpoint);

        let error = client.list_accounts("bogus").expect_err("service error");
        assert!(matches!(
            error,
            BackendError::Service { ref message } if message == "query rejected"
        ));
        server.join().expect("join server");
    }

    #[rstest]
    #[case("")]
    #[case("not json\n")]
    fn rejects_missing_or_malformed_replies(#[case] reply: &'static str) {
        let (endpoint, server) = serve_once(reply);
        let client = SocketAccountsClient::new(endpoint);

        let error = client.list_accounts("").expect_err("bad reply");
        assert!(matches!(
            error,
            BackendError::EmptyReply | BackendError::Decode(_)
        ));
        server.join().expect("join server");
    }

    #[test]
    fn reports_unreachable_services() {
        let listener = TcpListener::bind(("127.0.0.1", 0)).expect("bind listener");
        let port = listener.local_addr().expect("address").port();
        drop(listener);

        let client = SocketAccountsClient::new(SocketEndpoint::tcp("127.0.0.1", port));
        let error = client.list_accounts("").expect_err("connection refused");
        assert!(matches!(error, BackendError::Connect { .. }));
        assert!(
            error.to_string().contains(&client.endpoint().to_string()),
            "diagnostic should name the endpoint: {error}"
        );
    }
}
