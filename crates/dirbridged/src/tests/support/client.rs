//! Minimal LDAP client used to drive sessions over real sockets.

use std::io::Write;
use std::net::{SocketAddr, TcpStream};
use std::time::{Duration, Instant};

use dirbridge_config::SocketEndpoint;

use crate::protocol::{
    BindCredentials, BindRequest, DecodedResponse, MessageReader, Request, ResultCode,
    SearchRequest, encode_request,
};
use crate::transport::ConnectionStream;

const CLIENT_TIMEOUT: Duration = Duration::from_secs(5);

/// Blocking client that speaks one request at a time.
pub struct LdapTestClient {
    stream: ConnectionStream,
    reader: MessageReader,
    next_id: i32,
}

impl LdapTestClient {
    /// Connects to a TCP listener.
    #[must_use]
    pub fn connect_tcp(addr: SocketAddr) -> Self {
        let stream = TcpStream::connect_timeout(&addr, CLIENT_TIMEOUT).expect("connect to bridge");
        Self::from_stream(ConnectionStream::Tcp(stream))
    }

    /// Connects to `endpoint`, retrying until the listener accepts.
    #[must_use]
    pub fn connect_when_ready(endpoint: &SocketEndpoint) -> Self {
        let deadline = Instant::now() + CLIENT_TIMEOUT;
        loop {
            match open(endpoint) {
                Ok(stream) => return Self::from_stream(stream),
                Err(error) if Instant::now() >= deadline => {
                    panic!("bridge at {endpoint} never accepted: {error}")
                }
                Err(_) => std::thread::sleep(Duration::from_millis(20)),
            }
        }
    }

    fn from_stream(stream: ConnectionStream) -> Self {
        stream
            .set_timeouts(Some(CLIENT_TIMEOUT))
            .expect("set client timeouts");
        Self {
            stream,
            reader: MessageReader::new(),
            next_id: 1,
        }
    }

    /// Sends `request` and returns its message id.
    pub fn send(&mut self, request: &Request) -> i32 {
        let message_id = self.next_id;
        self.next_id += 1;
        self.send_raw(&encode_request(message_id, request));
        message_id
    }

    /// Writes raw bytes to the connection.
    pub fn send_raw(&mut self, bytes: &[u8]) {
        self.stream.write_all(bytes).expect("write request");
        self.stream.flush().expect("flush request");
    }

    /// Reads one response, or `None` once the server closed the connection.
    pub fn read_response(&mut self) -> Option<DecodedResponse> {
        let envelope = self.reader.read_message(&mut self.stream).ok()??;
        Some(DecodedResponse::from(envelope))
    }

    /// Simple bind; returns the result code and diagnostic.
    pub fn bind(&mut self, name: &str, password: &str) -> (ResultCode, String) {
        let request = Request::Bind(BindRequest {
            name: name.to_owned(),
            credentials: BindCredentials::Simple(password.to_owned()),
        });
        let message_id = self.send(&request);
        let response = self.read_response().expect("bind response");
        assert_eq!(response.message_id, message_id);
        response.result.expect("bind response carries a result")
    }

    /// Runs a search and collects entries up to `SearchResultDone`.
    pub fn search(
        &mut self,
        request: SearchRequest,
    ) -> (Vec<DecodedResponse>, (ResultCode, String)) {
        let message_id = self.send(&Request::Search(request));
        let mut entries = Vec::new();
        loop {
            let response = self.read_response().expect("search response");
            assert_eq!(response.message_id, message_id);
            if response.search_done {
                let result = response.result.expect("search done carries a result");
                return (entries, result);
            }
            entries.push(response);
        }
    }
}

fn open(endpoint: &SocketEndpoint) -> std::io::Result<ConnectionStream> {
    match endpoint {
        SocketEndpoint::Tcp { host, port } => {
            TcpStream::connect((host.as_str(), *port)).map(ConnectionStream::Tcp)
        }
        #[cfg(unix)]
        SocketEndpoint::Unix { path } => {
            std::os::unix::net::UnixStream::connect(path.as_std_path()).map(ConnectionStream::Unix)
        }
        #[cfg(not(unix))]
        SocketEndpoint::Unix { .. } => Err(std::io::Error::new(
            std::io::ErrorKind::Unsupported,
            "unix sockets are unavailable",
        )),
    }
}
