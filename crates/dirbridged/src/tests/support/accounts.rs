//! Accounts service doubles and request builders.

use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;
use std::sync::{Arc, Mutex};
use std::thread;

use mockall::mock;
use serde_json::json;

use dirbridge_config::{DirectoryNaming, SocketEndpoint};
use dirbridge_filter::FilterNode;

use crate::accounts::{AccountRecord, AccountsService, BackendError};
use crate::protocol::{SearchRequest, SearchScope, encode_filter};

mock! {
    pub Accounts {}
    impl AccountsService for Accounts {
        fn list_accounts(&self, query: &str) -> Result<Vec<AccountRecord>, BackendError>;
    }
}

/// Naming used throughout the suites: base `dc=example,dc=com`, `cn`, `ou`.
#[must_use]
pub fn test_naming() -> DirectoryNaming {
    DirectoryNaming::new("dc=example,dc=com", "cn", "ou").expect("test naming is valid")
}

/// Account with every optional attribute populated.
#[must_use]
pub fn account(name: &str, uid_number: i64) -> AccountRecord {
    AccountRecord {
        preferred_name: name.to_owned(),
        display_name: format!("{name} (display)"),
        mail: format!("{name}@example.com"),
        uid_number,
        gid_number: 100,
        description: String::new(),
    }
}

/// Subtree search under `base` with the filter given as RFC 4515 text.
#[must_use]
pub fn search_request(base: &str, filter: &str, attributes: &[&str]) -> SearchRequest {
    let node: FilterNode = filter.parse().expect("test filter parses");
    SearchRequest {
        base_object: base.to_owned(),
        scope: SearchScope::WholeSubtree,
        size_limit: 0,
        time_limit: 0,
        types_only: false,
        filter: encode_filter(&node),
        attributes: attributes.iter().map(|name| (*name).to_owned()).collect(),
    }
}

/// JSON-lines accounts service on an ephemeral TCP port.
///
/// Credential queries succeed only for `password eq 'secret'`; every other
/// query lists all records.
pub struct FakeAccountsServer {
    endpoint: SocketEndpoint,
    queries: Arc<Mutex<Vec<String>>>,
}

impl FakeAccountsServer {
    /// Starts serving `records` on a background thread.
    #[must_use]
    pub fn start(records: Vec<AccountRecord>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind fake accounts service");
        let port = listener
            .local_addr()
            .expect("fake accounts service address")
            .port();
        let queries = Arc::new(Mutex::new(Vec::new()));
        let recorded = Arc::clone(&queries);
        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(stream) = stream else { break };
                serve_one(stream, &records, &recorded);
            }
        });
        Self {
            endpoint: SocketEndpoint::tcp("127.0.0.1", port),
            queries,
        }
    }

    /// Endpoint to configure as the accounts socket.
    #[must_use]
    pub fn endpoint(&self) -> SocketEndpoint {
        self.endpoint.clone()
    }

    /// Queries received so far, in arrival order.
    #[must_use]
    pub fn queries(&self) -> Vec<String> {
        self.queries
            .lock()
            .expect("query log mutex poisoned")
            .clone()
    }
}

fn serve_one(
    stream: std::net::TcpStream,
    records: &[AccountRecord],
    queries: &Mutex<Vec<String>>,
) {
    let mut reader = BufReader::new(stream);
    let mut line = String::new();
    if reader.read_line(&mut line).is_err() {
        return;
    }
    let request: serde_json::Value = serde_json::from_str(&line).unwrap_or_default();
    let query = request["query"].as_str().unwrap_or_default().to_owned();
    queries
        .lock()
        .expect("query log mutex poisoned")
        .push(query.clone());

    let reply = if query.starts_with("login eq ") {
        let matched: Vec<&AccountRecord> = if query.ends_with("password eq 'secret'") {
            records.iter().take(1).collect()
        } else {
            Vec::new()
        };
        json!({ "accounts": matched })
    } else {
        json!({ "accounts": records })
    };
    let mut stream = reader.into_inner();
    let _ = writeln!(stream, "{reply}");
}
