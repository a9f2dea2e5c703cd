//! Error types for accounts service calls.

use std::io;

use thiserror::Error;

/// Errors surfaced by [`AccountsService`](super::AccountsService) calls.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The endpoint host did not resolve.
    #[error("failed to resolve accounts service {endpoint}: {source}")]
    Resolve {
        /// Configured endpoint.
        endpoint: String,
        /// Underlying resolver error.
        #[source]
        source: io::Error,
    },
    /// Connecting to the service failed or timed out.
    #[error("failed to connect to accounts service {endpoint}: {source}")]
    Connect {
        /// Configured endpoint.
        endpoint: String,
        /// Underlying socket error.
        #[source]
        source: io::Error,
    },
    /// Unix sockets are not available on this platform.
    #[error("unix sockets are unsupported for accounts service {endpoint}")]
    UnsupportedUnix {
        /// Configured endpoint.
        endpoint: String,
    },
    /// Writing the request or reading the reply failed.
    #[error("accounts service i/o failed: {0}")]
    Io(#[from] io::Error),
    /// The reply was not valid JSON of the expected shape.
    #[error("malformed accounts service reply: {0}")]
    Decode(#[from] serde_json::Error),
    /// The service closed the connection without replying.
    #[error("accounts service closed the connection without a reply")]
    EmptyReply,
    /// The reply exceeded the accepted size.
    #[error("accounts service reply exceeds {limit} bytes")]
    ReplyTooLarge {
        /// Accepted size in bytes.
        limit: usize,
    },
    /// The service answered with an error.
    #[error("accounts service error: {message}")]
    Service {
        /// Message reported by the service.
        message: String,
    },
}
