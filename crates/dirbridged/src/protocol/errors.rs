//! Error types for the LDAP wire mapping.

use std::fmt;
use std::io;

use thiserror::Error;

/// Errors raised while framing, decoding or encoding LDAP messages.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Reading from or writing to the connection failed.
    #[error("connection I/O failed: {0}")]
    Io(#[from] io::Error),
    /// More bytes arrived than any single message may occupy.
    #[error("message exceeds limit of {limit} bytes ({buffered} buffered)")]
    MessageTooLarge {
        /// Bytes buffered without completing a message.
        buffered: usize,
        /// Configured limit.
        limit: usize,
    },
    /// The BER codec rejected the bytes or the envelope.
    #[error("malformed LDAP message: {message}")]
    Codec {
        /// Codec diagnostic.
        message: String,
    },
    /// The message identifier was negative.
    #[error("message id {value} is out of range")]
    InvalidMessageId {
        /// Decoded identifier.
        value: i32,
    },
    /// The envelope carried an operation clients may not send to the bridge.
    #[error("operation cannot be sent to the bridge")]
    UnexpectedOperation,
    /// The filter uses a choice other than and, or, not or equality.
    #[error("{kind} filters are not supported")]
    UnsupportedFilter {
        /// Short description of the filter choice.
        kind: &'static str,
    },
    /// The filter nests beyond the accepted depth.
    #[error("filter nesting exceeds {limit} levels")]
    FilterTooDeep {
        /// Configured depth limit.
        limit: usize,
    },
}

impl ProtocolError {
    pub(crate) fn codec(error: impl fmt::Debug) -> Self {
        Self::Codec {
            message: format!("{error:?}"),
        }
    }

    /// Returns `true` when the peer closed the connection mid-message.
    #[must_use]
    pub fn is_disconnect(&self) -> bool {
        matches!(
            self,
            Self::Io(error) if matches!(
                error.kind(),
                io::ErrorKind::UnexpectedEof
                    | io::ErrorKind::ConnectionReset
                    | io::ErrorKind::BrokenPipe
            )
        )
    }
}
