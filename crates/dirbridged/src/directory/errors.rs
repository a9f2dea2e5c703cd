//! Error taxonomy of the directory handler.

use dirbridge_filter::CompileError;
use thiserror::Error;

use crate::accounts::BackendError;
use crate::protocol::{ProtocolError, ResultCode};

use super::AuthzError;

/// Terminal failure of a single directory request.
///
/// Each variant maps to exactly one result code.
#[derive(Debug, Error)]
pub enum DirectoryError {
    /// The request fell outside the served naming context.
    #[error("search error: {0}")]
    Authz(#[from] AuthzError),
    /// The search filter could not be decoded.
    #[error("search error: error parsing filter: {0}")]
    Parse(#[source] ProtocolError),
    /// The filter could not be translated into a backend query.
    #[error("search error: error compiling filter: {0}")]
    Compile(#[from] CompileError),
    /// The accounts service call failed during a search.
    #[error("search error: error getting users: {0}")]
    Backend(#[from] BackendError),
    /// A bind could not be authenticated.
    #[error("invalid credentials for '{bind_dn}': {reason}")]
    InvalidCredentials {
        /// Bind name as sent.
        bind_dn: String,
        /// Why authentication failed; never contains the password.
        reason: String,
    },
}

impl DirectoryError {
    /// Result code reported to the client.
    #[must_use]
    pub const fn result_code(&self) -> ResultCode {
        match self {
            Self::Authz(_) => ResultCode::InsufficientAccessRights,
            Self::Parse(_) | Self::Compile(_) | Self::Backend(_) => ResultCode::OperationsError,
            Self::InvalidCredentials { .. } => ResultCode::InvalidCredentials,
        }
    }
}
