//! Accounts backend collaborator.
//!
//! The bridge owns no account data. Every bind and search is answered by a
//! single "list accounts matching query" call against the accounts service.

mod client;
mod errors;

use serde::{Deserialize, Serialize};

pub use self::client::{CONNECTION_TIMEOUT, IO_TIMEOUT, SocketAccountsClient};
pub use self::errors::BackendError;

pub(crate) const ACCOUNTS_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::accounts");

/// An account as returned by the accounts service.
///
/// Missing fields deserialize to their empty or zero value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AccountRecord {
    /// Login name; names the principal entry.
    pub preferred_name: String,
    /// Human-readable display name.
    pub display_name: String,
    /// Primary e-mail address.
    pub mail: String,
    /// POSIX user id; zero when unassigned.
    pub uid_number: i64,
    /// POSIX group id; zero when unassigned.
    pub gid_number: i64,
    /// Free-form description.
    pub description: String,
}

/// Read-only query interface of the accounts service.
pub trait AccountsService: Send + Sync {
    /// Lists the accounts matching a backend query expression.
    ///
    /// An empty query lists every account.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError`] when the call fails or the service reports an
    /// error.
    fn list_accounts(&self, query: &str) -> Result<Vec<AccountRecord>, BackendError>;
}

impl<T> AccountsService for std::sync::Arc<T>
where
    T: AccountsService + ?Sized,
{
    fn list_accounts(&self, query: &str) -> Result<Vec<AccountRecord>, BackendError> {
        (**self).list_accounts(query)
    }
}
