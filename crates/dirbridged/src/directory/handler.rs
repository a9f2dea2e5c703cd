//! Directory session handler backed by the accounts service.

use std::sync::Arc;

use dirbridge_config::DirectoryNaming;
use dirbridge_filter::{QueryDomain, compile, credential_query};
use tracing::debug;

use crate::accounts::AccountsService;
use crate::protocol::{ResultCode, SearchRequest, decode_filter};

use super::{
    AttributeSelection, DIRECTORY_TARGET, DirectoryEntry, DirectoryError, FrontendStats,
    authorize_bind, authorize_search, project,
};

/// Operations a directory session dispatches to.
///
/// Implementations are shared by every connection and hold no per-session
/// state; the session passes the last successful bind name explicitly.
pub trait DirectoryHandler: Send + Sync {
    /// Authenticates `bind_dn` with a simple password.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError::InvalidCredentials`] when authentication
    /// fails for any reason.
    fn bind(&self, bind_dn: &str, password: &str) -> Result<(), DirectoryError>;

    /// Answers a search issued by the session bound as `bind_dn`.
    ///
    /// # Errors
    ///
    /// Returns a [`DirectoryError`] whose
    /// [`result_code`](DirectoryError::result_code) is reported to the client.
    fn search(
        &self,
        bind_dn: &str,
        request: &SearchRequest,
    ) -> Result<SearchOutcome, DirectoryError>;

    /// Records the end of a session.
    fn close(&self, bind_dn: &str);
}

impl<T> DirectoryHandler for Arc<T>
where
    T: DirectoryHandler + ?Sized,
{
    fn bind(&self, bind_dn: &str, password: &str) -> Result<(), DirectoryError> {
        (**self).bind(bind_dn, password)
    }

    fn search(
        &self,
        bind_dn: &str,
        request: &SearchRequest,
    ) -> Result<SearchOutcome, DirectoryError> {
        (**self).search(bind_dn, request)
    }

    fn close(&self, bind_dn: &str) {
        (**self).close(bind_dn);
    }
}

/// Result of a search that reached the result stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchOutcome {
    /// Entries to stream back, in backend order.
    pub entries: Vec<DirectoryEntry>,
    /// Referral URLs; always empty.
    pub referrals: Vec<String>,
    /// Response control OIDs; always empty.
    pub controls: Vec<String>,
    /// Code carried by `SearchResultDone`.
    pub result_code: ResultCode,
}

impl SearchOutcome {
    /// Builds a successful outcome, truncating to a positive `size_limit`.
    #[must_use]
    pub fn new(mut entries: Vec<DirectoryEntry>, size_limit: i64) -> Self {
        let limit = usize::try_from(size_limit).ok().filter(|limit| *limit > 0);
        let result_code = match limit {
            Some(limit) if entries.len() > limit => {
                entries.truncate(limit);
                ResultCode::SizeLimitExceeded
            }
            _ => ResultCode::Success,
        };
        Self {
            entries,
            referrals: Vec::new(),
            controls: Vec::new(),
            result_code,
        }
    }
}

/// [`DirectoryHandler`] answering from an [`AccountsService`].
pub struct AccountsDirectoryHandler<A> {
    accounts: A,
    naming: DirectoryNaming,
    stats: Arc<FrontendStats>,
}

impl<A> AccountsDirectoryHandler<A>
where
    A: AccountsService,
{
    /// Builds a handler over `accounts`.
    pub const fn new(
        accounts: A,
        naming: DirectoryNaming,
        stats: Arc<FrontendStats>,
    ) -> Self {
        Self {
            accounts,
            naming,
            stats,
        }
    }
}

impl<A> DirectoryHandler for AccountsDirectoryHandler<A>
where
    A: AccountsService,
{
    fn bind(&self, bind_dn: &str, password: &str) -> Result<(), DirectoryError> {
        self.stats.record_bind_request();
        let rejected = |reason: String| DirectoryError::InvalidCredentials {
            bind_dn: bind_dn.to_owned(),
            reason,
        };

        let principal =
            authorize_bind(bind_dn, &self.naming).map_err(|error| rejected(error.to_string()))?;
        let accounts = self
            .accounts
            .list_accounts(&credential_query(principal.login(), password))
            .map_err(|error| rejected(error.to_string()))?;
        if accounts.is_empty() {
            return Err(rejected(format!(
                "no account matches login '{}'",
                principal.login()
            )));
        }

        self.stats.record_bind_success();
        Ok(())
    }

    fn search(
        &self,
        bind_dn: &str,
        request: &SearchRequest,
    ) -> Result<SearchOutcome, DirectoryError> {
        self.stats.record_search_request();
        authorize_search(bind_dn, &request.base_object, &self.naming)?;

        let filter = decode_filter(&request.filter).map_err(DirectoryError::Parse)?;
        let (domain, query) = compile(&filter)?.into_parts();
        debug!(
            target: DIRECTORY_TARGET,
            filter = %filter,
            domain = %domain,
            query = %query,
            "compiled search filter"
        );

        let entries = match domain {
            QueryDomain::Principals => {
                let selection = AttributeSelection::from_request(&request.attributes);
                self.accounts
                    .list_accounts(&query)?
                    .iter()
                    .map(|record| {
                        project(record, &self.naming).select(&selection, request.types_only)
                    })
                    .collect()
            }
            QueryDomain::Groups | QueryDomain::Unset => Vec::new(),
        };

        self.stats.record_search_success();
        Ok(SearchOutcome::new(entries, request.size_limit))
    }

    fn close(&self, _bind_dn: &str) {
        self.stats.record_close();
    }
}
