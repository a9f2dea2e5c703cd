//! Capability-preserving wrappers around a [`DirectoryHandler`].

use tracing::{debug, info, warn};

use crate::protocol::SearchRequest;

use super::{DIRECTORY_TARGET, DirectoryError, DirectoryHandler, SearchOutcome};

/// Emits a structured event for every call and forwards it unchanged.
///
/// Passwords are never recorded.
pub struct LoggingHandler<H> {
    inner: H,
}

impl<H> LoggingHandler<H> {
    /// Wraps `inner`.
    pub const fn new(inner: H) -> Self {
        Self { inner }
    }
}

impl<H> DirectoryHandler for LoggingHandler<H>
where
    H: DirectoryHandler,
{
    fn bind(&self, bind_dn: &str, password: &str) -> Result<(), DirectoryError> {
        debug!(target: DIRECTORY_TARGET, event = "bind", bind_dn, "bind request");
        let result = self.inner.bind(bind_dn, password);
        match &result {
            Ok(()) => info!(
                target: DIRECTORY_TARGET,
                event = "bind",
                bind_dn,
                "bind succeeded"
            ),
            Err(error) => warn!(
                target: DIRECTORY_TARGET,
                event = "bind",
                bind_dn,
                result_code = %error.result_code(),
                error = %error,
                "bind failed"
            ),
        }
        result
    }

    fn search(
        &self,
        bind_dn: &str,
        request: &SearchRequest,
    ) -> Result<SearchOutcome, DirectoryError> {
        debug!(
            target: DIRECTORY_TARGET,
            event = "search",
            bind_dn,
            base = %request.base_object,
            scope = ?request.scope,
            "search request"
        );
        let result = self.inner.search(bind_dn, request);
        match &result {
            Ok(outcome) => info!(
                target: DIRECTORY_TARGET,
                event = "search",
                bind_dn,
                base = %request.base_object,
                entries = outcome.entries.len(),
                result_code = %outcome.result_code,
                "search completed"
            ),
            Err(error) => warn!(
                target: DIRECTORY_TARGET,
                event = "search",
                bind_dn,
                base = %request.base_object,
                result_code = %error.result_code(),
                error = %error,
                "search failed"
            ),
        }
        result
    }

    fn close(&self, bind_dn: &str) {
        debug!(target: DIRECTORY_TARGET, event = "close", bind_dn, "session closed");
        self.inner.close(bind_dn);
    }
}
