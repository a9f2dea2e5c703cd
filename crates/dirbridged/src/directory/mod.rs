//! Directory semantics: authorization, entry projection and the session
//! handler that ties them to the accounts service.
//!
//! Handlers compose as middleware. The bridge serves
//! `LoggingHandler<AccountsDirectoryHandler<_>>`; every layer implements
//! [`DirectoryHandler`] and forwards what it does not change.

mod authz;
mod entry;
mod errors;
mod handler;
mod middleware;
mod projector;
mod stats;

pub use self::authz::{AuthzError, BindPrincipal, authorize_bind, authorize_search};
pub use self::entry::{AttributeSelection, DirectoryEntry, EntryAttribute};
pub use self::errors::DirectoryError;
pub use self::handler::{AccountsDirectoryHandler, DirectoryHandler, SearchOutcome};
pub use self::middleware::LoggingHandler;
pub use self::projector::{PRINCIPAL_OBJECT_CLASSES, project};
pub use self::stats::{FrontendStats, StatsSnapshot};

pub(crate) const DIRECTORY_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::directory");
