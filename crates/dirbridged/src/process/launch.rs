//! Launch sequencing for the bridge runtime.

use std::sync::Arc;

use tracing::info;

use dirbridge_config::SocketEndpoint;

use crate::accounts::{AccountsService, SocketAccountsClient};
use crate::bootstrap::{ConfigLoader, SystemConfigLoader, bootstrap_with};
use crate::directory::{AccountsDirectoryHandler, LoggingHandler};
use crate::health::{HealthReporter, StructuredHealthReporter};
use crate::session::LdapConnectionHandler;
use crate::transport::{ConnectionHandler, SocketListener};

use super::errors::LaunchError;
use super::shutdown::{ShutdownSignal, SystemShutdownSignal};
use super::{PROCESS_TARGET, SHUTDOWN_TIMEOUT};

/// Service dependencies required to construct the bridge runtime.
pub(crate) struct ServiceDeps<L, F> {
    pub(crate) loader: L,
    pub(crate) reporter: Arc<dyn HealthReporter>,
    /// Builds the accounts client from the configured endpoint.
    pub(crate) accounts: F,
}

/// Collaborators required to launch the bridge runtime.
pub(crate) struct LaunchPlan<L, F, S> {
    pub(crate) services: ServiceDeps<L, F>,
    pub(crate) shutdown: S,
}

/// Runs the bridge in the foreground using the production collaborators.
///
/// Blocks until a termination signal arrives.
pub fn run_bridge() -> Result<(), LaunchError> {
    let plan = LaunchPlan {
        services: ServiceDeps {
            loader: SystemConfigLoader,
            reporter: Arc::new(StructuredHealthReporter::new()),
            accounts: SocketAccountsClient::new,
        },
        shutdown: SystemShutdownSignal::new(SHUTDOWN_TIMEOUT),
    };
    run_bridge_with(plan)
}

/// Runs the bridge with injected collaborators.
pub(crate) fn run_bridge_with<L, F, A, S>(plan: LaunchPlan<L, F, S>) -> Result<(), LaunchError>
where
    L: ConfigLoader,
    F: FnOnce(SocketEndpoint) -> A,
    A: AccountsService + 'static,
    S: ShutdownSignal,
{
    let LaunchPlan { services, shutdown } = plan;
    let ServiceDeps {
        loader,
        reporter,
        accounts,
    } = services;

    info!(target: PROCESS_TARGET, "starting bridge runtime");
    let bridge = bootstrap_with(&loader, reporter)?;
    let config = bridge.config();

    let listener = SocketListener::bind(config.listen_socket())?;
    let endpoint = match listener.local_addr() {
        Some(addr) => SocketEndpoint::from(addr),
        None => config.listen_socket().clone(),
    };

    let directory = AccountsDirectoryHandler::new(
        accounts(config.accounts_socket().clone()),
        bridge.naming().clone(),
        Arc::clone(bridge.stats()),
    );
    let handler: Arc<dyn ConnectionHandler> =
        Arc::new(LdapConnectionHandler::new(LoggingHandler::new(directory)));

    let listener_handle = listener.start(handler)?;
    bridge.reporter().listener_ready(&endpoint);
    shutdown.wait()?;
    listener_handle.shutdown();
    listener_handle.join()?;

    let snapshot = bridge.stats().snapshot();
    bridge.reporter().shutdown_completed(&snapshot);
    info!(target: PROCESS_TARGET, "shutdown sequence completed");
    Ok(())
}
