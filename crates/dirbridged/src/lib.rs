//! LDAPv3 front end for the accounts service.
//!
//! The bridge accepts directory clients on a TCP or Unix socket, decodes
//! their bind and search requests, and answers them from the accounts service.
//! Search filters are compiled into the backend's `field eq 'value'` language
//! by [`dirbridge_filter`]; every returned account is projected into a
//! `posixAccount` entry under the configured base DN.
//!
//! Start-up runs in two phases. [`bootstrap_with`] loads configuration,
//! installs telemetry, validates the naming conventions and prepares the
//! socket directory, reporting each outcome to a [`HealthReporter`].
//! [`run_bridge`] then binds the listener, serves sessions until a termination
//! signal arrives, and reports the final request counters.

pub mod accounts;
mod bootstrap;
pub mod directory;
mod health;
mod process;
pub mod protocol;
mod session;
mod telemetry;
mod transport;

pub use bootstrap::{Bridge, BootstrapError, ConfigLoader, SystemConfigLoader, bootstrap_with};
pub use health::{HealthReporter, StructuredHealthReporter};
pub use process::{LaunchError, run_bridge};
pub use telemetry::{TelemetryError, TelemetryHandle};
pub use transport::ListenerError;

#[cfg(test)]
mod tests;
