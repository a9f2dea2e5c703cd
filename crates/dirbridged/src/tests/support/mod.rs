//! Shared doubles and harnesses for the daemon test suites.

mod accounts;
mod client;
mod config_loader;
mod reporter;
mod world;

pub use accounts::{FakeAccountsServer, MockAccounts, account, search_request, test_naming};
pub use client::LdapTestClient;
pub use config_loader::{FailingConfigLoader, TestConfigLoader};
pub use reporter::{HealthEvent, RecordingHealthReporter};
pub use world::{TestWorld, world};
