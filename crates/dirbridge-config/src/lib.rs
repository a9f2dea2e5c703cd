//! Layered configuration for the directory bridge.
//!
//! Values are resolved by `ortho_config` from, in increasing precedence, the
//! built-in defaults, a TOML configuration file (`--config-path` or
//! `DIRBRIDGE_CONFIG_PATH`), `DIRBRIDGE_*` environment variables, and
//! command-line flags.

mod defaults;
mod logging;
mod naming;
mod socket;

use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

pub use defaults::{
    DEFAULT_ACCOUNTS_PORT, DEFAULT_BASE_DN, DEFAULT_GROUP_FORMAT, DEFAULT_HOST,
    DEFAULT_LISTEN_PORT, DEFAULT_LOG_FILTER, DEFAULT_NAME_FORMAT, default_accounts_socket,
    default_base_dn, default_group_format, default_listen_socket, default_log_filter,
    default_log_filter_string, default_log_format, default_name_format,
};
pub use logging::{LogFormat, LogFormatParseError};
pub use naming::{DirectoryNaming, NamingError, USERS_CONTAINER};
pub use socket::{SocketEndpoint, SocketParseError, SocketPreparationError};

/// Resolved configuration for the bridge daemon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "DIRBRIDGE")]
pub struct Config {
    /// Endpoint the directory listener binds.
    #[ortho_config(default = default_listen_socket())]
    pub listen_socket: SocketEndpoint,
    /// Endpoint of the accounts service.
    #[ortho_config(default = default_accounts_socket())]
    pub accounts_socket: SocketEndpoint,
    /// Base distinguished name served by the bridge.
    #[ortho_config(default = default_base_dn())]
    pub base_dn: String,
    /// Naming attribute for principal RDNs.
    #[ortho_config(default = default_name_format())]
    pub name_format: String,
    /// Naming attribute for the group container RDN.
    #[ortho_config(default = default_group_format())]
    pub group_format: String,
    /// `tracing` filter expression.
    #[ortho_config(default = default_log_filter_string())]
    pub log_filter: String,
    /// Log output format.
    #[ortho_config(default = default_log_format())]
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_socket: default_listen_socket(),
            accounts_socket: default_accounts_socket(),
            base_dn: default_base_dn(),
            name_format: default_name_format(),
            group_format: default_group_format(),
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
        }
    }
}

impl Config {
    /// Endpoint the directory listener binds.
    #[must_use]
    pub fn listen_socket(&self) -> &SocketEndpoint {
        &self.listen_socket
    }

    /// Endpoint of the accounts service.
    #[must_use]
    pub fn accounts_socket(&self) -> &SocketEndpoint {
        &self.accounts_socket
    }

    /// Base distinguished name served by the bridge.
    #[must_use]
    pub fn base_dn(&self) -> &str {
        self.base_dn.as_str()
    }

    /// Naming attribute for principal RDNs.
    #[must_use]
    pub fn name_format(&self) -> &str {
        self.name_format.as_str()
    }

    /// Naming attribute for the group container RDN.
    #[must_use]
    pub fn group_format(&self) -> &str {
        self.group_format.as_str()
    }

    /// `tracing` filter expression.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        self.log_filter.as_str()
    }

    /// Log output format.
    #[must_use]
    pub fn log_format(&self) -> LogFormat {
        self.log_format
    }
}
