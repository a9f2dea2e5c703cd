use crate::logging::LogFormat;
use crate::socket::SocketEndpoint;

/// Default TCP port for the directory listener.
pub const DEFAULT_LISTEN_PORT: u16 = 9125;

/// Default TCP port of the accounts service.
pub const DEFAULT_ACCOUNTS_PORT: u16 = 9181;

/// Default host for both endpoints.
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default base distinguished name served by the bridge.
pub const DEFAULT_BASE_DN: &str = "dc=example,dc=org";

/// Default naming attribute for principal entries.
pub const DEFAULT_NAME_FORMAT: &str = "cn";

/// Default naming attribute for the group container.
pub const DEFAULT_GROUP_FORMAT: &str = "ou";

/// Default log filter expression used by the daemon.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Default log filter expression used by the daemon.
pub fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Owned log filter value used where allocation is required (e.g. serde).
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_string()
}

/// Default logging format for the daemon.
pub fn default_log_format() -> LogFormat {
    LogFormat::Json
}

/// Endpoint the directory listener binds when nothing else is configured.
pub fn default_listen_socket() -> SocketEndpoint {
    SocketEndpoint::tcp(DEFAULT_HOST, DEFAULT_LISTEN_PORT)
}

/// Endpoint of the accounts service when nothing else is configured.
pub fn default_accounts_socket() -> SocketEndpoint {
    SocketEndpoint::tcp(DEFAULT_HOST, DEFAULT_ACCOUNTS_PORT)
}

/// Owned default base DN.
pub fn default_base_dn() -> String {
    DEFAULT_BASE_DN.to_string()
}

/// Owned default naming attribute for principals.
pub fn default_name_format() -> String {
    DEFAULT_NAME_FORMAT.to_string()
}

/// Owned default naming attribute for the group container.
pub fn default_group_format() -> String {
    DEFAULT_GROUP_FORMAT.to_string()
}
