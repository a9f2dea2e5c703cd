//! Test configuration loaders for scenarios covering success and failure paths.

use std::ffi::OsString;
use std::sync::Arc;

use ortho_config::{OrthoConfig as _, OrthoError};
use tempfile::TempDir;

use dirbridge_config::{Config, SocketEndpoint};

use crate::bootstrap::ConfigLoader;

/// Loader that places the listener on a Unix socket under a temporary
/// directory, or on an ephemeral TCP port.
pub struct TestConfigLoader {
    socket_dir: TempDir,
    overrides: Config,
}

impl TestConfigLoader {
    /// Listener on `<tempdir>/run/ldap.sock`.
    #[must_use]
    pub fn new() -> Self {
        let socket_dir =
            TempDir::new().expect("failed to create temporary directory for socket");
        let path = socket_dir.path().join("run").join("ldap.sock");
        let path = path
            .to_str()
            .expect("temporary socket path was not valid UTF-8")
            .to_owned();
        Self {
            socket_dir,
            overrides: Config {
                listen_socket: SocketEndpoint::unix(path),
                ..Config::default()
            },
        }
    }

    /// Listener on `127.0.0.1:0`.
    #[must_use]
    pub fn tcp() -> Self {
        Self::new().with_listen_socket(SocketEndpoint::tcp("127.0.0.1", 0))
    }

    /// Replaces the listener endpoint.
    #[must_use]
    pub fn with_listen_socket(mut self, endpoint: SocketEndpoint) -> Self {
        self.overrides.listen_socket = endpoint;
        self
    }

    /// Replaces the accounts service endpoint.
    #[must_use]
    pub fn with_accounts_socket(mut self, endpoint: SocketEndpoint) -> Self {
        self.overrides.accounts_socket = endpoint;
        self
    }

    /// Replaces the base DN, which may be invalid.
    #[must_use]
    pub fn with_base_dn(mut self, base_dn: &str) -> Self {
        self.overrides.base_dn = base_dn.to_owned();
        self
    }

    /// Directory holding the Unix socket.
    #[must_use]
    pub fn socket_dir(&self) -> &std::path::Path {
        self.socket_dir.path()
    }
}

impl ConfigLoader for TestConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Ok(self.overrides.clone())
    }
}

/// Loader that intentionally fails by passing invalid CLI arguments.
pub struct FailingConfigLoader;

impl ConfigLoader for FailingConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        let args = vec![
            OsString::from("dirbridged"),
            OsString::from("--listen-socket"),
            OsString::from("invalid://socket"),
        ];
        Config::load_from_iter(args)
    }
}
