use std::fmt;
use std::fs::DirBuilder;
use std::net::SocketAddr;
use std::str::FromStr;

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// A socket the bridge listens on or connects to.
///
/// Configuration files may spell an endpoint either as a URL string
/// (`tcp://127.0.0.1:9125`, `unix:///run/dirbridge/ldap.sock`) or as a table
/// tagged by `transport`. Environment variables and CLI flags use the URL form.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(
    tag = "transport",
    rename_all = "snake_case",
    try_from = "EndpointRepr"
)]
pub enum SocketEndpoint {
    /// Unix domain socket endpoint.
    Unix {
        /// Filesystem path of the socket.
        path: Utf8PathBuf,
    },
    /// TCP socket endpoint.
    Tcp {
        /// Host name or address.
        host: String,
        /// TCP port.
        port: u16,
    },
}

impl SocketEndpoint {
    /// Builds a Unix domain socket endpoint.
    #[must_use]
    pub fn unix(path: impl Into<Utf8PathBuf>) -> Self {
        Self::Unix { path: path.into() }
    }

    /// Builds a TCP socket endpoint.
    #[must_use]
    pub fn tcp(host: impl Into<String>, port: u16) -> Self {
        Self::Tcp {
            host: host.into(),
            port,
        }
    }

    /// Returns the Unix socket path when the endpoint uses the Unix transport.
    #[must_use]
    pub fn unix_path(&self) -> Option<&Utf8Path> {
        match self {
            Self::Unix { path } => Some(path.as_ref()),
            Self::Tcp { .. } => None,
        }
    }

    /// Directory that must exist before a Unix socket can be bound.
    #[must_use]
    pub fn socket_directory(&self) -> Option<&Utf8Path> {
        self.unix_path().and_then(Utf8Path::parent)
    }

    /// Creates the parent directory of a Unix socket, owner-only on Unix.
    ///
    /// TCP endpoints need no preparation. An existing parent is accepted as
    /// long as it is a directory; its permissions are left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`SocketPreparationError`] when the path has no parent, the
    /// parent cannot be created, or the parent exists but is not a directory.
    pub fn prepare_filesystem(&self) -> Result<(), SocketPreparationError> {
        let Some(path) = self.unix_path() else {
            return Ok(());
        };
        let parent = self
            .socket_directory()
            .filter(|parent| !parent.as_str().is_empty())
            .ok_or_else(|| SocketPreparationError::MissingParent {
                path: path.to_path_buf(),
            })?;

        if parent.exists() {
            return if parent.is_dir() {
                Ok(())
            } else {
                Err(SocketPreparationError::NotADirectory {
                    path: parent.to_path_buf(),
                })
            };
        }

        let mut builder = DirBuilder::new();
        builder.recursive(true);
        #[cfg(unix)]
        std::os::unix::fs::DirBuilderExt::mode(&mut builder, SOCKET_DIRECTORY_MODE);
        builder
            .create(parent.as_std_path())
            .map_err(|source| SocketPreparationError::CreateDirectory {
                path: parent.to_path_buf(),
                source,
            })
    }
}

#[cfg(unix)]
const SOCKET_DIRECTORY_MODE: u32 = 0o700;

impl fmt::Display for SocketEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unix { path } => write!(f, "unix://{path}"),
            Self::Tcp { host, port } if host.contains(':') => {
                write!(f, "tcp://[{host}]:{port}")
            }
            Self::Tcp { host, port } => write!(f, "tcp://{host}:{port}"),
        }
    }
}

impl From<SocketAddr> for SocketEndpoint {
    fn from(addr: SocketAddr) -> Self {
        Self::tcp(addr.ip().to_string(), addr.port())
    }
}

impl FromStr for SocketEndpoint {
    type Err = SocketParseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let url = Url::parse(input).map_err(|source| SocketParseError::Url {
            input: input.to_owned(),
            source,
        })?;
        match url.scheme() {
            "tcp" => tcp_from_url(input, &url),
            "unix" => unix_from_url(input, &url),
            scheme => Err(SocketParseError::UnsupportedScheme {
                input: input.to_owned(),
                scheme: scheme.to_owned(),
            }),
        }
    }
}

fn tcp_from_url(input: &str, url: &Url) -> Result<SocketEndpoint, SocketParseError> {
    let missing = |part| SocketParseError::Missing {
        input: input.to_owned(),
        part,
    };
    let host = url
        .host_str()
        .filter(|host| !host.is_empty())
        .ok_or_else(|| missing("host"))?;
    // Bracketed IPv6 literals are stored without their brackets.
    let host = host.trim_start_matches('[').trim_end_matches(']');
    let port = url.port().ok_or_else(|| missing("port"))?;
    Ok(SocketEndpoint::tcp(host, port))
}

fn unix_from_url(input: &str, url: &Url) -> Result<SocketEndpoint, SocketParseError> {
    match url.path() {
        "" | "/" => Err(SocketParseError::Missing {
            input: input.to_owned(),
            part: "socket path",
        }),
        path => Ok(SocketEndpoint::unix(path)),
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum EndpointRepr {
    Url(String),
    Table(TaggedEndpoint),
}

#[derive(Deserialize)]
#[serde(tag = "transport", rename_all = "snake_case")]
enum TaggedEndpoint {
    Unix { path: Utf8PathBuf },
    Tcp { host: String, port: u16 },
}

impl TryFrom<EndpointRepr> for SocketEndpoint {
    type Error = SocketParseError;

    fn try_from(repr: EndpointRepr) -> Result<Self, Self::Error> {
        match repr {
            EndpointRepr::Url(text) => text.parse(),
            EndpointRepr::Table(TaggedEndpoint::Unix { path }) => Ok(Self::unix(path)),
            EndpointRepr::Table(TaggedEndpoint::Tcp { host, port }) => Ok(Self::tcp(host, port)),
        }
    }
}

/// Errors raised while parsing a [`SocketEndpoint`] URL.
#[derive(Debug, Error)]
pub enum SocketParseError {
    /// The text is not a URL.
    #[error("'{input}' is not a socket URL: {source}")]
    Url {
        /// Text that failed to parse.
        input: String,
        /// URL parser error.
        #[source]
        source: url::ParseError,
    },
    /// The scheme is neither `tcp` nor `unix`.
    #[error("unsupported socket scheme '{scheme}' in '{input}'")]
    UnsupportedScheme {
        /// Text that failed to parse.
        input: String,
        /// Scheme that was found.
        scheme: String,
    },
    /// A component the scheme requires is absent.
    #[error("missing {part} in '{input}'")]
    Missing {
        /// Text that failed to parse.
        input: String,
        /// Name of the missing component.
        part: &'static str,
    },
}

/// Errors raised while preparing the directory of a Unix socket.
#[derive(Debug, Error)]
pub enum SocketPreparationError {
    /// The socket path has no parent component.
    #[error("socket path '{path}' has no parent directory")]
    MissingParent {
        /// Configured socket path.
        path: Utf8PathBuf,
    },
    /// The parent path exists but is not a directory.
    #[error("socket directory '{path}' exists and is not a directory")]
    NotADirectory {
        /// Parent path.
        path: Utf8PathBuf,
    },
    /// The parent directory could not be created.
    #[error("failed to create socket directory '{path}': {source}")]
    CreateDirectory {
        /// Parent path.
        path: Utf8PathBuf,
        /// Filesystem error.
        #[source]
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[test]
    fn display_unix_socket() {
        let endpoint = SocketEndpoint::unix(Utf8PathBuf::from("/run/dirbridge/ldap.sock"));
        assert_eq!(endpoint.to_string(), "unix:///run/dirbridge/ldap.sock");
    }

    #[test]
    fn parse_tcp_socket() {
        let endpoint: SocketEndpoint = "tcp://127.0.0.1:9125".parse().expect("parse tcp");
        assert_eq!(endpoint, SocketEndpoint::tcp("127.0.0.1", 9125));
        assert_eq!(endpoint.socket_directory(), None);
    }

    #[test]
    fn parse_bracketed_ipv6_host() {
        let endpoint: SocketEndpoint = "tcp://[::1]:389".parse().expect("parse ipv6");
        assert_eq!(endpoint, SocketEndpoint::tcp("::1", 389));
    }

    #[rstest]
    #[case("127.0.0.1:9125", "tcp://127.0.0.1:9125")]
    #[case("[::1]:389", "tcp://[::1]:389")]
    fn bound_addresses_round_trip_through_text(#[case] addr: &str, #[case] text: &str) {
        let addr: SocketAddr = addr.parse().expect("socket address");
        let endpoint = SocketEndpoint::from(addr);
        assert_eq!(endpoint.to_string(), text);
        assert_eq!(text.parse::<SocketEndpoint>().expect("reparse"), endpoint);
    }

    #[test]
    fn reports_unsupported_scheme() {
        let error = "ldap://127.0.0.1:389"
            .parse::<SocketEndpoint>()
            .expect_err("ldap scheme is not a socket");
        assert!(matches!(
            error,
            SocketParseError::UnsupportedScheme { ref scheme, .. } if scheme == "ldap"
        ));
    }

    #[rstest]
    #[case("ldap://127.0.0.1:389")]
    #[case("tcp://127.0.0.1")]
    #[case("unix://")]
    #[case("not a url")]
    fn rejects_unusable_urls(#[case] input: &str) {
        assert!(input.parse::<SocketEndpoint>().is_err());
    }

    #[test]
    fn tcp_endpoints_need_no_preparation() {
        let endpoint = SocketEndpoint::tcp("127.0.0.1", 9125);
        assert!(endpoint.prepare_filesystem().is_ok());
    }

    #[test]
    fn prepares_unix_socket_parent() {
        let dir = tempfile::tempdir().expect("temp dir");
        let parent = dir.path().join("nested");
        let path = parent.join("ldap.sock");
        let endpoint = SocketEndpoint::unix(path.to_str().expect("utf8 path"));
        endpoint.prepare_filesystem().expect("prepare");
        assert!(parent.is_dir());
        endpoint.prepare_filesystem().expect("existing directory is accepted");
    }

    #[test]
    fn refuses_parent_that_is_a_file() {
        let dir = tempfile::tempdir().expect("temp dir");
        let parent = dir.path().join("occupied");
        std::fs::write(&parent, b"file").expect("write file");
        let path = parent.join("ldap.sock");
        let endpoint = SocketEndpoint::unix(path.to_str().expect("utf8 path"));
        let error = endpoint.prepare_filesystem().expect_err("parent is a file");
        assert!(matches!(error, SocketPreparationError::NotADirectory { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn created_directory_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().expect("temp dir");
        let parent = dir.path().join("private");
        let endpoint =
            SocketEndpoint::unix(parent.join("ldap.sock").to_str().expect("utf8 path"));
        endpoint.prepare_filesystem().expect("prepare");
        let mode = std::fs::metadata(&parent).expect("metadata").permissions().mode();
        assert_eq!(mode & 0o077, 0);
    }
}
