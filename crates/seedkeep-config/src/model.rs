//! Typed configuration consumed by the promoter.
//!
//! # Design
//! - Built once at startup and shared read-only; core logic never touches the environment.
//! - Secrets never appear in `Debug` output.

use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

/// Complete, validated configuration for one process lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromoterConfig {
    /// Download client connection details.
    pub client: ClientEndpoint,
    /// Category whose injections trigger a promotion.
    pub watch_category: String,
    /// Category assigned to the original torrent once promoted.
    pub promote_category: String,
    /// Storage roots for canonical content and tracker fan-out.
    pub storage: StorageRoots,
    /// Webhook listener settings.
    pub listen: ListenConfig,
    /// Requested log output format (`json` or `pretty`), when set.
    pub log_format: Option<String>,
}

/// Location and credentials of the qBittorrent Web API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientEndpoint {
    /// Hostname or address, optionally prefixed with a scheme.
    pub host: String,
    /// TCP port of the Web UI.
    pub port: u16,
    /// Login credentials.
    pub credentials: Credentials,
    /// Timeout applied to each request.
    pub timeout: Duration,
}

impl ClientEndpoint {
    /// Base URL of the Web API, defaulting to plain HTTP when no scheme is given.
    #[must_use]
    pub fn base_url(&self) -> String {
        let host = self.host.trim_end_matches('/');
        if host.starts_with("http://") || host.starts_with("https://") {
            format!("{host}:{}", self.port)
        } else {
            format!("http://{host}:{}", self.port)
        }
    }
}

/// Username/password pair for the download client.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Login name.
    pub username: String,
    /// Login secret.
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Root directories used by relocation and fan-out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageRoots {
    /// Long-term home for original content.
    pub canonical_root: PathBuf,
    /// Parent of the per-tracker namespaces holding duplicate links.
    pub cross_seed_root: PathBuf,
}

/// Socket the webhook server binds to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListenConfig {
    /// Interface address.
    pub bind_addr: IpAddr,
    /// TCP port.
    pub port: u16,
}

impl ListenConfig {
    /// Combined socket address.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_addr, self.port)
    }
}
