//! Fallback values applied when optional environment variables are unset.

/// Default qBittorrent Web UI host.
pub const CLIENT_HOST: &str = "localhost";
/// Default qBittorrent Web UI port.
pub const CLIENT_PORT: u16 = 8080;
/// Category whose injections trigger a promotion.
pub const WATCH_CATEGORY: &str = "race";
/// Category assigned once a promotion completes.
pub const PROMOTE_CATEGORY: &str = "longterm";
/// Webhook listener bind address.
pub const BIND_ADDR: &str = "0.0.0.0";
/// Webhook listener port.
pub const LISTEN_PORT: u16 = 9092;
/// Per-request timeout applied to the download client, in seconds.
pub const HTTP_TIMEOUT_SECS: u64 = 30;
