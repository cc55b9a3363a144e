//! Environment lookup for [`PromoterConfig`].
//!
//! # Design
//! - Lookups go through an injected closure so tests never mutate process state.
//! - Blank values count as unset; optional values fall back to [`crate::defaults`].

use std::net::IpAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use tracing::debug;

use crate::defaults;
use crate::error::{ConfigError, ConfigResult};
use crate::model::{ClientEndpoint, Credentials, ListenConfig, PromoterConfig, StorageRoots};
use crate::validate::validate;

/// Environment variable names recognised by the loader.
pub mod vars {
    /// Download client host.
    pub const QB_HOST: &str = "QB_HOST";
    /// Download client port.
    pub const QB_PORT: &str = "QB_PORT";
    /// Download client username.
    pub const QB_USER: &str = "QB_USER";
    /// Download client password.
    pub const QB_PASS: &str = "QB_PASS";
    /// Watched category.
    pub const QB_CATEGORY_WATCH: &str = "QB_CATEGORY_WATCH";
    /// Promoted category.
    pub const QB_CATEGORY_PROMOTE: &str = "QB_CATEGORY_PROMOTE";
    /// Canonical storage root.
    pub const CANONICAL_ROOT: &str = "SEEDKEEP_CANONICAL_ROOT";
    /// Fan-out storage root.
    pub const CROSS_SEED_ROOT: &str = "SEEDKEEP_CROSS_SEED_ROOT";
    /// Webhook bind address.
    pub const BIND_ADDR: &str = "SEEDKEEP_BIND_ADDR";
    /// Webhook port.
    pub const PORT: &str = "SEEDKEEP_PORT";
    /// Download client request timeout in seconds.
    pub const HTTP_TIMEOUT_SECS: &str = "SEEDKEEP_HTTP_TIMEOUT_SECS";
    /// Log output format.
    pub const LOG_FORMAT: &str = "SEEDKEEP_LOG_FORMAT";
}

/// Load configuration from the process environment.
///
/// # Errors
///
/// Returns an error when a required variable is missing or any value fails validation.
pub fn load_from_env() -> ConfigResult<PromoterConfig> {
    load_from(|name| std::env::var(name).ok())
}

/// Load configuration through an arbitrary variable lookup.
///
/// # Errors
///
/// Returns an error when a required variable is missing or any value fails validation.
pub fn load_from<F>(lookup: F) -> ConfigResult<PromoterConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let env = Lookup(lookup);

    let credentials = Credentials {
        username: env.required(vars::QB_USER)?,
        password: env.required(vars::QB_PASS)?,
    };
    let client = ClientEndpoint {
        host: env.or_default(vars::QB_HOST, defaults::CLIENT_HOST),
        port: env.parsed(vars::QB_PORT, "client_port", defaults::CLIENT_PORT)?,
        credentials,
        timeout: Duration::from_secs(env.parsed(
            vars::HTTP_TIMEOUT_SECS,
            "http_timeout_secs",
            defaults::HTTP_TIMEOUT_SECS,
        )?),
    };
    let storage = StorageRoots {
        canonical_root: PathBuf::from(env.required(vars::CANONICAL_ROOT)?),
        cross_seed_root: PathBuf::from(env.required(vars::CROSS_SEED_ROOT)?),
    };
    let default_bind = IpAddr::from_str(defaults::BIND_ADDR)
        .map_err(|_| ConfigError::invalid("bind_addr", "not_an_ip", defaults::BIND_ADDR))?;
    let listen = ListenConfig {
        bind_addr: env.parsed(vars::BIND_ADDR, "bind_addr", default_bind)?,
        port: env.parsed(vars::PORT, "listen_port", defaults::LISTEN_PORT)?,
    };

    let config = PromoterConfig {
        client,
        watch_category: env.or_default(vars::QB_CATEGORY_WATCH, defaults::WATCH_CATEGORY),
        promote_category: env.or_default(vars::QB_CATEGORY_PROMOTE, defaults::PROMOTE_CATEGORY),
        storage,
        listen,
        log_format: env.optional(vars::LOG_FORMAT),
    };
    validate(&config)?;
    Ok(config)
}

struct Lookup<F>(F);

impl<F> Lookup<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn optional(&self, name: &str) -> Option<String> {
        (self.0)(name)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    }

    fn required(&self, name: &'static str) -> ConfigResult<String> {
        self.optional(name).ok_or(ConfigError::MissingEnv { name })
    }

    fn or_default(&self, name: &str, fallback: &str) -> String {
        self.optional(name).unwrap_or_else(|| {
            debug!(variable = name, fallback, "using default configuration value");
            fallback.to_string()
        })
    }

    fn parsed<T: FromStr>(&self, name: &str, field: &'static str, fallback: T) -> ConfigResult<T> {
        self.optional(name).map_or(Ok(fallback), |raw| {
            raw.parse::<T>()
                .map_err(|_| ConfigError::invalid(field, "unparsable", raw))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn required_vars() -> HashMap<&'static str, &'static str> {
        HashMap::from([
            (vars::QB_USER, "admin"),
            (vars::QB_PASS, "adminadmin"),
            (vars::CANONICAL_ROOT, "/data/longterm"),
            (vars::CROSS_SEED_ROOT, "/data/cross-seed"),
        ])
    }

    fn load(env: &HashMap<&'static str, &'static str>) -> ConfigResult<PromoterConfig> {
        load_from(|name| env.get(name).map(|value| (*value).to_string()))
    }

    #[test]
    fn defaults_fill_optional_values() -> anyhow::Result<()> {
        let config = load(&required_vars())?;
        assert_eq!(config.client.host, "localhost");
        assert_eq!(config.client.port, 8080);
        assert_eq!(config.watch_category, "race");
        assert_eq!(config.promote_category, "longterm");
        assert_eq!(config.listen.port, 9092);
        assert_eq!(config.listen.socket_addr().to_string(), "0.0.0.0:9092");
        assert_eq!(config.client.timeout, Duration::from_secs(30));
        assert_eq!(config.log_format, None);
        Ok(())
    }

    #[test]
    fn overrides_are_honoured() -> anyhow::Result<()> {
        let mut env = required_vars();
        env.insert(vars::QB_HOST, "qbittorrent");
        env.insert(vars::QB_PORT, "8081");
        env.insert(vars::QB_CATEGORY_WATCH, "cross-seed");
        env.insert(vars::BIND_ADDR, "127.0.0.1");
        env.insert(vars::LOG_FORMAT, "json");
        let config = load(&env)?;
        assert_eq!(config.client.base_url(), "http://qbittorrent:8081");
        assert_eq!(config.watch_category, "cross-seed");
        assert_eq!(config.listen.socket_addr().to_string(), "127.0.0.1:9092");
        assert_eq!(config.log_format.as_deref(), Some("json"));
        Ok(())
    }

    #[test]
    fn missing_credentials_are_fatal() {
        let mut env = required_vars();
        env.remove(vars::QB_PASS);
        assert_eq!(
            load(&env),
            Err(ConfigError::MissingEnv {
                name: vars::QB_PASS
            })
        );
    }

    #[test]
    fn blank_values_count_as_missing() {
        let mut env = required_vars();
        env.insert(vars::QB_USER, "   ");
        assert!(matches!(
            load(&env),
            Err(ConfigError::MissingEnv { name }) if name == vars::QB_USER
        ));
    }

    #[test]
    fn unparsable_port_is_rejected() {
        let mut env = required_vars();
        env.insert(vars::QB_PORT, "eighty");
        assert!(matches!(
            load(&env),
            Err(ConfigError::InvalidField {
                field: "client_port",
                ..
            })
        ));
    }
}
