//! Cross-field validation applied after loading.

use std::path::Path;

use crate::error::{ConfigError, ConfigResult};
use crate::model::PromoterConfig;

/// Check invariants that individual lookups cannot express.
///
/// # Errors
///
/// Returns the first violated rule as [`ConfigError::InvalidField`].
pub fn validate(config: &PromoterConfig) -> ConfigResult<()> {
    ensure_port("client_port", config.client.port)?;
    ensure_port("listen_port", config.listen.port)?;

    if config.client.timeout.is_zero() {
        return Err(ConfigError::invalid("http_timeout_secs", "zero", "0"));
    }

    if config.watch_category == config.promote_category {
        return Err(ConfigError::invalid(
            "promote_category",
            "same_as_watch_category",
            config.promote_category.clone(),
        ));
    }

    let canonical = &config.storage.canonical_root;
    let cross_seed = &config.storage.cross_seed_root;
    ensure_absolute("canonical_root", canonical)?;
    ensure_absolute("cross_seed_root", cross_seed)?;
    if canonical.starts_with(cross_seed) || cross_seed.starts_with(canonical) {
        return Err(ConfigError::invalid(
            "cross_seed_root",
            "overlaps_canonical_root",
            cross_seed.display().to_string(),
        ));
    }

    if let Some(format) = config.log_format.as_deref()
        && !matches!(format, "json" | "pretty")
    {
        return Err(ConfigError::invalid("log_format", "unsupported", format));
    }

    Ok(())
}

fn ensure_port(field: &'static str, port: u16) -> ConfigResult<()> {
    if port == 0 {
        return Err(ConfigError::invalid(field, "zero", "0"));
    }
    Ok(())
}

fn ensure_absolute(field: &'static str, path: &Path) -> ConfigResult<()> {
    if !path.is_absolute() {
        return Err(ConfigError::invalid(
            field,
            "not_absolute",
            path.display().to_string(),
        ));
    }
    Ok(())
}
