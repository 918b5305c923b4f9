// SPDX-FileCopyrightText: 2026 Fieldwork Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./fieldwork.toml` > `~/.config/fieldwork/fieldwork.toml`
//! > `/etc/fieldwork/fieldwork.toml` with environment variable overrides via
//! the `FIELDWORK_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::FieldworkConfig;

/// Top-level sections that environment variables can address.
const SECTIONS: &[&str] = &["logging", "storage", "identity", "scheduling", "billing"];

pub(crate) const SYSTEM_CONFIG_PATH: &str = "/etc/fieldwork/fieldwork.toml";
pub(crate) const LOCAL_CONFIG_PATH: &str = "fieldwork.toml";

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/fieldwork/fieldwork.toml` (system-wide)
/// 3. `~/.config/fieldwork/fieldwork.toml` (user XDG config)
/// 4. `./fieldwork.toml` (local directory)
/// 5. `FIELDWORK_*` environment variables
pub fn load_config() -> Result<FieldworkConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<FieldworkConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(FieldworkConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<FieldworkConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(FieldworkConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading.
///
/// Returns the Figment before extraction so callers can inspect metadata.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(FieldworkConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG_PATH))
        .merge(Toml::file(user_config_path().unwrap_or_default()))
        .merge(Toml::file(LOCAL_CONFIG_PATH))
        .merge(env_provider())
}

pub(crate) fn user_config_path() -> Option<std::path::PathBuf> {
    dirs::config_dir().map(|d| d.join("fieldwork").join("fieldwork.toml"))
}

/// Create the environment variable provider with explicit section-to-dot mapping.
///
/// Only the first underscore after a known section name becomes a dot, so
/// `FIELDWORK_STORAGE_DATABASE_PATH` maps to `storage.database_path`, not
/// `storage.database.path`.
fn env_provider() -> Env {
    Env::prefixed("FIELDWORK_").map(|key| map_env_key(key.as_str()).into())
}

/// Map a lowercased, prefix-stripped env var name to a dotted config path.
pub(crate) fn map_env_key(key: &str) -> String {
    for section in SECTIONS {
        if let Some(rest) = key
            .strip_prefix(section)
            .and_then(|rest| rest.strip_prefix('_'))
        {
            return format!("{section}.{rest}");
        }
    }
    key.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_keys_map_first_underscore_after_section() {
        assert_eq!(map_env_key("storage_database_path"), "storage.database_path");
        assert_eq!(
            map_env_key("identity_identifier_digits"),
            "identity.identifier_digits"
        );
        assert_eq!(
            map_env_key("scheduling_max_contract_months"),
            "scheduling.max_contract_months"
        );
        assert_eq!(map_env_key("unrelated_key"), "unrelated_key");
    }
}
