// SPDX-FileCopyrightText: 2026 Fieldwork Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model for the Fieldwork engine.
//!
//! Every section is `deny_unknown_fields` and falls back to its `Default`
//! impl, so an empty file yields a complete configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Top-level configuration, one field per TOML table.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct FieldworkConfig {
    pub logging: LoggingConfig,
    pub storage: StorageConfig,
    pub identity: IdentityConfig,
    pub scheduling: SchedulingConfig,
    pub billing: BillingConfig,
}

/// `[logging]`
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// One of trace, debug, info, warn, error. `RUST_LOG` wins when set.
    pub log_level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_level: "info".into(),
        }
    }
}

/// `[storage]`
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct StorageConfig {
    /// SQLite file; parent directories are created on open.
    pub database_path: String,
    pub wal_mode: bool,
    /// Wait on a locked database this long before a statement fails.
    pub busy_timeout_ms: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        let database_path = dirs::data_dir()
            .map(|dir| dir.join("fieldwork").join("fieldwork.db"))
            .unwrap_or_else(|| PathBuf::from("fieldwork.db"));
        Self {
            database_path: database_path.to_string_lossy().into_owned(),
            wal_mode: true,
            busy_timeout_ms: 5_000,
        }
    }
}

/// `[identity]`
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct IdentityConfig {
    /// Digits a contact identifier must have after normalization.
    pub identifier_digits: usize,
    /// Recorded for clients created without a city.
    pub default_city: String,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            identifier_digits: 10,
            default_city: "Unknown".into(),
        }
    }
}

/// `[scheduling]`
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct SchedulingConfig {
    /// When false, job cards are written without deriving renewals.
    pub enabled: bool,
    pub max_contract_months: u32,
}

impl Default for SchedulingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_contract_months: 120,
        }
    }
}

/// `[billing]`
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct BillingConfig {
    /// Applied when a job card carries no tax percent of its own.
    pub default_tax_percent: u8,
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            default_tax_percent: 18,
        }
    }
}
