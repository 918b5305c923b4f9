// SPDX-FileCopyrightText: 2026 Fieldwork Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Semantic checks that serde cannot express.
//!
//! Every rule runs; the caller gets all violations at once.

use std::ops::RangeInclusive;

use crate::diagnostic::ConfigError;
use crate::model::FieldworkConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

const IDENTIFIER_DIGITS: RangeInclusive<usize> = 7..=15;

/// Check `config` and return every violated rule.
pub fn validate_config(config: &FieldworkConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut require = |ok: bool, message: String| {
        if !ok {
            errors.push(ConfigError::Validation { message });
        }
    };

    require(
        !config.storage.database_path.trim().is_empty(),
        "storage.database_path must not be empty".into(),
    );

    let level = &config.logging.log_level;
    require(
        LOG_LEVELS.contains(&level.trim().to_ascii_lowercase().as_str()),
        format!("logging.log_level `{level}` must be one of {}", LOG_LEVELS.join(", ")),
    );

    let digits = config.identity.identifier_digits;
    require(
        IDENTIFIER_DIGITS.contains(&digits),
        format!(
            "identity.identifier_digits must be between {} and {}, got {digits}",
            IDENTIFIER_DIGITS.start(),
            IDENTIFIER_DIGITS.end()
        ),
    );

    require(
        !config.identity.default_city.trim().is_empty(),
        "identity.default_city must not be empty".into(),
    );

    require(
        config.scheduling.max_contract_months >= 1,
        "scheduling.max_contract_months must be at least 1".into(),
    );

    let tax = config.billing.default_tax_percent;
    require(
        tax <= 100,
        format!("billing.default_tax_percent must be between 0 and 100, got {tax}"),
    );

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}
