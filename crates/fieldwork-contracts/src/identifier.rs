// SPDX-FileCopyrightText: 2026 Fieldwork Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Contact identifier normalization.
//!
//! A normalized identifier is exactly `expected_digits` ASCII digits. Spaces,
//! dashes, dots, slashes, and parentheses are separators and are dropped;
//! anything else (letters, `+`) makes the input invalid.

use fieldwork_core::FieldworkError;

fn is_separator(c: char) -> bool {
    c.is_whitespace() || matches!(c, '-' | '(' | ')' | '.' | '/')
}

/// Strip separators and check the digit count.
pub fn normalize_identifier(raw: &str, expected_digits: usize) -> Result<String, FieldworkError> {
    let normalized: String = raw.chars().filter(|c| !is_separator(*c)).collect();
    if normalized.len() == expected_digits && normalized.bytes().all(|b| b.is_ascii_digit()) {
        Ok(normalized)
    } else {
        Err(FieldworkError::InvalidIdentifier {
            input: raw.to_string(),
            expected_digits,
        })
    }
}

/// Whether `stored` is already in normalized form.
pub fn is_normalized(stored: &str, expected_digits: usize) -> bool {
    stored.len() == expected_digits && stored.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn strips_common_separators() {
        for raw in [
            "9876543210",
            " 987-654-3210 ",
            "(987) 654 3210",
            "987.654.3210",
            "98765\t43210",
        ] {
            assert_eq!(normalize_identifier(raw, 10).unwrap(), "9876543210", "{raw:?}");
        }
    }

    #[test]
    fn rejects_wrong_length_and_letters() {
        for raw in ["", "12345", "98765432101", "98765o4321", "+919876543210"] {
            let err = normalize_identifier(raw, 10).unwrap_err();
            assert!(
                matches!(err, FieldworkError::InvalidIdentifier { expected_digits: 10, .. }),
                "{raw:?} -> {err:?}"
            );
        }
    }

    #[test]
    fn digit_count_is_configurable() {
        assert_eq!(normalize_identifier("0-20-1234-5678", 11).unwrap(), "02012345678");
        assert!(normalize_identifier("0-20-1234-5678", 10).is_err());
    }

    #[test]
    fn normalized_check() {
        assert!(is_normalized("9876543210", 10));
        assert!(!is_normalized("987 654 3210", 10));
        assert!(!is_normalized("987654321", 10));
    }

    proptest! {
        #[test]
        fn separators_never_change_the_result(
            digits in "[0-9]{10}",
            seps in proptest::collection::vec(prop_oneof![Just(' '), Just('-'), Just('.')], 10),
        ) {
            let decorated: String = digits
                .chars()
                .zip(seps)
                .flat_map(|(d, s)| [d, s])
                .collect();
            prop_assert_eq!(normalize_identifier(&decorated, 10).unwrap(), digits.clone());
            prop_assert_eq!(normalize_identifier(&digits, 10).unwrap(), digits);
        }
    }
}
