//! Field-level validation.
//!
//! A [`Validator`] accumulates messages; it never short-circuits. Callers run
//! every check and then ask [`Validator::valid`], so a re-rendered form can
//! show all problems at once.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

/// Pattern for plausible email addresses (the WHATWG `input[type=email]` rule).
#[allow(clippy::expect_used)]
pub static EMAIL_RX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$",
    )
    .expect("email pattern is valid")
});

/// Accumulated validation errors for one form submission.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct Validator {
    pub field_errors: BTreeMap<String, Vec<String>>,
    pub non_field_errors: Vec<String>,
}

impl Validator {
    /// True when no field or non-field errors were recorded.
    pub fn valid(&self) -> bool {
        self.field_errors.is_empty() && self.non_field_errors.is_empty()
    }

    /// Record `message` against `field` unless `ok` holds.
    pub fn check_field(&mut self, ok: bool, field: &str, message: &str) {
        if !ok {
            self.add_field_error(field, message);
        }
    }

    pub fn add_field_error(&mut self, field: &str, message: &str) {
        self.field_errors
            .entry(field.to_string())
            .or_default()
            .push(message.to_string());
    }

    pub fn add_non_field_error(&mut self, message: &str) {
        self.non_field_errors.push(message.to_string());
    }

    /// Messages recorded against `field`, if any.
    pub fn field(&self, field: &str) -> &[String] {
        self.field_errors.get(field).map(Vec::as_slice).unwrap_or_default()
    }
}

/// True if the value contains something other than whitespace.
pub fn not_blank(value: &str) -> bool {
    !value.trim().is_empty()
}

/// True if the value has at most `n` characters.
pub fn max_chars(value: &str, n: usize) -> bool {
    value.chars().count() <= n
}

/// True if the value has at least `n` characters.
pub fn min_chars(value: &str, n: usize) -> bool {
    value.chars().count() >= n
}

pub fn matches(value: &str, rx: &Regex) -> bool {
    rx.is_match(value)
}

/// True if the value is one of `permitted`.
pub fn permitted_value<T: PartialEq>(value: &T, permitted: &[T]) -> bool {
    permitted.contains(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_validator_is_valid() {
        assert!(Validator::default().valid());
    }

    #[test]
    fn test_check_field_only_records_failures() {
        let mut v = Validator::default();
        v.check_field(true, "title", "never recorded");
        assert!(v.valid());

        v.check_field(false, "title", "This field cannot be blank");
        assert!(!v.valid());
        assert_eq!(v.field("title"), ["This field cannot be blank"]);
    }

    #[test]
    fn test_checks_accumulate() {
        let mut v = Validator::default();
        v.check_field(false, "password", "first");
        v.check_field(false, "password", "second");
        v.check_field(false, "email", "third");

        assert_eq!(v.field("password"), ["first", "second"]);
        assert_eq!(v.field("email"), ["third"]);
        assert!(v.field("name").is_empty());
    }

    #[test]
    fn test_non_field_errors_invalidate() {
        let mut v = Validator::default();
        v.add_non_field_error("Invalid Email or Password");
        assert!(!v.valid());
        assert!(v.field_errors.is_empty());
    }

    #[test]
    fn test_not_blank() {
        assert!(not_blank("x"));
        assert!(!not_blank(""));
        assert!(!not_blank(" \t\n"));
    }

    #[test]
    fn test_char_limits_count_characters_not_bytes() {
        assert!(max_chars("ééé", 3));
        assert!(!max_chars("éééé", 3));
        assert!(min_chars("ééé", 3));
        assert!(!min_chars("éé", 3));
    }

    #[test]
    fn test_email_pattern() {
        assert!(matches("alice@example.com", &EMAIL_RX));
        assert!(matches("a.b+tag@sub.example.co.uk", &EMAIL_RX));
        assert!(!matches("alice", &EMAIL_RX));
        assert!(!matches("alice@", &EMAIL_RX));
        assert!(!matches("@example.com", &EMAIL_RX));
        assert!(!matches("alice@-example.com", &EMAIL_RX));
    }

    #[test]
    fn test_permitted_value() {
        assert!(permitted_value(&7, &[1, 7, 365]));
        assert!(!permitted_value(&30, &[1, 7, 365]));
    }
}
