use std::sync::LazyLock;

use regex::Regex;

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("static regex")
});

pub fn is_valid_email(email: &str) -> bool {
    EMAIL.is_match(email.trim())
}

/// Emails are compared and stored lowercased.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Trims a required text field; blank counts as missing.
pub fn required(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Builds the `Missing required fields: a, b` message, or `None` when
/// nothing is missing.
pub fn missing_fields_message(fields: &[(&str, bool)]) -> Option<String> {
    let missing: Vec<&str> = fields
        .iter()
        .filter(|(_, present)| !present)
        .map(|(name, _)| *name)
        .collect();

    if missing.is_empty() {
        None
    } else {
        Some(format!("Missing required fields: {}", missing.join(", ")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_shape() {
        assert!(is_valid_email("ana.souza@clinic.com"));
        assert!(is_valid_email("  carlos@mail.com.br "));
        assert!(!is_valid_email("ana.souza"));
        assert!(!is_valid_email("ana @clinic.com"));
        assert!(!is_valid_email("ana@clinic"));
    }

    #[test]
    fn emails_are_lowercased() {
        assert_eq!(normalize_email(" Ana.Souza@Clinic.COM "), "ana.souza@clinic.com");
    }

    #[test]
    fn blank_is_missing() {
        assert_eq!(required(Some("  Ana ".into())), Some("Ana".to_string()));
        assert_eq!(required(Some("   ".into())), None);
        assert_eq!(required(None), None);
    }

    #[test]
    fn lists_missing_fields_in_order() {
        assert_eq!(
            missing_fields_message(&[("date", true), ("time", false), ("patient_id", false)]),
            Some("Missing required fields: time, patient_id".to_string())
        );
        assert_eq!(missing_fields_message(&[("date", true)]), None);
    }
}
