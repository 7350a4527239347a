use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;
use thiserror::Error;

const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";

static KEY_COLUMNS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Key \(([^)]+)\)").expect("static regex"));
static CONSTRAINT_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"constraint "([^"]+)""#).expect("static regex"));

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Duplicate value for {0}")]
    UniqueViolation(String),

    #[error("Foreign key constraint violated: {0}")]
    ForeignKeyViolation(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Error payload PostgREST returns for failed statements.
#[derive(Debug, Deserialize)]
struct PostgrestErrorBody {
    code: Option<String>,
    message: Option<String>,
    details: Option<String>,
}

impl DatabaseError {
    /// Classifies a non-2xx PostgREST response by its SQLSTATE code.
    pub fn from_response(status: u16, body: &str) -> Self {
        let parsed: Option<PostgrestErrorBody> = serde_json::from_str(body).ok();

        let Some(parsed) = parsed else {
            return match status {
                401 | 403 => DatabaseError::Auth(body.to_string()),
                _ => DatabaseError::Api { status, message: body.to_string() },
            };
        };

        let message = parsed.message.clone().unwrap_or_else(|| body.to_string());
        match parsed.code.as_deref() {
            Some(UNIQUE_VIOLATION) => {
                DatabaseError::UniqueViolation(violated_columns(&parsed).unwrap_or(message))
            }
            Some(FOREIGN_KEY_VIOLATION) => {
                DatabaseError::ForeignKeyViolation(parsed.details.unwrap_or(message))
            }
            _ if status == 401 || status == 403 => DatabaseError::Auth(message),
            _ => DatabaseError::Api { status, message },
        }
    }
}

/// `Key (email)=(a@b.c) already exists.` yields `email`; falls back to the
/// constraint name from the message.
fn violated_columns(body: &PostgrestErrorBody) -> Option<String> {
    body.details
        .as_deref()
        .and_then(|details| KEY_COLUMNS.captures(details))
        .or_else(|| body.message.as_deref().and_then(|m| CONSTRAINT_NAME.captures(m)))
        .map(|caps| caps[1].replace('"', ""))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn classifies_unique_violation_with_column() {
        let body = r#"{"code":"23505","details":"Key (email)=(ana@clinic.com) already exists.","hint":null,"message":"duplicate key value violates unique constraint \"physicians_email_key\""}"#;
        assert_matches!(
            DatabaseError::from_response(409, body),
            DatabaseError::UniqueViolation(column) if column == "email"
        );
    }

    #[test]
    fn falls_back_to_constraint_name() {
        let body = r#"{"code":"23505","details":null,"hint":null,"message":"duplicate key value violates unique constraint \"appointments_active_slot_idx\""}"#;
        assert_matches!(
            DatabaseError::from_response(409, body),
            DatabaseError::UniqueViolation(column) if column == "appointments_active_slot_idx"
        );
    }

    #[test]
    fn classifies_foreign_key_violation() {
        let body = r#"{"code":"23503","details":"Key (id)=(abc) is still referenced from table \"appointments\".","hint":null,"message":"update or delete on table \"physicians\" violates foreign key constraint"}"#;
        assert_matches!(
            DatabaseError::from_response(409, body),
            DatabaseError::ForeignKeyViolation(details) if details.contains("appointments")
        );
    }

    #[test]
    fn non_json_bodies_keep_status() {
        assert_matches!(DatabaseError::from_response(401, "nope"), DatabaseError::Auth(_));
        assert_matches!(
            DatabaseError::from_response(502, "<html>bad gateway</html>"),
            DatabaseError::Api { status: 502, .. }
        );
    }
}
