use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Claims issued by the identity provider for a staff session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtClaims {
    pub sub: String,
    pub exp: u64,
    pub iat: Option<u64>,
    pub email: Option<String>,
    pub role: Option<String>,
    pub aud: Option<String>,
}

/// The authenticated staff member, handed to every handler explicitly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: Option<String>,
    pub role: Option<String>,
    pub session_started_at: Option<DateTime<Utc>>,
}

impl User {
    /// Short label used in logs for who performed a mutation.
    pub fn actor(&self) -> &str {
        self.email.as_deref().unwrap_or(&self.id)
    }
}
