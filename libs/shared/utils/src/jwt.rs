use chrono::{TimeZone, Utc};
use jsonwebtoken::{decode, errors::ErrorKind, Algorithm, DecodingKey, Validation};
use tracing::debug;

use shared_models::auth::{JwtClaims, User};

/// Verifies an HS256 session token and turns its claims into a [`User`].
///
/// The audience is only checked when one is configured.
pub fn validate_token(token: &str, jwt_secret: &str, audience: Option<&str>) -> Result<User, String> {
    if jwt_secret.is_empty() {
        return Err("JWT secret is not set".to_string());
    }

    let mut validation = Validation::new(Algorithm::HS256);
    match audience {
        Some(aud) => validation.set_audience(&[aud]),
        None => validation.validate_aud = false,
    }

    let key = DecodingKey::from_secret(jwt_secret.as_bytes());
    let claims: JwtClaims = decode::<JwtClaims>(token, &key, &validation)
        .map(|data| data.claims)
        .map_err(|e| {
            debug!("Token rejected: {}", e);
            match e.kind() {
                ErrorKind::ExpiredSignature => "Token expired".to_string(),
                ErrorKind::InvalidSignature => "Invalid token signature".to_string(),
                ErrorKind::InvalidAudience => "Invalid token audience".to_string(),
                _ => "Invalid token".to_string(),
            }
        })?;

    let session_started_at = claims
        .iat
        .and_then(|timestamp| Utc.timestamp_opt(timestamp as i64, 0).single());

    let user = User {
        id: claims.sub,
        email: claims.email,
        role: claims.role,
        session_started_at,
    };

    debug!("Token validated successfully for user: {}", user.id);
    Ok(user)
}
