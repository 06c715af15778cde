// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Plotvault

//! Axum extractors for authenticated users.
//!
//! Use the `Auth` extractor in handlers to require authentication:
//!
//! ```rust,ignore
//! async fn my_handler(Auth(user): Auth) -> impl IntoResponse {
//!     // user is AuthenticatedUser
//! }
//! ```

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use jsonwebtoken::{decode, Algorithm, Validation};

use super::{AuthConfig, AuthError, AuthenticatedUser, JwtClaims, Role};
use crate::state::AppState;

/// Clock skew tolerance (60 seconds).
const CLOCK_SKEW_LEEWAY: u64 = 60;

/// Extractor that validates the bearer token from the Authorization header.
///
/// ## Authentication Modes
///
/// - **Production mode** (`JWT_SECRET` set): full HS256 signature
///   verification, optional issuer check.
/// - **Development mode** (no secret configured): structure and expiry
///   validation only, no signature check.
pub struct Auth(pub AuthenticatedUser);

impl FromRequestParts<AppState> for Auth {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .ok_or(AuthError::MissingAuthHeader)?
            .to_str()
            .map_err(|_| AuthError::InvalidAuthHeader)?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(AuthError::InvalidAuthHeader)?;

        let user = verify_token(token, &state.auth)?;
        Ok(Auth(user))
    }
}

/// Extractor that additionally requires the admin role.
pub struct RequireAdmin(pub AuthenticatedUser);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Auth(user) = Auth::from_request_parts(parts, state).await?;

        if !user.role.has_privilege(Role::Admin) {
            return Err(AuthError::InsufficientPermissions);
        }

        Ok(RequireAdmin(user))
    }
}

/// Verify a bearer token and extract the caller.
pub fn verify_token(token: &str, config: &AuthConfig) -> Result<AuthenticatedUser, AuthError> {
    if let Some(key) = &config.decoding_key {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = CLOCK_SKEW_LEEWAY;
        validation.validate_aud = false;
        if let Some(issuer) = &config.issuer {
            validation.set_issuer(&[issuer]);
        }

        let token_data =
            decode::<JwtClaims>(token, key, &validation).map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                jsonwebtoken::errors::ErrorKind::InvalidSignature => AuthError::InvalidSignature,
                jsonwebtoken::errors::ErrorKind::InvalidIssuer => AuthError::InvalidIssuer,
                _ => AuthError::MalformedToken,
            })?;

        Ok(AuthenticatedUser::from_claims(token_data.claims))
    } else {
        verify_token_development(token)
    }
}

/// Development verification (no signature check).
///
/// WARNING: only reachable when no `JWT_SECRET` is configured.
fn verify_token_development(token: &str) -> Result<AuthenticatedUser, AuthError> {
    let token_data = jsonwebtoken::dangerous::insecure_decode::<JwtClaims>(token)
        .map_err(|_| AuthError::MalformedToken)?;

    let claims = token_data.claims;

    // Check expiration manually
    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_secs() as i64;

    if claims.exp > 0 && claims.exp < now - CLOCK_SKEW_LEEWAY as i64 {
        return Err(AuthError::TokenExpired);
    }

    Ok(AuthenticatedUser::from_claims(claims))
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde_json::json;

    const SECRET: &str = "test-secret";

    fn signed_token(claims: serde_json::Value) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap()
    }

    fn production_config() -> AuthConfig {
        AuthConfig {
            decoding_key: Some(jsonwebtoken::DecodingKey::from_secret(SECRET.as_bytes())),
            issuer: None,
        }
    }

    fn future_exp() -> i64 {
        chrono::Utc::now().timestamp() + 3600
    }

    #[test]
    fn valid_signed_token_is_accepted() {
        let token = signed_token(json!({
            "sub": "user-1",
            "email": "investor@example.com",
            "exp": future_exp(),
            "role": "admin"
        }));

        let user = verify_token(&token, &production_config()).unwrap();
        assert_eq!(user.user_id, "user-1");
        assert_eq!(user.role, Role::Admin);
        assert_eq!(user.email.as_deref(), Some("investor@example.com"));
    }

    #[test]
    fn wrong_signature_is_rejected() {
        let token = encode(
            &Header::new(Algorithm::HS256),
            &json!({"sub": "user-1", "exp": future_exp()}),
            &EncodingKey::from_secret(b"other-secret"),
        )
        .unwrap();

        let err = verify_token(&token, &production_config()).unwrap_err();
        assert!(matches!(err, AuthError::InvalidSignature));
    }

    #[test]
    fn expired_token_is_rejected() {
        let token = signed_token(json!({"sub": "user-1", "exp": 1000}));
        let err = verify_token(&token, &production_config()).unwrap_err();
        assert!(matches!(err, AuthError::TokenExpired));
    }

    #[test]
    fn development_mode_accepts_unverified_structure() {
        let token = signed_token(json!({"sub": "user-1", "exp": future_exp()}));
        let user = verify_token(&token, &AuthConfig::development()).unwrap();
        assert_eq!(user.user_id, "user-1");
        assert_eq!(user.role, Role::Client);
    }

    #[test]
    fn development_mode_still_rejects_expired_tokens() {
        let token = signed_token(json!({"sub": "user-1", "exp": 1000}));
        let err = verify_token(&token, &AuthConfig::development()).unwrap_err();
        assert!(matches!(err, AuthError::TokenExpired));
    }

    #[test]
    fn garbage_token_is_malformed() {
        let err = verify_token("not-a-jwt", &AuthConfig::development()).unwrap_err();
        assert!(matches!(err, AuthError::MalformedToken));
    }
}
