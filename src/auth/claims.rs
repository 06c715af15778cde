// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Plotvault

//! JWT claims and authenticated user representation.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::roles::Role;

/// Claims decoded from a bearer token.
#[derive(Debug, Clone, Deserialize)]
pub struct JwtClaims {
    /// Subject - the canonical user identifier
    pub sub: String,

    /// User's email address, when the identity provider includes it
    #[serde(default)]
    pub email: Option<String>,

    /// Expiration timestamp
    #[serde(default)]
    pub exp: i64,

    /// Issued at timestamp
    #[serde(default)]
    #[allow(dead_code)]
    pub iat: i64,

    /// Issuer
    #[serde(default)]
    pub iss: String,

    /// Role claim (`admin` or `client`)
    #[serde(default)]
    pub role: Option<String>,
}

/// Authenticated user information extracted from the JWT.
///
/// This is the primary type handlers use to represent the caller.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthenticatedUser {
    /// Canonical user ID (`sub` claim)
    pub user_id: String,

    /// Email from the token, if present
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// User's role
    pub role: Role,

    /// Original issuer (kept for logging, not serialized)
    #[serde(skip)]
    pub issuer: String,
}

impl AuthenticatedUser {
    pub fn from_claims(claims: JwtClaims) -> Self {
        let role = claims
            .role
            .as_deref()
            .and_then(Role::from_str)
            .unwrap_or_default();

        Self {
            user_id: claims.sub,
            email: claims.email,
            role,
            issuer: claims.iss,
        }
    }

    /// Contact address for provider calls and notifications. Tokens without
    /// an email claim get a stable synthesized address.
    pub fn contact_email(&self) -> String {
        self.email
            .clone()
            .unwrap_or_else(|| format!("user-{}@plotvault.local", self.user_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(role: Option<&str>, email: Option<&str>) -> JwtClaims {
        JwtClaims {
            sub: "user-1".to_string(),
            email: email.map(str::to_string),
            exp: 0,
            iat: 0,
            iss: "plotvault".to_string(),
            role: role.map(str::to_string),
        }
    }

    #[test]
    fn role_defaults_to_client() {
        let user = AuthenticatedUser::from_claims(claims(None, None));
        assert_eq!(user.role, Role::Client);

        let admin = AuthenticatedUser::from_claims(claims(Some("admin"), None));
        assert_eq!(admin.role, Role::Admin);
    }

    #[test]
    fn contact_email_synthesizes_when_claim_absent() {
        let user = AuthenticatedUser::from_claims(claims(None, None));
        assert_eq!(user.contact_email(), "user-user-1@plotvault.local");

        let with_email = AuthenticatedUser::from_claims(claims(None, Some("a@b.com")));
        assert_eq!(with_email.contact_email(), "a@b.com");
    }
}
