// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Plotvault

//! Authentication and authorization: bearer-token extraction, claims,
//! and role checks.

pub mod claims;
pub mod error;
pub mod extractor;
pub mod roles;

pub use claims::{AuthenticatedUser, JwtClaims};
pub use error::AuthError;
pub use extractor::{Auth, RequireAdmin};
pub use roles::Role;

use jsonwebtoken::DecodingKey;

use crate::config::env_optional;

/// Verification configuration resolved at startup.
#[derive(Clone)]
pub struct AuthConfig {
    /// HS256 key when `JWT_SECRET` is configured; `None` enables the
    /// development mode (no signature verification).
    pub decoding_key: Option<DecodingKey>,
    /// Expected issuer claim, when configured.
    pub issuer: Option<String>,
}

impl AuthConfig {
    pub fn from_env() -> Self {
        Self {
            decoding_key: env_optional("JWT_SECRET")
                .map(|secret| DecodingKey::from_secret(secret.as_bytes())),
            issuer: env_optional("JWT_ISSUER"),
        }
    }

    /// No signature verification; structure and expiry checks only.
    pub fn development() -> Self {
        Self {
            decoding_key: None,
            issuer: None,
        }
    }

    pub fn is_production(&self) -> bool {
        self.decoding_key.is_some()
    }
}
