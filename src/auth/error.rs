// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Plotvault

//! Authentication errors.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Authentication error type, produced during bearer-token verification.
#[derive(Debug)]
pub enum AuthError {
    /// No authorization header present
    MissingAuthHeader,
    /// Invalid authorization header format
    InvalidAuthHeader,
    /// Token is malformed
    MalformedToken,
    /// Token signature is invalid
    InvalidSignature,
    /// Token has expired
    TokenExpired,
    /// Token issuer is invalid
    InvalidIssuer,
    /// Insufficient permissions
    InsufficientPermissions,
}

#[derive(Serialize)]
struct AuthErrorBody {
    error: String,
    error_code: String,
}

impl AuthError {
    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::MissingAuthHeader => "missing_auth_header",
            AuthError::InvalidAuthHeader => "invalid_auth_header",
            AuthError::MalformedToken => "malformed_token",
            AuthError::InvalidSignature => "invalid_signature",
            AuthError::TokenExpired => "token_expired",
            AuthError::InvalidIssuer => "invalid_issuer",
            AuthError::InsufficientPermissions => "insufficient_permissions",
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::InsufficientPermissions => StatusCode::FORBIDDEN,
            _ => StatusCode::UNAUTHORIZED,
        }
    }

    fn message(&self) -> String {
        match self {
            AuthError::MissingAuthHeader => "Missing authorization header".to_string(),
            AuthError::InvalidAuthHeader => "Invalid authorization header".to_string(),
            AuthError::MalformedToken => "Malformed token".to_string(),
            AuthError::InvalidSignature => "Invalid token signature".to_string(),
            AuthError::TokenExpired => "Token has expired".to_string(),
            AuthError::InvalidIssuer => "Invalid token issuer".to_string(),
            AuthError::InsufficientPermissions => "Insufficient permissions".to_string(),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let body = Json(AuthErrorBody {
            error: self.message(),
            error_code: self.error_code().to_string(),
        });
        (self.status_code(), body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permission_errors_are_forbidden_rest_are_unauthorized() {
        assert_eq!(
            AuthError::InsufficientPermissions.status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AuthError::MissingAuthHeader.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AuthError::TokenExpired.status_code(),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn error_codes_are_stable() {
        assert_eq!(AuthError::TokenExpired.error_code(), "token_expired");
        assert_eq!(
            AuthError::InvalidSignature.error_code(),
            "invalid_signature"
        );
    }
}
