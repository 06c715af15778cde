// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Plotvault

//! User roles for authorization.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// User roles for authorization.
///
/// - `Admin` - manages listings and sees provisioning records
/// - `Client` - normal investor, owns a wallet and a portfolio
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Client,
}

impl Role {
    /// Check if this role has at least the privileges of the required role.
    pub fn has_privilege(&self, required: Role) -> bool {
        match (self, required) {
            (Role::Admin, _) => true,
            (Role::Client, Role::Client) => true,
            _ => false,
        }
    }

    /// Parse role from a token claim (case-insensitive).
    pub fn from_str(s: &str) -> Option<Role> {
        match s.to_lowercase().as_str() {
            "admin" => Some(Role::Admin),
            "client" => Some(Role::Client),
            _ => None,
        }
    }
}

impl Default for Role {
    /// Least privilege for authenticated users.
    fn default() -> Self {
        Role::Client
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Admin => write!(f, "admin"),
            Role::Client => write!(f, "client"),
        }
    }
}
