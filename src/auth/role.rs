//! Closed set of user roles.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Role carried by a user record and by issued tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    /// Lowest privilege; assigned when nothing else is known.
    #[default]
    User,
    Admin,
}

impl Role {
    /// Wire name used in token claims and JSON bodies.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "USER",
            Role::Admin => "ADMIN",
        }
    }

    /// Map a role claim to a role.
    ///
    /// Missing or unrecognised claims fall back to [`Role::User`]; a claim can
    /// never grant more than an exact `ADMIN` match.
    pub fn from_claim(claim: Option<&str>) -> Self {
        match claim {
            Some("ADMIN") => Role::Admin,
            Some("USER") | None => Role::User,
            Some(other) => {
                tracing::debug!(role = %other, "Unknown role claim, using USER");
                Role::User
            }
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claim_never_elevates() {
        assert_eq!(Role::from_claim(None), Role::User);
        assert_eq!(Role::from_claim(Some("USER")), Role::User);
        assert_eq!(Role::from_claim(Some("admin")), Role::User);
        assert_eq!(Role::from_claim(Some("ROLE_ADMIN")), Role::User);
        assert_eq!(Role::from_claim(Some("ADMIN")), Role::Admin);
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&Role::Admin).unwrap();
        assert_eq!(json, "\"ADMIN\"");
        let role: Role = serde_json::from_str("\"USER\"").unwrap();
        assert_eq!(role, Role::User);
    }
}
