//! Review target roles.

use serde::{Deserialize, Serialize};

/// The side of an order a user is on when being reviewed.
///
/// A review always targets the counterparty in one specific role, and the
/// target's per-role average rating is keyed by this value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The user who posted the order.
    Requester,
    /// The user who accepted and ran the order.
    Runner,
}

impl Role {
    /// Returns the role name as stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Requester => "requester",
            Role::Runner => "runner",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error returned when parsing a stored role value fails.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role: {0}")]
pub struct ParseRoleError(pub String);

impl std::str::FromStr for Role {
    type Err = ParseRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "requester" => Ok(Role::Requester),
            "runner" => Ok(Role::Runner),
            other => Err(ParseRoleError(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrips_through_str() {
        for role in [Role::Requester, Role::Runner] {
            assert_eq!(role.as_str().parse::<Role>(), Ok(role));
        }
    }

    #[test]
    fn rejects_unknown_role() {
        assert!("admin".parse::<Role>().is_err());
    }

    #[test]
    fn serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Runner).unwrap(), "\"runner\"");
    }
}
