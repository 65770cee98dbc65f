//! Authenticated identity and role normalization.
//!
//! Token issuers are inconsistent about roles: some send a single `role`
//! string, some a `roles` array. [`RoleClaim`] accepts both shapes and
//! [`Roles`] is always a set, so `is_admin` has exactly one definition.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::{Email, UserId};

/// Role name that grants access to the back-office.
pub const ADMIN_ROLE: &str = "admin";

/// A role claim as it appears in a token payload.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum RoleClaim {
    /// `"role": "admin"`
    One(String),
    /// `"roles": ["admin", "user"]`
    Many(Vec<String>),
}

impl RoleClaim {
    fn into_names(self) -> Vec<String> {
        match self {
            Self::One(role) => vec![role],
            Self::Many(roles) => roles,
        }
    }
}

/// A normalized set of role names.
///
/// Names are trimmed and lowercased; blanks are dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Roles(BTreeSet<String>);

impl Roles {
    /// Merge any number of claims into one set.
    #[must_use]
    pub fn from_claims(claims: impl IntoIterator<Item = RoleClaim>) -> Self {
        let set = claims
            .into_iter()
            .flat_map(RoleClaim::into_names)
            .map(|name| name.trim().to_lowercase())
            .filter(|name| !name.is_empty())
            .collect();
        Self(set)
    }

    /// Whether the set contains `role` (case-insensitive).
    #[must_use]
    pub fn contains(&self, role: &str) -> bool {
        self.0.contains(&role.to_lowercase())
    }

    /// Iterate over role names in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for Roles {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let names: Vec<String> = iter.into_iter().map(Into::into).collect();
        Self::from_claims([RoleClaim::Many(names)])
    }
}

/// The decoded, normalized claims of an authenticated user.
///
/// Lives exactly as long as the bearer token it was decoded from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    /// Numeric user id.
    pub id: UserId,
    /// Login email.
    pub email: Email,
    /// Name shown in the UI.
    pub display_name: String,
    /// Granted roles.
    pub roles: Roles,
}

impl Identity {
    /// Whether this identity may use the back-office.
    ///
    /// Derived from `roles` on every call.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.roles.contains(ADMIN_ROLE)
    }

    /// Human-readable role label for the profile view.
    #[must_use]
    pub fn role_label(&self) -> &'static str {
        if self.is_admin() {
            "Administrador"
        } else {
            "Entrenador"
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn identity(roles: Roles) -> Identity {
        Identity {
            id: UserId::new(1),
            email: Email::parse("oak@lab.org").unwrap(),
            display_name: "Oak".to_string(),
            roles,
        }
    }

    #[test]
    fn test_single_role_string_is_admin() {
        let claim: RoleClaim = serde_json::from_str("\"admin\"").unwrap();
        assert!(identity(Roles::from_claims([claim])).is_admin());
    }

    #[test]
    fn test_role_array_is_admin() {
        let claim: RoleClaim = serde_json::from_str(r#"["admin","user"]"#).unwrap();
        let roles = Roles::from_claims([claim]);
        assert_eq!(roles.iter().collect::<Vec<_>>(), vec!["admin", "user"]);
        assert!(identity(roles).is_admin());
    }

    #[test]
    fn test_no_roles_is_not_admin() {
        let who = identity(Roles::default());
        assert!(!who.is_admin());
        assert_eq!(who.role_label(), "Entrenador");
    }

    #[test]
    fn test_roles_are_normalized_and_deduplicated() {
        let roles = Roles::from_claims([
            RoleClaim::One(" Admin ".to_string()),
            RoleClaim::Many(vec!["ADMIN".to_string(), String::new()]),
        ]);
        assert_eq!(roles.iter().collect::<Vec<_>>(), vec!["admin"]);
    }
}
