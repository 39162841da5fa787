//! Identifier set used to look a user up.

use uuid::Uuid;

/// Identifies a user by id, username, or either.
///
/// A lookup matches a row when *any* of the provided identifiers matches.
/// A lookup with no identifiers matches nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserLookup {
    /// Match on the user id.
    pub id: Option<Uuid>,
    /// Match on the exact (case-sensitive) username.
    pub username: Option<String>,
}

impl UserLookup {
    /// Look up by user id only.
    pub fn by_id(id: Uuid) -> Self {
        Self {
            id: Some(id),
            username: None,
        }
    }

    /// Look up by username only.
    pub fn by_username(username: impl Into<String>) -> Self {
        Self {
            id: None,
            username: Some(username.into()),
        }
    }

    /// Whether no identifier was provided.
    pub fn is_empty(&self) -> bool {
        self.id.is_none() && self.username.is_none()
    }

    /// Whether the given record satisfies this lookup.
    pub fn matches(&self, id: &Uuid, username: &str) -> bool {
        self.id.as_ref() == Some(id) || self.username.as_deref() == Some(username)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disjunction() {
        let id = Uuid::new_v4();
        let lookup = UserLookup {
            id: Some(id),
            username: Some("bob".to_string()),
        };
        assert!(lookup.matches(&id, "someone-else"));
        assert!(lookup.matches(&Uuid::new_v4(), "bob"));
        assert!(!lookup.matches(&Uuid::new_v4(), "Bob"));
    }

    #[test]
    fn test_empty_matches_nothing() {
        let lookup = UserLookup::default();
        assert!(lookup.is_empty());
        assert!(!lookup.matches(&Uuid::new_v4(), ""));
    }
}
