use serde::{Deserialize, Serialize};

/// Numeric user identity, as handed out by the account system
pub type UserId = i64;

/// Id carried by the anonymous user; never assigned to a real account
pub const ANONYMOUS_ID: UserId = 0;

/// The acting user of a request.
///
/// Equality is by id only. Authorship checks go through [`User::is`], which
/// never matches an unauthenticated user, so the anonymous user cannot be
/// mistaken for the author of anything.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub is_superuser: bool,
    pub is_authenticated: bool,
}

impl User {
    pub fn new(id: UserId, username: impl Into<String>) -> Self {
        Self {
            id,
            username: username.into(),
            is_superuser: false,
            is_authenticated: true,
        }
    }

    pub fn superuser(id: UserId, username: impl Into<String>) -> Self {
        Self {
            is_superuser: true,
            ..Self::new(id, username)
        }
    }

    pub fn anonymous() -> Self {
        Self {
            id: ANONYMOUS_ID,
            username: "anonymous".to_string(),
            is_superuser: false,
            is_authenticated: false,
        }
    }

    /// True when this is the authenticated user with the given id
    pub fn is(&self, id: UserId) -> bool {
        self.is_authenticated && self.id == id
    }

    /// Same as [`User::is`] for optional references such as `deleted_by`
    pub fn is_some(&self, id: Option<UserId>) -> bool {
        id.is_some_and(|id| self.is(id))
    }
}

impl PartialEq for User {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for User {}

impl std::fmt::Display for User {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.username)
    }
}
