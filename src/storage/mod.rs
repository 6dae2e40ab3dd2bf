//! SQLite persistence for a project.
//!
//! Everything lives in `.ideastorm/ideastorm.db`. Every committed create or
//! update of a problem, criteria, idea, alternative or comment also appends
//! a snapshot to the revision log, which is never rewritten.

mod entities;
mod feed;
mod sqlite_store;
mod values;

pub use sqlite_store::{SqliteStore, DATA_DIR, DB_FILE};

use crate::entity::UserId;

/// Role a user holds on a problem
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Contributor,
    Manager,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Contributor => write!(f, "contributor"),
            Role::Manager => write!(f, "manager"),
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "contributor" => Ok(Role::Contributor),
            "manager" => Ok(Role::Manager),
            _ => Err(format!("Invalid role: {}", s)),
        }
    }
}

/// Update payload for a problem
#[derive(Debug, Default)]
pub struct ProblemUpdate {
    pub title: Option<String>,
    pub content: Option<String>,
    pub public: Option<bool>,
    pub open: Option<bool>,
    pub published: Option<bool>,
    pub locked: Option<bool>,
    pub add_contributors: Vec<UserId>,
    pub add_managers: Vec<UserId>,
    pub remove_members: Vec<UserId>,
}

impl ProblemUpdate {
    /// Whether the snapshot text changes, which is what earns a revision
    pub fn touches_text(&self) -> bool {
        self.title.is_some() || self.content.is_some()
    }
}

/// Update payload for an idea
#[derive(Debug, Default)]
pub struct IdeaUpdate {
    pub title: Option<String>,
    pub content: Option<String>,
}
