mod alternative;
mod comment;
mod criteria;
mod idea;
mod problem;
mod quantifier;
mod revision;
mod user;
mod vote;

pub use alternative::Alternative;
pub use comment::{Comment, CommentTarget};
pub use criteria::{Criteria, CriteriaFormat, ResultMode, SortOrder};
pub use idea::Idea;
pub use problem::Problem;
pub use quantifier::{Quantifier, QuantifierFormat, QuantifierInput, QuantifierValue};
pub use revision::Revision;
pub use user::{User, UserId, ANONYMOUS_ID};
pub use vote::{Vote, VoteTarget, VoteWeight};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Base fields shared by all entities
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityBase {
    pub id: Uuid,
    pub title: String,
    pub content: Option<String>,
    pub author: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub sequence_number: u32,
}

impl EntityBase {
    pub fn new(title: String, author: UserId, sequence_number: u32) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title,
            content: None,
            author,
            created_at: now,
            updated_at: now,
            sequence_number,
        }
    }

    /// Short display form of the id: sequence number plus UUID prefix
    pub fn short_id(&self) -> String {
        format!("{:03} ({})", self.sequence_number, &self.id.to_string()[..7])
    }
}

/// The entity kinds that carry permissions and revision history
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Problem,
    Criteria,
    Idea,
    Alternative,
    Comment,
}

impl EntityKind {
    pub const ALL: [EntityKind; 5] = [
        EntityKind::Problem,
        EntityKind::Criteria,
        EntityKind::Idea,
        EntityKind::Alternative,
        EntityKind::Comment,
    ];
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityKind::Problem => write!(f, "problem"),
            EntityKind::Criteria => write!(f, "criteria"),
            EntityKind::Idea => write!(f, "idea"),
            EntityKind::Alternative => write!(f, "alternative"),
            EntityKind::Comment => write!(f, "comment"),
        }
    }
}

impl std::str::FromStr for EntityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "problem" | "problems" => Ok(EntityKind::Problem),
            "criteria" | "criterion" => Ok(EntityKind::Criteria),
            "idea" | "ideas" => Ok(EntityKind::Idea),
            "alternative" | "alternatives" => Ok(EntityKind::Alternative),
            "comment" | "comments" => Ok(EntityKind::Comment),
            _ => Err(format!("Invalid entity type: {}", s)),
        }
    }
}

/// Convert a title to a URL-safe slug
///
/// - Converts to lowercase
/// - Replaces spaces and special chars with hyphens
/// - Removes consecutive hyphens
/// - Trims leading/trailing hyphens
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut last_was_hyphen = true; // Start true to trim leading hyphens

    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
            last_was_hyphen = false;
        } else if !last_was_hyphen {
            slug.push('-');
            last_was_hyphen = true;
        }
    }

    if slug.ends_with('-') {
        slug.pop();
    }

    if slug.is_empty() {
        slug = "untitled".to_string();
    }

    slug
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_kind_round_trips_through_display() {
        for kind in EntityKind::ALL {
            let parsed: EntityKind = kind.to_string().parse().unwrap();
            assert_eq!(parsed, kind);
        }
    }

    #[test]
    fn test_entity_kind_accepts_plurals() {
        assert_eq!("Ideas".parse::<EntityKind>().unwrap(), EntityKind::Idea);
        assert_eq!("criterion".parse::<EntityKind>().unwrap(), EntityKind::Criteria);
        assert!("vote".parse::<EntityKind>().is_err());
    }

    #[test]
    fn test_short_id_format() {
        let base = EntityBase::new("Title".to_string(), 1, 7);
        let short = base.short_id();
        assert!(short.starts_with("007 ("));
        assert_eq!(short.len(), "007 (".len() + 7 + 1);
    }

    #[test]
    fn test_slugify_basic() {
        assert_eq!(slugify("Hello World"), "hello-world");
        assert_eq!(slugify("Reduce traffic downtown"), "reduce-traffic-downtown");
    }

    #[test]
    fn test_slugify_special_chars() {
        assert_eq!(slugify("Hello, World!"), "hello-world");
        assert_eq!(slugify("API v2.0 (beta)"), "api-v2-0-beta");
        assert_eq!(slugify("---test---"), "test");
    }

    #[test]
    fn test_slugify_empty() {
        assert_eq!(slugify(""), "untitled");
        assert_eq!(slugify("日本語"), "untitled");
    }
}
