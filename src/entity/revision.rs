use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{EntityBase, EntityKind, UserId};

/// Immutable snapshot of an entity's text fields, appended on every commit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Revision {
    pub entity_kind: EntityKind,
    pub entity_id: Uuid,
    /// The editor who committed this snapshot
    pub author: UserId,
    pub title: String,
    pub content: String,
    pub updated: DateTime<Utc>,
}

impl Revision {
    /// Snapshot the current text of an entity as committed by `editor`
    pub fn capture(kind: EntityKind, base: &EntityBase, editor: UserId) -> Self {
        Self {
            entity_kind: kind,
            entity_id: base.id,
            author: editor,
            title: base.title.clone(),
            content: base.content.clone().unwrap_or_default(),
            updated: base.updated_at,
        }
    }

    /// The string revisions are compared on: a title heading followed by the
    /// body. Untitled entities (comments) compare on the body alone.
    pub fn comparison_text(&self) -> String {
        if self.title.is_empty() {
            self.content.clone()
        } else {
            format!("<h3>{}</h3>{}", self.title, self.content)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comparison_text_with_title() {
        let mut base = EntityBase::new("A".to_string(), 1, 1);
        base.content = Some("x".to_string());
        let rev = Revision::capture(EntityKind::Idea, &base, 2);
        assert_eq!(rev.comparison_text(), "<h3>A</h3>x");
        assert_eq!(rev.author, 2);
        assert_eq!(rev.entity_id, base.id);
    }

    #[test]
    fn test_comparison_text_untitled() {
        let mut base = EntityBase::new(String::new(), 1, 1);
        base.content = Some("just text".to_string());
        let rev = Revision::capture(EntityKind::Comment, &base, 1);
        assert_eq!(rev.comparison_text(), "just text");
    }
}
