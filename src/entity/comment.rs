use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{EntityBase, EntityKind, UserId};

/// What a comment is attached to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "lowercase")]
pub enum CommentTarget {
    Problem,
    Criteria(Uuid),
    Idea(Uuid),
    Alternative(Uuid),
}

impl CommentTarget {
    pub fn kind(&self) -> EntityKind {
        match self {
            CommentTarget::Problem => EntityKind::Problem,
            CommentTarget::Criteria(_) => EntityKind::Criteria,
            CommentTarget::Idea(_) => EntityKind::Idea,
            CommentTarget::Alternative(_) => EntityKind::Alternative,
        }
    }

    /// Id of the commented entity; `None` when it is the problem itself
    pub fn entity_id(&self) -> Option<Uuid> {
        match self {
            CommentTarget::Problem => None,
            CommentTarget::Criteria(id) | CommentTarget::Idea(id) | CommentTarget::Alternative(id) => {
                Some(*id)
            }
        }
    }
}

/// Comments have no title; `base.title` stays empty and the text lives in
/// `base.content`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    #[serde(flatten)]
    pub base: EntityBase,
    pub problem_id: Uuid,
    pub target: CommentTarget,
    pub deleted_by: Option<UserId>,
}

impl Comment {
    pub fn new(
        content: String,
        problem_id: Uuid,
        target: CommentTarget,
        author: UserId,
        sequence_number: u32,
    ) -> Self {
        let mut base = EntityBase::new(String::new(), author, sequence_number);
        base.content = Some(content);
        Self {
            base,
            problem_id,
            target,
            deleted_by: None,
        }
    }

    pub fn text(&self) -> &str {
        self.base.content.as_deref().unwrap_or_default()
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_by.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_kind() {
        let id = Uuid::new_v4();
        assert_eq!(CommentTarget::Problem.kind(), EntityKind::Problem);
        assert_eq!(CommentTarget::Idea(id).kind(), EntityKind::Idea);
        assert_eq!(CommentTarget::Idea(id).entity_id(), Some(id));
        assert_eq!(CommentTarget::Problem.entity_id(), None);
    }

    #[test]
    fn test_new_comment_keeps_text_in_content() {
        let comment = Comment::new("Nice".to_string(), Uuid::new_v4(), CommentTarget::Problem, 2, 1);
        assert_eq!(comment.text(), "Nice");
        assert!(comment.base.title.is_empty());
        assert!(!comment.is_deleted());
    }
}
