//! Soft deletion is a toggle: deleting a live item records who deleted it,
//! deleting a deleted item restores it.

use serde::Serialize;

use crate::entity::{Comment, Idea, Problem, User, UserId};
use crate::error::Result;

use super::{ensure, Mode, Target};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Toggled {
    Deleted,
    Restored,
}

impl std::fmt::Display for Toggled {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Toggled::Deleted => write!(f, "deleted"),
            Toggled::Restored => write!(f, "restored"),
        }
    }
}

/// Needs `delete` on a live idea and `undelete` on a deleted one
pub fn toggle_idea(user: &User, problem: &Problem, idea: &mut Idea) -> Result<Toggled> {
    let mode = if idea.is_deleted() { Mode::Undelete } else { Mode::Delete };
    ensure(user, mode, &Target::Idea { problem, idea: Some(idea) })?;
    Ok(flip(&mut idea.deleted_by, user))
}

/// Needs `edit` either way
pub fn toggle_comment(user: &User, problem: &Problem, comment: &mut Comment) -> Result<Toggled> {
    ensure(user, Mode::Edit, &Target::Comment { problem, comment })?;
    Ok(flip(&mut comment.deleted_by, user))
}

fn flip(deleted_by: &mut Option<UserId>, user: &User) -> Toggled {
    match deleted_by.take() {
        Some(_) => Toggled::Restored,
        None => {
            *deleted_by = Some(user.id);
            Toggled::Deleted
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::*;
    use super::*;
    use crate::error::IdeastormError;

    #[test]
    fn test_idea_delete_then_restore_by_another_actor() {
        let problem = problem();
        let mut idea = idea(&problem, CONTRIBUTOR);

        assert_eq!(toggle_idea(&user(CONTRIBUTOR), &problem, &mut idea).unwrap(), Toggled::Deleted);
        assert_eq!(idea.deleted_by, Some(CONTRIBUTOR));

        assert_eq!(toggle_idea(&user(MANAGER), &problem, &mut idea).unwrap(), Toggled::Restored);
        assert_eq!(idea.deleted_by, None);
    }

    #[test]
    fn test_idea_toggle_refused() {
        let problem = problem();
        let mut idea = idea(&problem, CONTRIBUTOR);
        let err = toggle_idea(&user(STRANGER), &problem, &mut idea).unwrap_err();
        assert!(matches!(err, IdeastormError::Forbidden { .. }));
        assert!(!idea.is_deleted());
    }

    #[test]
    fn test_undelete_by_original_deleter() {
        let problem = problem();
        let mut idea = idea(&problem, CONTRIBUTOR);
        // the problem author deletes, only they or a manager may restore
        toggle_idea(&user(AUTHOR), &problem, &mut idea).unwrap();
        assert!(toggle_idea(&user(CONTRIBUTOR), &problem, &mut idea).is_err());
        assert_eq!(toggle_idea(&user(AUTHOR), &problem, &mut idea).unwrap(), Toggled::Restored);
    }

    #[test]
    fn test_comment_toggle() {
        let problem = problem();
        let mut comment = comment(&problem, STRANGER);

        assert_eq!(toggle_comment(&user(STRANGER), &problem, &mut comment).unwrap(), Toggled::Deleted);
        assert_eq!(comment.deleted_by, Some(STRANGER));
        assert_eq!(toggle_comment(&user(MANAGER), &problem, &mut comment).unwrap(), Toggled::Restored);
        assert_eq!(comment.deleted_by, None);

        assert!(toggle_comment(&user(CONTRIBUTOR), &problem, &mut comment).is_err());
    }
}
