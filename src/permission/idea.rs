use crate::entity::{EntityKind, Idea, Problem, User};
use crate::error::Result;

use super::problem::{can_manage, can_view};
use super::{missing_object, Mode};

/// `idea` is `None` when the problem is the object (create)
pub(super) fn allows(user: &User, mode: Mode, problem: &Problem, idea: Option<&Idea>) -> Result<bool> {
    let allowed = match mode {
        Mode::View => can_view(user, problem),
        Mode::Create => {
            user.is_authenticated
                && problem.published
                && !problem.locked
                && problem.criteria_count > 0
                && (problem.open || problem.is_author(user) || problem.is_collaborator(user))
        }
        Mode::Update => {
            let idea = idea.ok_or_else(|| missing_object(EntityKind::Idea, mode))?;
            user.is_authenticated
                && !problem.locked
                && (user.is(idea.base.author)
                    || problem.is_author(user)
                    || (problem.published && problem.open))
        }
        Mode::Delete => {
            let idea = idea.ok_or_else(|| missing_object(EntityKind::Idea, mode))?;
            user.is(idea.base.author) || problem.is_author(user)
        }
        Mode::Vote => {
            let idea = idea.ok_or_else(|| missing_object(EntityKind::Idea, mode))?;
            user.is_authenticated
                && !user.is(idea.base.author)
                && (problem.open || problem.is_collaborator(user))
        }
        Mode::Undelete => {
            let idea = idea.ok_or_else(|| missing_object(EntityKind::Idea, mode))?;
            idea.is_deleted() && (user.is_some(idea.deleted_by) || can_manage(user, problem))
        }
        _ => false,
    };
    Ok(allowed)
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::*;
    use super::*;

    #[test]
    fn test_create_requires_criteria() {
        let mut problem = problem();
        assert!(allows(&user(STRANGER), Mode::Create, &problem, None).unwrap());
        problem.criteria_count = 0;
        assert!(!allows(&user(AUTHOR), Mode::Create, &problem, None).unwrap());
    }

    #[test]
    fn test_create_on_closed_problem() {
        let mut problem = problem();
        problem.open = false;
        assert!(!allows(&user(STRANGER), Mode::Create, &problem, None).unwrap());
        assert!(allows(&user(CONTRIBUTOR), Mode::Create, &problem, None).unwrap());
        assert!(allows(&user(AUTHOR), Mode::Create, &problem, None).unwrap());
    }

    #[test]
    fn test_locked_problem_refuses_create_and_update() {
        let mut problem = problem();
        problem.locked = true;
        let idea = idea(&problem, CONTRIBUTOR);
        assert!(!allows(&user(AUTHOR), Mode::Create, &problem, None).unwrap());
        assert!(!allows(&user(CONTRIBUTOR), Mode::Update, &problem, Some(&idea)).unwrap());
        assert!(allows(&user(CONTRIBUTOR), Mode::Delete, &problem, Some(&idea)).unwrap());
    }

    #[test]
    fn test_update() {
        let mut problem = problem();
        problem.open = false;
        let idea = idea(&problem, CONTRIBUTOR);
        assert!(allows(&user(CONTRIBUTOR), Mode::Update, &problem, Some(&idea)).unwrap());
        assert!(allows(&user(AUTHOR), Mode::Update, &problem, Some(&idea)).unwrap());
        assert!(!allows(&user(STRANGER), Mode::Update, &problem, Some(&idea)).unwrap());

        problem.open = true;
        assert!(allows(&user(STRANGER), Mode::Update, &problem, Some(&idea)).unwrap());
        assert!(!allows(&User::anonymous(), Mode::Update, &problem, Some(&idea)).unwrap());
    }

    #[test]
    fn test_self_vote_rejected() {
        let problem = problem();
        let idea = idea(&problem, CONTRIBUTOR);
        assert!(!allows(&user(CONTRIBUTOR), Mode::Vote, &problem, Some(&idea)).unwrap());
        assert!(allows(&user(STRANGER), Mode::Vote, &problem, Some(&idea)).unwrap());
        assert!(!allows(&User::anonymous(), Mode::Vote, &problem, Some(&idea)).unwrap());
    }

    #[test]
    fn test_vote_on_closed_problem_needs_collaborator() {
        let mut problem = problem();
        problem.open = false;
        let idea = idea(&problem, AUTHOR);
        assert!(!allows(&user(STRANGER), Mode::Vote, &problem, Some(&idea)).unwrap());
        assert!(allows(&user(CONTRIBUTOR), Mode::Vote, &problem, Some(&idea)).unwrap());
    }

    #[test]
    fn test_undelete() {
        let problem = problem();
        let mut idea = idea(&problem, CONTRIBUTOR);
        assert!(!allows(&user(CONTRIBUTOR), Mode::Undelete, &problem, Some(&idea)).unwrap());

        idea.deleted_by = Some(CONTRIBUTOR);
        assert!(allows(&user(CONTRIBUTOR), Mode::Undelete, &problem, Some(&idea)).unwrap());
        assert!(allows(&user(MANAGER), Mode::Undelete, &problem, Some(&idea)).unwrap());
        assert!(allows(&user(AUTHOR), Mode::Undelete, &problem, Some(&idea)).unwrap());
        assert!(!allows(&user(STRANGER), Mode::Undelete, &problem, Some(&idea)).unwrap());
    }
}
