use crate::entity::{Alternative, EntityKind, Problem, User};
use crate::error::Result;

use super::problem::can_view;
use super::{missing_object, Mode};

/// Same shape as the idea rules; creating one also needs an idea to put in it
pub(super) fn allows(
    user: &User,
    mode: Mode,
    problem: &Problem,
    alternative: Option<&Alternative>,
) -> Result<bool> {
    let allowed = match mode {
        Mode::View => can_view(user, problem),
        Mode::Create => {
            user.is_authenticated
                && problem.published
                && !problem.locked
                && problem.criteria_count > 0
                && problem.idea_count > 0
                && (problem.open || problem.is_author(user) || problem.is_collaborator(user))
        }
        Mode::Update => {
            let alternative = alternative.ok_or_else(|| missing_object(EntityKind::Alternative, mode))?;
            user.is_authenticated
                && !problem.locked
                && (user.is(alternative.base.author)
                    || problem.is_author(user)
                    || (problem.published && problem.open))
        }
        Mode::Delete => {
            let alternative = alternative.ok_or_else(|| missing_object(EntityKind::Alternative, mode))?;
            user.is(alternative.base.author) || problem.is_author(user)
        }
        Mode::Vote => {
            let alternative = alternative.ok_or_else(|| missing_object(EntityKind::Alternative, mode))?;
            user.is_authenticated
                && !user.is(alternative.base.author)
                && (problem.open || problem.is_collaborator(user))
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
    fn test_create_requires_an_idea() {
        let mut problem = problem();
        assert!(allows(&user(STRANGER), Mode::Create, &problem, None).unwrap());
        problem.idea_count = 0;
        assert!(!allows(&user(AUTHOR), Mode::Create, &problem, None).unwrap());
    }

    #[test]
    fn test_update_and_delete() {
        let mut problem = problem();
        problem.open = false;
        let alternative = alternative(&problem, CONTRIBUTOR);
        assert!(allows(&user(CONTRIBUTOR), Mode::Update, &problem, Some(&alternative)).unwrap());
        assert!(!allows(&user(STRANGER), Mode::Update, &problem, Some(&alternative)).unwrap());
        assert!(allows(&user(AUTHOR), Mode::Delete, &problem, Some(&alternative)).unwrap());
        assert!(!allows(&user(MANAGER), Mode::Delete, &problem, Some(&alternative)).unwrap());
    }

    #[test]
    fn test_no_self_vote() {
        let problem = problem();
        let alternative = alternative(&problem, STRANGER);
        assert!(!allows(&user(STRANGER), Mode::Vote, &problem, Some(&alternative)).unwrap());
        assert!(allows(&user(AUTHOR), Mode::Vote, &problem, Some(&alternative)).unwrap());
    }
}
