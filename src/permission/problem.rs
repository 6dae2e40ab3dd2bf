use crate::entity::{EntityKind, Problem, User};
use crate::error::Result;

use super::{missing_object, Mode};

pub(super) fn allows_new(user: &User, mode: Mode) -> Result<bool> {
    match mode {
        Mode::Create => Ok(user.is_authenticated),
        _ => Err(missing_object(EntityKind::Problem, mode)),
    }
}

pub(super) fn allows(user: &User, mode: Mode, problem: &Problem) -> bool {
    match mode {
        Mode::View => can_view(user, problem),
        Mode::Create => user.is_authenticated,
        Mode::Update => {
            user.is_authenticated
                && (problem.is_author(user)
                    || (problem.published && problem.open && (problem.public || problem.is_collaborator(user))))
        }
        Mode::Delete => problem.is_author(user),
        Mode::Manage => can_manage(user, problem),
        Mode::Contribute => can_manage(user, problem) || problem.is_contributor(user),
        Mode::Comment | Mode::Vote => {
            user.is_authenticated
                && (problem.public || problem.is_collaborator(user) || problem.is_author(user))
        }
        _ => false,
    }
}

/// Public, or the user is the author or a collaborator. Holds for
/// anonymous users too, who only ever pass on `public`.
pub(super) fn can_view(user: &User, problem: &Problem) -> bool {
    problem.public || problem.is_author(user) || problem.is_collaborator(user)
}

/// Owner or a member of the manager role
pub(super) fn can_manage(user: &User, problem: &Problem) -> bool {
    problem.is_author(user) || problem.is_manager(user)
}

/// Shared gate for adding to or editing a problem's criteria: the problem
/// is published and either open to this user or authored by them.
pub(super) fn accepts_contributions(user: &User, problem: &Problem) -> bool {
    user.is_authenticated
        && problem.published
        && ((problem.open && (problem.public || problem.is_collaborator(user))) || problem.is_author(user))
}
