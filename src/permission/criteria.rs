use crate::entity::{Criteria, EntityKind, Problem, User};
use crate::error::Result;

use super::problem::{accepts_contributions, can_view};
use super::{missing_object, Mode};

/// `criteria` is `None` when the problem is the object (create)
pub(super) fn allows(
    user: &User,
    mode: Mode,
    problem: &Problem,
    criteria: Option<&Criteria>,
) -> Result<bool> {
    let allowed = match mode {
        Mode::View => can_view(user, problem),
        Mode::Create => accepts_contributions(user, problem),
        Mode::Update => {
            let criteria = criteria.ok_or_else(|| missing_object(EntityKind::Criteria, mode))?;
            accepts_contributions(user, problem) || user.is(criteria.base.author)
        }
        Mode::Delete => {
            let criteria = criteria.ok_or_else(|| missing_object(EntityKind::Criteria, mode))?;
            user.is(criteria.base.author) || problem.is_author(user)
        }
        _ => false,
    };
    Ok(allowed)
}
