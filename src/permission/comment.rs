use crate::entity::{Comment, Problem, User};

use super::problem::{can_manage, can_view};
use super::Mode;

pub(super) fn allows(user: &User, mode: Mode, problem: &Problem, comment: &Comment) -> bool {
    match mode {
        Mode::View => can_view(user, problem),
        Mode::Edit | Mode::Manage => user.is(comment.base.author) || can_manage(user, problem),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::*;
    use super::*;

    #[test]
    fn test_edit() {
        let problem = problem();
        let comment = comment(&problem, STRANGER);
        assert!(allows(&user(STRANGER), Mode::Edit, &problem, &comment));
        assert!(allows(&user(MANAGER), Mode::Edit, &problem, &comment));
        assert!(allows(&user(AUTHOR), Mode::Manage, &problem, &comment));
        assert!(!allows(&user(CONTRIBUTOR), Mode::Edit, &problem, &comment));
        assert!(!allows(&User::anonymous(), Mode::Edit, &problem, &comment));
    }

    #[test]
    fn test_view_follows_problem() {
        let problem = private_problem();
        let comment = comment(&problem, AUTHOR);
        assert!(allows(&user(CONTRIBUTOR), Mode::View, &problem, &comment));
        assert!(!allows(&user(STRANGER), Mode::View, &problem, &comment));
    }
}
