//! Listing-side counterpart of the view rules.
//!
//! A [`VisibilityFilter`] narrows a collection instead of answering for a
//! single object. It can be applied in memory or rendered as an SQL
//! condition for the storage queries.

use crate::entity::{EntityKind, Problem, User, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Superusers
    Everything,
    /// Anonymous callers
    PublicOnly,
    /// Public problems plus those the user authored or is a member of
    PublicOrMember(UserId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisibilityFilter {
    pub kind: EntityKind,
    pub scope: Scope,
}

/// Build the filter a listing of `kind` should apply for `user`
pub fn visible_filter(user: &User, kind: EntityKind) -> VisibilityFilter {
    let scope = if user.is_superuser {
        Scope::Everything
    } else if user.is_authenticated {
        Scope::PublicOrMember(user.id)
    } else {
        Scope::PublicOnly
    };
    VisibilityFilter { kind, scope }
}

impl VisibilityFilter {
    /// Whether an item authored by `author` under `problem` is listed.
    ///
    /// For problems pass the problem's own author. Items the user wrote stay
    /// visible to them even when the problem itself would not be.
    pub fn includes(&self, problem: &Problem, author: UserId) -> bool {
        match self.scope {
            Scope::Everything => true,
            Scope::PublicOnly => problem.public,
            Scope::PublicOrMember(user) => {
                problem.public
                    || problem.author() == user
                    || problem.contributors.contains(&user)
                    || problem.managers.contains(&user)
                    || author == user
            }
        }
    }

    pub fn includes_problem(&self, problem: &Problem) -> bool {
        self.includes(problem, problem.author())
    }

    /// SQL condition over a `problems` row aliased `problem` and the listed
    /// row aliased `item` (the same alias when listing problems). Ids are
    /// integers, so they are inlined.
    pub fn sql_condition(&self, problem: &str, item: &str) -> String {
        match self.scope {
            Scope::Everything => "1 = 1".to_string(),
            Scope::PublicOnly => format!("{problem}.public = 1"),
            Scope::PublicOrMember(user) => {
                let own_item = match self.kind {
                    EntityKind::Problem => String::new(),
                    _ => format!(" OR {item}.author = {user}"),
                };
                format!(
                    "({problem}.public = 1 OR {problem}.author = {user}{own_item} \
                     OR EXISTS (SELECT 1 FROM problem_members m \
                     WHERE m.problem_id = {problem}.id AND m.user_id = {user}))"
                )
            }
        }
    }
}
