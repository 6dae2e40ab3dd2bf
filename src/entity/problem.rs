// src/entity/problem.rs
use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::{slugify, EntityBase, User, UserId};

/// The subject of discussion every other entity hangs off.
///
/// Visibility flags:
/// - `published`: false while the problem is a draft
/// - `open`: any registered user may contribute
/// - `public`: non-collaborators may view it
/// - `locked`: nobody but a superuser may add or edit ideas and alternatives
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Problem {
    #[serde(flatten)]
    pub base: EntityBase,
    pub slug: String,
    pub contributors: BTreeSet<UserId>,
    pub managers: BTreeSet<UserId>,
    pub public: bool,
    pub open: bool,
    pub published: bool,
    pub locked: bool,
    /// Maintained by the store; read by the idea create rule
    #[serde(default)]
    pub criteria_count: u32,
    /// Maintained by the store; read by the alternative create rule
    #[serde(default)]
    pub idea_count: u32,
}

impl Problem {
    pub fn new(title: String, author: UserId, sequence_number: u32) -> Self {
        Self {
            slug: slugify(&title),
            base: EntityBase::new(title, author, sequence_number),
            contributors: BTreeSet::new(),
            managers: BTreeSet::new(),
            public: true,
            open: true,
            published: true,
            locked: false,
            criteria_count: 0,
            idea_count: 0,
        }
    }

    pub fn author(&self) -> UserId {
        self.base.author
    }

    pub fn is_author(&self, user: &User) -> bool {
        user.is(self.base.author)
    }

    pub fn is_manager(&self, user: &User) -> bool {
        user.is_authenticated && self.managers.contains(&user.id)
    }

    pub fn is_contributor(&self, user: &User) -> bool {
        user.is_authenticated && self.contributors.contains(&user.id)
    }

    /// Member of either role set
    pub fn is_collaborator(&self, user: &User) -> bool {
        self.is_manager(user) || self.is_contributor(user)
    }

    /// Everyone who follows the problem: author plus both role sets
    pub fn members(&self) -> BTreeSet<UserId> {
        let mut members: BTreeSet<UserId> = self.contributors.union(&self.managers).copied().collect();
        members.insert(self.base.author);
        members
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_problem_defaults() {
        let problem = Problem::new("Reduce Traffic".to_string(), 1, 1);
        assert_eq!(problem.slug, "reduce-traffic");
        assert!(problem.public && problem.open && problem.published);
        assert!(!problem.locked);
        assert_eq!(problem.author(), 1);
    }

    #[test]
    fn test_roles() {
        let mut problem = Problem::new("P".to_string(), 1, 1);
        problem.contributors.insert(2);
        problem.managers.insert(3);

        let author = User::new(1, "a");
        let contributor = User::new(2, "c");
        let manager = User::new(3, "m");
        let stranger = User::new(4, "s");

        assert!(problem.is_author(&author));
        assert!(problem.is_contributor(&contributor) && !problem.is_manager(&contributor));
        assert!(problem.is_manager(&manager) && problem.is_collaborator(&manager));
        assert!(!problem.is_collaborator(&stranger));
        assert_eq!(problem.members().into_iter().collect::<Vec<_>>(), vec![1, 2, 3]);
    }
}
