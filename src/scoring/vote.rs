use serde::Serialize;

use crate::entity::{Vote, VoteWeight};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteChange {
    Cast,
    Changed,
    Withdrawn,
}

impl std::fmt::Display for VoteChange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VoteChange::Cast => write!(f, "cast"),
            VoteChange::Changed => write!(f, "changed"),
            VoteChange::Withdrawn => write!(f, "withdrawn"),
        }
    }
}

/// Apply a vote request to the user's current vote.
///
/// Repeating the current weight withdraws the vote; the opposite weight
/// replaces it. Returns the weight to store, if any.
pub fn cast_vote(current: Option<VoteWeight>, requested: VoteWeight) -> (Option<VoteWeight>, VoteChange) {
    match current {
        None => (Some(requested), VoteChange::Cast),
        Some(weight) if weight == requested => (None, VoteChange::Withdrawn),
        Some(_) => (Some(requested), VoteChange::Changed),
    }
}

/// Signed sum of vote weights
pub fn tally<'a, I>(votes: I) -> i64
where
    I: IntoIterator<Item = &'a Vote>,
{
    votes.into_iter().map(|v| v.weight.value()).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::VoteTarget;
    use uuid::Uuid;

    #[test]
    fn test_toggle() {
        assert_eq!(cast_vote(None, VoteWeight::Up), (Some(VoteWeight::Up), VoteChange::Cast));
        assert_eq!(cast_vote(Some(VoteWeight::Up), VoteWeight::Up), (None, VoteChange::Withdrawn));
        assert_eq!(
            cast_vote(Some(VoteWeight::Up), VoteWeight::Down),
            (Some(VoteWeight::Down), VoteChange::Changed)
        );
    }

    #[test]
    fn test_tally() {
        let target = VoteTarget::Idea(Uuid::new_v4());
        let votes = vec![
            Vote::new(1, target, VoteWeight::Up),
            Vote::new(2, target, VoteWeight::Up),
            Vote::new(3, target, VoteWeight::Down),
        ];
        assert_eq!(tally(&votes), 1);
        assert_eq!(tally(&[]), 0);
    }
}
