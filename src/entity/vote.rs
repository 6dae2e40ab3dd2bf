use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::UserId;

/// Signed vote weight. Votes tally as a sum of ±1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteWeight {
    Up,
    Down,
}

impl VoteWeight {
    pub fn value(self) -> i64 {
        match self {
            VoteWeight::Up => 1,
            VoteWeight::Down => -1,
        }
    }

    pub fn from_value(value: i64) -> Option<Self> {
        match value {
            1 => Some(VoteWeight::Up),
            -1 => Some(VoteWeight::Down),
            _ => None,
        }
    }
}

impl std::fmt::Display for VoteWeight {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VoteWeight::Up => write!(f, "up"),
            VoteWeight::Down => write!(f, "down"),
        }
    }
}

/// A vote targets exactly one idea or alternative
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "lowercase")]
pub enum VoteTarget {
    Idea(Uuid),
    Alternative(Uuid),
}

impl VoteTarget {
    pub fn id(&self) -> Uuid {
        match self {
            VoteTarget::Idea(id) | VoteTarget::Alternative(id) => *id,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vote {
    pub author: UserId,
    pub target: VoteTarget,
    pub weight: VoteWeight,
    pub created_at: DateTime<Utc>,
}

impl Vote {
    pub fn new(author: UserId, target: VoteTarget, weight: VoteWeight) -> Self {
        Self {
            author,
            target,
            weight,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weight_values() {
        assert_eq!(VoteWeight::Up.value(), 1);
        assert_eq!(VoteWeight::Down.value(), -1);
        assert_eq!(VoteWeight::from_value(-1), Some(VoteWeight::Down));
        assert_eq!(VoteWeight::from_value(5), None);
    }
}
