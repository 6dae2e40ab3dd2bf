// src/entity/alternative.rs
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{EntityBase, UserId};

/// A row of the scoring table: a bundle of ideas compared across criteria
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alternative {
    #[serde(flatten)]
    pub base: EntityBase,
    pub problem_id: Uuid,
    /// Position within the problem, 1-based
    pub order: u32,
    pub idea_ids: Vec<Uuid>,
}

impl Alternative {
    pub fn new(name: String, problem_id: Uuid, author: UserId, sequence_number: u32) -> Self {
        Self {
            base: EntityBase::new(name, author, sequence_number),
            problem_id,
            order: sequence_number,
            idea_ids: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.base.title
    }
}
