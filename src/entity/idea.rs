// src/entity/idea.rs
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{EntityBase, UserId};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Idea {
    #[serde(flatten)]
    pub base: EntityBase,
    pub problem_id: Uuid,
    /// Soft-delete marker
    pub deleted_by: Option<UserId>,
}

impl Idea {
    pub fn new(title: String, problem_id: Uuid, author: UserId, sequence_number: u32) -> Self {
        Self {
            base: EntityBase::new(title, author, sequence_number),
            problem_id,
            deleted_by: None,
        }
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_by.is_some()
    }
}
