use std::collections::HashMap;

use chrono::Utc;
use rusqlite::{params, OptionalExtension, Row};
use uuid::Uuid;

use crate::entity::{
    Quantifier, QuantifierInput, QuantifierValue, UserId, Vote, VoteTarget, VoteWeight,
};
use crate::error::{IdeastormError, Result};

use super::sqlite_store::{parsed_at, time_at, timestamp, uuid_at, SqliteStore};

fn target_parts(target: &VoteTarget) -> (&'static str, String) {
    match target {
        VoteTarget::Idea(id) => ("idea", id.to_string()),
        VoteTarget::Alternative(id) => ("alternative", id.to_string()),
    }
}

fn vote_from_row(row: &Row<'_>) -> rusqlite::Result<Vote> {
    let kind: String = row.get(1)?;
    let id = uuid_at(row, 2)?;
    let target = match kind.as_str() {
        "alternative" => VoteTarget::Alternative(id),
        _ => VoteTarget::Idea(id),
    };
    let raw: i64 = row.get(3)?;
    let weight = VoteWeight::from_value(raw).ok_or_else(|| {
        rusqlite::Error::IntegralValueOutOfRange(3, raw)
    })?;
    Ok(Vote {
        author: row.get(0)?,
        target,
        weight,
        created_at: time_at(row, 4)?,
    })
}

impl SqliteStore {
    // Votes

    pub fn get_vote(&self, author: UserId, target: &VoteTarget) -> Result<Option<VoteWeight>> {
        let (kind, id) = target_parts(target);
        let raw: Option<i64> = self
            .conn
            .query_row(
                "SELECT weight FROM votes WHERE author = ?1 AND target_kind = ?2 AND target_id = ?3",
                params![author, kind, id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(raw.and_then(VoteWeight::from_value))
    }

    /// Store or clear a user's vote on a target
    pub fn set_vote(&self, author: UserId, target: &VoteTarget, weight: Option<VoteWeight>) -> Result<()> {
        let (kind, id) = target_parts(target);
        match weight {
            Some(weight) => {
                self.conn.execute(
                    "INSERT OR REPLACE INTO votes (author, target_kind, target_id, weight, created_at)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    params![author, kind, id, weight.value(), timestamp(&Utc::now())],
                )?;
            }
            None => {
                self.conn.execute(
                    "DELETE FROM votes WHERE author = ?1 AND target_kind = ?2 AND target_id = ?3",
                    params![author, kind, id],
                )?;
            }
        }
        tracing::debug!(author, target = %id, ?weight, "vote stored");
        Ok(())
    }

    pub fn votes_for(&self, target: &VoteTarget) -> Result<Vec<Vote>> {
        let (kind, id) = target_parts(target);
        let mut stmt = self.conn.prepare(
            "SELECT author, target_kind, target_id, weight, created_at FROM votes
             WHERE target_kind = ?1 AND target_id = ?2 ORDER BY created_at",
        )?;
        let votes = stmt
            .query_map(params![kind, id], vote_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(votes)
    }

    // Criteria values

    pub fn set_criteria_value(&self, idea_id: &Uuid, criteria_id: &Uuid, value: i64) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO criteria_values (idea_id, criteria_id, value) VALUES (?1, ?2, ?3)",
            params![idea_id.to_string(), criteria_id.to_string(), value],
        )?;
        Ok(())
    }

    /// Every criteria value of a problem keyed by (idea id, criteria id)
    pub fn criteria_values(&self, problem_id: &Uuid) -> Result<HashMap<(Uuid, Uuid), i64>> {
        let mut stmt = self.conn.prepare(
            "SELECT v.idea_id, v.criteria_id, v.value FROM criteria_values v
             JOIN criteria c ON c.id = v.criteria_id
             WHERE c.problem_id = ?1",
        )?;
        let rows = stmt
            .query_map([problem_id.to_string()], |row| {
                Ok(((uuid_at(row, 0)?, uuid_at(row, 1)?), row.get::<_, i64>(2)?))
            })?
            .collect::<std::result::Result<HashMap<_, _>, _>>()?;
        Ok(rows)
    }

    // Quantifiers

    pub fn add_quantifier(&self, quantifier: &Quantifier) -> Result<()> {
        self.conn.execute(
            "INSERT INTO quantifiers (id, criteria_id, name, format) VALUES (?1, ?2, ?3, ?4)",
            params![
                quantifier.id.to_string(),
                quantifier.criteria_id.to_string(),
                quantifier.name,
                quantifier.format.to_string(),
            ],
        )?;
        Ok(())
    }

    pub fn get_quantifier(&self, id: &Uuid) -> Result<Option<Quantifier>> {
        Ok(self
            .conn
            .query_row(
                "SELECT id, criteria_id, name, format FROM quantifiers WHERE id = ?1",
                [id.to_string()],
                quantifier_from_row,
            )
            .optional()?)
    }

    /// Quantifier by UUID prefix
    pub fn find_quantifier(&self, raw: &str) -> Result<Quantifier> {
        let mut stmt = self.conn.prepare(
            "SELECT id, criteria_id, name, format FROM quantifiers WHERE id LIKE ?1 || '%' LIMIT 2",
        )?;
        let mut matches = stmt
            .query_map([raw.trim().to_lowercase()], quantifier_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        match matches.len() {
            0 => Err(IdeastormError::EntityNotFound(format!("quantifier {}", raw))),
            1 => Ok(matches.remove(0)),
            _ => Err(IdeastormError::InvalidArgument(format!(
                "ambiguous quantifier id '{}'",
                raw
            ))),
        }
    }

    pub fn list_quantifiers(&self, criteria_id: &Uuid) -> Result<Vec<Quantifier>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, criteria_id, name, format FROM quantifiers WHERE criteria_id = ?1 ORDER BY name",
        )?;
        let quantifiers = stmt
            .query_map([criteria_id.to_string()], quantifier_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(quantifiers)
    }

    /// Store a measured value. The value's format must match its quantifier.
    pub fn set_quantifier_value(&self, value: &QuantifierValue) -> Result<()> {
        let quantifier = self.get_quantifier(&value.quantifier_id)?.ok_or_else(|| {
            IdeastormError::EntityNotFound(format!("quantifier {}", value.quantifier_id))
        })?;
        if quantifier.format != value.value.format() {
            return Err(IdeastormError::InvalidArgument(format!(
                "quantifier '{}' takes {} values, got {}",
                quantifier.name,
                quantifier.format,
                value.value.format()
            )));
        }

        self.conn.execute(
            "INSERT OR REPLACE INTO quantifier_values (quantifier_id, idea_id, value) VALUES (?1, ?2, ?3)",
            params![
                value.quantifier_id.to_string(),
                value.idea_id.to_string(),
                serde_json::to_string(&value.value)?,
            ],
        )?;
        Ok(())
    }

    /// Values measured on the given ideas
    pub fn quantifier_values(&self, idea_ids: &[Uuid]) -> Result<Vec<QuantifierValue>> {
        let mut stmt = self.conn.prepare(
            "SELECT quantifier_id, idea_id, value FROM quantifier_values WHERE idea_id = ?1",
        )?;
        let mut values = Vec::new();
        for idea in idea_ids {
            let rows = stmt
                .query_map([idea.to_string()], |row| {
                    Ok((uuid_at(row, 0)?, uuid_at(row, 1)?, row.get::<_, String>(2)?))
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            for (quantifier_id, idea_id, raw) in rows {
                let value: QuantifierInput = serde_json::from_str(&raw)?;
                values.push(QuantifierValue {
                    quantifier_id,
                    idea_id,
                    value,
                });
            }
        }
        Ok(values)
    }
}

fn quantifier_from_row(row: &Row<'_>) -> rusqlite::Result<Quantifier> {
    Ok(Quantifier {
        id: uuid_at(row, 0)?,
        criteria_id: uuid_at(row, 1)?,
        name: row.get(2)?,
        format: parsed_at(row, 3)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{Criteria, Idea, Problem, QuantifierFormat};
    use crate::scoring::{aggregate_quantifiers, cast_vote, tally};

    fn seeded() -> (SqliteStore, Problem, Criteria, Idea) {
        let store = SqliteStore::in_memory().unwrap();
        let problem = Problem::new("Parks".to_string(), 1, 1);
        store.add_problem(&problem).unwrap();
        let criteria = Criteria::new("Cost".to_string(), problem.base.id, 1, 1);
        store.add_criteria(&criteria).unwrap();
        let idea = Idea::new("Dog park".to_string(), problem.base.id, 1, 1);
        store.add_idea(&idea).unwrap();
        (store, problem, criteria, idea)
    }

    #[test]
    fn test_vote_toggle_cycle() {
        let (store, _, _, idea) = seeded();
        let target = VoteTarget::Idea(idea.base.id);

        let (weight, _) = cast_vote(store.get_vote(2, &target).unwrap(), VoteWeight::Up);
        store.set_vote(2, &target, weight).unwrap();
        store.set_vote(3, &target, Some(VoteWeight::Down)).unwrap();
        store.set_vote(4, &target, Some(VoteWeight::Up)).unwrap();
        assert_eq!(tally(&store.votes_for(&target).unwrap()), 1);

        let (weight, _) = cast_vote(store.get_vote(2, &target).unwrap(), VoteWeight::Up);
        assert_eq!(weight, None);
        store.set_vote(2, &target, weight).unwrap();
        assert_eq!(store.get_vote(2, &target).unwrap(), None);
        assert_eq!(store.votes_for(&target).unwrap().len(), 2);
    }

    #[test]
    fn test_criteria_values_map() {
        let (store, problem, criteria, idea) = seeded();
        store.set_criteria_value(&idea.base.id, &criteria.base.id, 7).unwrap();
        store.set_criteria_value(&idea.base.id, &criteria.base.id, 9).unwrap();

        let values = store.criteria_values(&problem.base.id).unwrap();
        assert_eq!(values.len(), 1);
        assert_eq!(values[&(idea.base.id, criteria.base.id)], 9);
    }

    #[test]
    fn test_quantifier_values_roll_up() {
        let (store, problem, criteria, idea) = seeded();
        let other = Idea::new("Skate park".to_string(), problem.base.id, 1, 2);
        store.add_idea(&other).unwrap();

        let trees = Quantifier::new("Trees".to_string(), criteria.base.id, QuantifierFormat::Number);
        let lit = Quantifier::new("Lit".to_string(), criteria.base.id, QuantifierFormat::Boolean);
        store.add_quantifier(&trees).unwrap();
        store.add_quantifier(&lit).unwrap();
        assert_eq!(store.list_quantifiers(&criteria.base.id).unwrap().len(), 2);

        for (idea_id, count, lights) in [(idea.base.id, 3, true), (other.base.id, 4, false)] {
            store
                .set_quantifier_value(&QuantifierValue {
                    quantifier_id: trees.id,
                    idea_id,
                    value: QuantifierInput::Number(count),
                })
                .unwrap();
            store
                .set_quantifier_value(&QuantifierValue {
                    quantifier_id: lit.id,
                    idea_id,
                    value: QuantifierInput::Boolean(lights),
                })
                .unwrap();
        }

        let values = store.quantifier_values(&[idea.base.id, other.base.id]).unwrap();
        let totals = aggregate_quantifiers(&values);
        assert_eq!(totals[&trees.id].total, 7);
        assert_eq!(totals[&lit.id].total, 1);
    }

    #[test]
    fn test_quantifier_value_format_checked() {
        let (store, _, criteria, idea) = seeded();
        let trees = Quantifier::new("Trees".to_string(), criteria.base.id, QuantifierFormat::Number);
        store.add_quantifier(&trees).unwrap();

        let result = store.set_quantifier_value(&QuantifierValue {
            quantifier_id: trees.id,
            idea_id: idea.base.id,
            value: QuantifierInput::Text("lots".to_string()),
        });
        assert!(matches!(result, Err(IdeastormError::InvalidArgument(_))));
    }
}
