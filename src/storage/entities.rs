use std::collections::BTreeSet;

use chrono::Utc;
use rusqlite::{params, OptionalExtension, Row};
use uuid::Uuid;

use crate::activity::RevisionHistory;
use crate::entity::{
    Alternative, Comment, CommentTarget, Criteria, EntityBase, EntityKind, Idea, Problem,
    Revision, UserId,
};
use crate::error::{IdeastormError, Result};
use crate::permission::VisibilityFilter;

use super::sqlite_store::{opt_uuid_at, parsed_at, time_at, timestamp, uuid_at, SqliteStore};
use super::{IdeaUpdate, ProblemUpdate, Role};

const PROBLEM_SELECT: &str = "SELECT p.id, p.sequence_number, p.title, p.content, p.author,
        p.created_at, p.updated_at, p.slug, p.public, p.open, p.published, p.locked,
        (SELECT COUNT(*) FROM criteria c WHERE c.problem_id = p.id),
        (SELECT COUNT(*) FROM ideas i WHERE i.problem_id = p.id AND i.deleted_by IS NULL)
     FROM problems p";

const CRITERIA_SELECT: &str = "SELECT id, sequence_number, title, content, author, created_at,
        updated_at, problem_id, parent_id, format, weight, result, sort_order, scale_min,
        scale_max
     FROM criteria";

const IDEA_SELECT: &str = "SELECT id, sequence_number, title, content, author, created_at,
        updated_at, problem_id, deleted_by
     FROM ideas";

const ALTERNATIVE_SELECT: &str = "SELECT id, sequence_number, title, content, author, created_at,
        updated_at, problem_id, position
     FROM alternatives";

const COMMENT_SELECT: &str = "SELECT id, sequence_number, '' AS title, content, author, created_at,
        updated_at, problem_id, target_kind, target_id, deleted_by
     FROM comments";

/// Columns 0..7 of every entity select
fn base_from_row(row: &Row<'_>) -> rusqlite::Result<EntityBase> {
    Ok(EntityBase {
        id: uuid_at(row, 0)?,
        sequence_number: row.get(1)?,
        title: row.get(2)?,
        content: row.get(3)?,
        author: row.get(4)?,
        created_at: time_at(row, 5)?,
        updated_at: time_at(row, 6)?,
    })
}

fn problem_from_row(row: &Row<'_>) -> rusqlite::Result<Problem> {
    Ok(Problem {
        base: base_from_row(row)?,
        slug: row.get(7)?,
        public: row.get(8)?,
        open: row.get(9)?,
        published: row.get(10)?,
        locked: row.get(11)?,
        criteria_count: row.get(12)?,
        idea_count: row.get(13)?,
        contributors: BTreeSet::new(),
        managers: BTreeSet::new(),
    })
}

fn criteria_from_row(row: &Row<'_>) -> rusqlite::Result<Criteria> {
    Ok(Criteria {
        base: base_from_row(row)?,
        problem_id: uuid_at(row, 7)?,
        parent_id: opt_uuid_at(row, 8)?,
        format: parsed_at(row, 9)?,
        weight: row.get(10)?,
        result: parsed_at(row, 11)?,
        order: parsed_at(row, 12)?,
        min: row.get(13)?,
        max: row.get(14)?,
    })
}

fn idea_from_row(row: &Row<'_>) -> rusqlite::Result<Idea> {
    Ok(Idea {
        base: base_from_row(row)?,
        problem_id: uuid_at(row, 7)?,
        deleted_by: row.get(8)?,
    })
}

fn alternative_from_row(row: &Row<'_>) -> rusqlite::Result<Alternative> {
    Ok(Alternative {
        base: base_from_row(row)?,
        problem_id: uuid_at(row, 7)?,
        order: row.get(8)?,
        idea_ids: Vec::new(),
    })
}

fn comment_from_row(row: &Row<'_>) -> rusqlite::Result<Comment> {
    let kind: EntityKind = parsed_at(row, 8)?;
    let target_id = opt_uuid_at(row, 9)?;
    let target = match (kind, target_id) {
        (EntityKind::Criteria, Some(id)) => CommentTarget::Criteria(id),
        (EntityKind::Idea, Some(id)) => CommentTarget::Idea(id),
        (EntityKind::Alternative, Some(id)) => CommentTarget::Alternative(id),
        _ => CommentTarget::Problem,
    };
    Ok(Comment {
        base: base_from_row(row)?,
        problem_id: uuid_at(row, 7)?,
        target,
        deleted_by: row.get(10)?,
    })
}

fn revision_from_row(row: &Row<'_>) -> rusqlite::Result<Revision> {
    Ok(Revision {
        entity_kind: parsed_at(row, 0)?,
        entity_id: uuid_at(row, 1)?,
        author: row.get(2)?,
        title: row.get(3)?,
        content: row.get(4)?,
        updated: time_at(row, 5)?,
    })
}

impl SqliteStore {
    // Revision log

    /// Append a snapshot and bump the activity counters of the problem's
    /// members other than the editor
    fn record_revision(&self, revision: &Revision, problem: &Problem) -> Result<()> {
        self.conn.execute(
            "INSERT INTO revisions (entity_kind, entity_id, author, title, content, updated)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                revision.entity_kind.to_string(),
                revision.entity_id.to_string(),
                revision.author,
                revision.title,
                revision.content,
                timestamp(&revision.updated),
            ],
        )?;
        tracing::info!(
            kind = %revision.entity_kind,
            entity = %revision.entity_id,
            editor = revision.author,
            "revision appended"
        );

        let editor = revision.author;
        self.bump_activity_counters(problem.members().into_iter().filter(|m| *m != editor))
    }

    /// Snapshots of one entity, newest first
    pub fn revisions(&self, entity_id: &Uuid) -> Result<Vec<Revision>> {
        let mut stmt = self.conn.prepare(
            "SELECT entity_kind, entity_id, author, title, content, updated
             FROM revisions WHERE entity_id = ?1 ORDER BY id DESC",
        )?;
        let revisions = stmt
            .query_map([entity_id.to_string()], revision_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(revisions)
    }

    /// Revision history of an entity. Every stored entity has at least its
    /// creation snapshot, so an empty log means the database is damaged.
    pub fn history(&self, kind: EntityKind, entity_id: &Uuid) -> Result<RevisionHistory> {
        RevisionHistory::new(self.revisions(entity_id)?).ok_or_else(|| {
            IdeastormError::Storage(format!("{} {} has no revisions", kind, entity_id))
        })
    }

    // Problems

    pub fn add_problem(&self, problem: &Problem) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        self.conn.execute(
            "INSERT INTO problems
             (id, sequence_number, title, content, author, slug, public, open, published, locked,
              created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                problem.base.id.to_string(),
                problem.base.sequence_number,
                problem.base.title,
                problem.base.content,
                problem.base.author,
                problem.slug,
                problem.public,
                problem.open,
                problem.published,
                problem.locked,
                timestamp(&problem.base.created_at),
                timestamp(&problem.base.updated_at),
            ],
        )?;
        for user in &problem.contributors {
            self.insert_member(&problem.base.id, *user, Role::Contributor)?;
        }
        for user in &problem.managers {
            self.insert_member(&problem.base.id, *user, Role::Manager)?;
        }
        self.record_revision(
            &Revision::capture(EntityKind::Problem, &problem.base, problem.author()),
            problem,
        )?;
        tx.commit()?;

        tracing::info!(problem = %problem.base.id, title = %problem.base.title, "problem created");
        Ok(())
    }

    fn insert_member(&self, problem_id: &Uuid, user: UserId, role: Role) -> Result<()> {
        self.conn.execute(
            "INSERT OR IGNORE INTO problem_members (problem_id, user_id, role) VALUES (?1, ?2, ?3)",
            params![problem_id.to_string(), user, role.to_string()],
        )?;
        Ok(())
    }

    fn load_members(&self, problem: &mut Problem) -> Result<()> {
        let mut stmt = self
            .conn
            .prepare("SELECT user_id, role FROM problem_members WHERE problem_id = ?1")?;
        let rows = stmt
            .query_map([problem.base.id.to_string()], |row| {
                Ok((row.get::<_, UserId>(0)?, parsed_at::<Role>(row, 1)?))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        for (user, role) in rows {
            match role {
                Role::Contributor => problem.contributors.insert(user),
                Role::Manager => problem.managers.insert(user),
            };
        }
        Ok(())
    }

    pub fn get_problem(&self, id: &Uuid) -> Result<Option<Problem>> {
        let sql = format!("{} WHERE p.id = ?1", PROBLEM_SELECT);
        let problem = self
            .conn
            .query_row(&sql, [id.to_string()], problem_from_row)
            .optional()?;
        match problem {
            Some(mut problem) => {
                self.load_members(&mut problem)?;
                Ok(Some(problem))
            }
            None => Ok(None),
        }
    }

    /// Problem by sequence number or id prefix
    pub fn find_problem(&self, raw: &str) -> Result<Problem> {
        let id = self.resolve_id(EntityKind::Problem, raw)?;
        self.problem(&id)
    }

    pub fn problem(&self, id: &Uuid) -> Result<Problem> {
        self.get_problem(id)?
            .ok_or_else(|| IdeastormError::EntityNotFound(format!("problem {}", id)))
    }

    /// Problems the filter lets through, in creation order
    pub fn list_problems(&self, filter: &VisibilityFilter) -> Result<Vec<Problem>> {
        let sql = format!(
            "{} WHERE {} ORDER BY p.sequence_number",
            PROBLEM_SELECT,
            filter.sql_condition("p", "p")
        );
        tracing::debug!(%sql, "listing problems");
        let mut stmt = self.conn.prepare(&sql)?;
        let mut problems = stmt
            .query_map([], problem_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        for problem in &mut problems {
            self.load_members(problem)?;
        }
        Ok(problems)
    }

    pub fn update_problem(&self, id: &Uuid, update: ProblemUpdate, editor: UserId) -> Result<Problem> {
        let mut problem = self.problem(id)?;
        let touches_text = update.touches_text();

        if let Some(title) = update.title {
            problem.slug = crate::entity::slugify(&title);
            problem.base.title = title;
        }
        if let Some(content) = update.content {
            problem.base.content = Some(content);
        }
        problem.public = update.public.unwrap_or(problem.public);
        problem.open = update.open.unwrap_or(problem.open);
        problem.published = update.published.unwrap_or(problem.published);
        problem.locked = update.locked.unwrap_or(problem.locked);
        problem.base.updated_at = Utc::now();

        let tx = self.conn.unchecked_transaction()?;
        self.conn.execute(
            "UPDATE problems SET title = ?2, content = ?3, slug = ?4, public = ?5, open = ?6,
                 published = ?7, locked = ?8, updated_at = ?9
             WHERE id = ?1",
            params![
                id.to_string(),
                problem.base.title,
                problem.base.content,
                problem.slug,
                problem.public,
                problem.open,
                problem.published,
                problem.locked,
                timestamp(&problem.base.updated_at),
            ],
        )?;
        for user in &update.remove_members {
            self.conn.execute(
                "DELETE FROM problem_members WHERE problem_id = ?1 AND user_id = ?2",
                params![id.to_string(), user],
            )?;
            problem.contributors.remove(user);
            problem.managers.remove(user);
        }
        for user in update.add_contributors {
            self.insert_member(id, user, Role::Contributor)?;
            problem.contributors.insert(user);
        }
        for user in update.add_managers {
            self.insert_member(id, user, Role::Manager)?;
            problem.managers.insert(user);
        }
        if touches_text {
            self.record_revision(&Revision::capture(EntityKind::Problem, &problem.base, editor), &problem)?;
        }
        tx.commit()?;

        tracing::info!(problem = %id, editor, "problem updated");
        Ok(problem)
    }

    /// Hard delete. Children go with it; their revisions stay in the log.
    pub fn delete_problem(&self, id: &Uuid) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        self.conn.execute(
            "DELETE FROM votes WHERE target_id IN (
                 SELECT id FROM ideas WHERE problem_id = ?1
                 UNION SELECT id FROM alternatives WHERE problem_id = ?1)",
            [id.to_string()],
        )?;
        let removed = self
            .conn
            .execute("DELETE FROM problems WHERE id = ?1", [id.to_string()])?;
        tx.commit()?;

        if removed == 0 {
            return Err(IdeastormError::EntityNotFound(format!("problem {}", id)));
        }
        tracing::info!(problem = %id, "problem deleted");
        Ok(())
    }

    // Criteria

    pub fn add_criteria(&self, criteria: &Criteria) -> Result<()> {
        let problem = self.problem(&criteria.problem_id)?;
        let tx = self.conn.unchecked_transaction()?;
        self.conn.execute(
            "INSERT INTO criteria
             (id, sequence_number, problem_id, parent_id, title, content, author, format, weight,
              result, sort_order, scale_min, scale_max, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
            params![
                criteria.base.id.to_string(),
                criteria.base.sequence_number,
                criteria.problem_id.to_string(),
                criteria.parent_id.map(|id| id.to_string()),
                criteria.base.title,
                criteria.base.content,
                criteria.base.author,
                criteria.format.to_string(),
                criteria.weight,
                criteria.result.to_string(),
                criteria.order.to_string(),
                criteria.min,
                criteria.max,
                timestamp(&criteria.base.created_at),
                timestamp(&criteria.base.updated_at),
            ],
        )?;
        self.record_revision(
            &Revision::capture(EntityKind::Criteria, &criteria.base, criteria.base.author),
            &problem,
        )?;
        tx.commit()?;

        tracing::info!(criteria = %criteria.base.id, problem = %criteria.problem_id, "criteria created");
        Ok(())
    }

    pub fn get_criteria(&self, id: &Uuid) -> Result<Option<Criteria>> {
        let sql = format!("{} WHERE id = ?1", CRITERIA_SELECT);
        Ok(self
            .conn
            .query_row(&sql, [id.to_string()], criteria_from_row)
            .optional()?)
    }

    pub fn find_criteria(&self, raw: &str) -> Result<Criteria> {
        let id = self.resolve_id(EntityKind::Criteria, raw)?;
        self.get_criteria(&id)?
            .ok_or_else(|| IdeastormError::EntityNotFound(format!("criteria {}", raw)))
    }

    pub fn list_criteria(&self, problem_id: &Uuid) -> Result<Vec<Criteria>> {
        let sql = format!("{} WHERE problem_id = ?1 ORDER BY title", CRITERIA_SELECT);
        let mut stmt = self.conn.prepare(&sql)?;
        let criteria = stmt
            .query_map([problem_id.to_string()], criteria_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(criteria)
    }

    pub fn delete_criteria(&self, id: &Uuid) -> Result<()> {
        let removed = self
            .conn
            .execute("DELETE FROM criteria WHERE id = ?1", [id.to_string()])?;
        if removed == 0 {
            return Err(IdeastormError::EntityNotFound(format!("criteria {}", id)));
        }
        tracing::info!(criteria = %id, "criteria deleted");
        Ok(())
    }

    // Ideas

    pub fn add_idea(&self, idea: &Idea) -> Result<()> {
        let problem = self.problem(&idea.problem_id)?;
        let tx = self.conn.unchecked_transaction()?;
        self.conn.execute(
            "INSERT INTO ideas
             (id, sequence_number, problem_id, title, content, author, deleted_by, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                idea.base.id.to_string(),
                idea.base.sequence_number,
                idea.problem_id.to_string(),
                idea.base.title,
                idea.base.content,
                idea.base.author,
                idea.deleted_by,
                timestamp(&idea.base.created_at),
                timestamp(&idea.base.updated_at),
            ],
        )?;
        self.record_revision(
            &Revision::capture(EntityKind::Idea, &idea.base, idea.base.author),
            &problem,
        )?;
        tx.commit()?;

        tracing::info!(idea = %idea.base.id, problem = %idea.problem_id, "idea created");
        Ok(())
    }

    pub fn get_idea(&self, id: &Uuid) -> Result<Option<Idea>> {
        let sql = format!("{} WHERE id = ?1", IDEA_SELECT);
        Ok(self
            .conn
            .query_row(&sql, [id.to_string()], idea_from_row)
            .optional()?)
    }

    pub fn find_idea(&self, raw: &str) -> Result<Idea> {
        let id = self.resolve_id(EntityKind::Idea, raw)?;
        self.get_idea(&id)?
            .ok_or_else(|| IdeastormError::EntityNotFound(format!("idea {}", raw)))
    }

    pub fn list_ideas(&self, problem_id: &Uuid, include_deleted: bool) -> Result<Vec<Idea>> {
        let sql = format!(
            "{} WHERE problem_id = ?1 {} ORDER BY sequence_number",
            IDEA_SELECT,
            if include_deleted { "" } else { "AND deleted_by IS NULL" }
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let ideas = stmt
            .query_map([problem_id.to_string()], idea_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(ideas)
    }

    pub fn update_idea(&self, id: &Uuid, update: IdeaUpdate, editor: UserId) -> Result<Idea> {
        let mut idea = self
            .get_idea(id)?
            .ok_or_else(|| IdeastormError::EntityNotFound(format!("idea {}", id)))?;
        let problem = self.problem(&idea.problem_id)?;

        if let Some(title) = update.title {
            idea.base.title = title;
        }
        if let Some(content) = update.content {
            idea.base.content = Some(content);
        }
        idea.base.updated_at = Utc::now();

        let tx = self.conn.unchecked_transaction()?;
        self.conn.execute(
            "UPDATE ideas SET title = ?2, content = ?3, updated_at = ?4 WHERE id = ?1",
            params![
                id.to_string(),
                idea.base.title,
                idea.base.content,
                timestamp(&idea.base.updated_at),
            ],
        )?;
        self.record_revision(&Revision::capture(EntityKind::Idea, &idea.base, editor), &problem)?;
        tx.commit()?;

        tracing::info!(idea = %id, editor, "idea updated");
        Ok(idea)
    }

    /// Persist the soft-delete marker of an idea
    pub fn save_idea_deletion(&self, idea: &Idea) -> Result<()> {
        self.conn.execute(
            "UPDATE ideas SET deleted_by = ?2 WHERE id = ?1",
            params![idea.base.id.to_string(), idea.deleted_by],
        )?;
        tracing::info!(idea = %idea.base.id, deleted_by = ?idea.deleted_by, "idea soft-delete toggled");
        Ok(())
    }

    // Alternatives

    pub fn add_alternative(&self, alternative: &Alternative) -> Result<()> {
        let problem = self.problem(&alternative.problem_id)?;
        let tx = self.conn.unchecked_transaction()?;
        self.conn.execute(
            "INSERT INTO alternatives
             (id, sequence_number, problem_id, title, content, author, position, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                alternative.base.id.to_string(),
                alternative.base.sequence_number,
                alternative.problem_id.to_string(),
                alternative.base.title,
                alternative.base.content,
                alternative.base.author,
                alternative.order,
                timestamp(&alternative.base.created_at),
                timestamp(&alternative.base.updated_at),
            ],
        )?;
        for idea in &alternative.idea_ids {
            self.attach_idea(&alternative.base.id, idea)?;
        }
        self.record_revision(
            &Revision::capture(EntityKind::Alternative, &alternative.base, alternative.base.author),
            &problem,
        )?;
        tx.commit()?;

        tracing::info!(alternative = %alternative.base.id, problem = %alternative.problem_id, "alternative created");
        Ok(())
    }

    /// Put an idea into an alternative. The idea must belong to the same
    /// problem.
    pub fn attach_idea(&self, alternative_id: &Uuid, idea_id: &Uuid) -> Result<()> {
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO alternative_ideas (alternative_id, idea_id)
             SELECT a.id, i.id FROM alternatives a JOIN ideas i ON i.problem_id = a.problem_id
             WHERE a.id = ?1 AND i.id = ?2",
            params![alternative_id.to_string(), idea_id.to_string()],
        )?;
        if inserted == 0 {
            let linked: Option<i64> = self
                .conn
                .query_row(
                    "SELECT 1 FROM alternative_ideas WHERE alternative_id = ?1 AND idea_id = ?2",
                    params![alternative_id.to_string(), idea_id.to_string()],
                    |row| row.get(0),
                )
                .optional()?;
            if linked.is_none() {
                return Err(IdeastormError::InvalidArgument(format!(
                    "idea {} is not part of the alternative's problem",
                    idea_id
                )));
            }
        }
        Ok(())
    }

    fn load_idea_ids(&self, alternative: &mut Alternative) -> Result<()> {
        let mut stmt = self.conn.prepare(
            "SELECT ai.idea_id FROM alternative_ideas ai JOIN ideas i ON i.id = ai.idea_id
             WHERE ai.alternative_id = ?1 AND i.deleted_by IS NULL
             ORDER BY i.sequence_number",
        )?;
        alternative.idea_ids = stmt
            .query_map([alternative.base.id.to_string()], |row| uuid_at(row, 0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(())
    }

    pub fn get_alternative(&self, id: &Uuid) -> Result<Option<Alternative>> {
        let sql = format!("{} WHERE id = ?1", ALTERNATIVE_SELECT);
        let alternative = self
            .conn
            .query_row(&sql, [id.to_string()], alternative_from_row)
            .optional()?;
        match alternative {
            Some(mut alternative) => {
                self.load_idea_ids(&mut alternative)?;
                Ok(Some(alternative))
            }
            None => Ok(None),
        }
    }

    pub fn find_alternative(&self, raw: &str) -> Result<Alternative> {
        let id = self.resolve_id(EntityKind::Alternative, raw)?;
        self.get_alternative(&id)?
            .ok_or_else(|| IdeastormError::EntityNotFound(format!("alternative {}", raw)))
    }

    pub fn list_alternatives(&self, problem_id: &Uuid) -> Result<Vec<Alternative>> {
        let sql = format!("{} WHERE problem_id = ?1 ORDER BY position", ALTERNATIVE_SELECT);
        let mut stmt = self.conn.prepare(&sql)?;
        let mut alternatives = stmt
            .query_map([problem_id.to_string()], alternative_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        for alternative in &mut alternatives {
            self.load_idea_ids(alternative)?;
        }
        Ok(alternatives)
    }

    pub fn delete_alternative(&self, id: &Uuid) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        self.conn.execute(
            "DELETE FROM votes WHERE target_kind = 'alternative' AND target_id = ?1",
            [id.to_string()],
        )?;
        let removed = self
            .conn
            .execute("DELETE FROM alternatives WHERE id = ?1", [id.to_string()])?;
        tx.commit()?;

        if removed == 0 {
            return Err(IdeastormError::EntityNotFound(format!("alternative {}", id)));
        }
        tracing::info!(alternative = %id, "alternative deleted");
        Ok(())
    }

    // Comments

    pub fn add_comment(&self, comment: &Comment) -> Result<()> {
        let problem = self.problem(&comment.problem_id)?;
        let tx = self.conn.unchecked_transaction()?;
        self.conn.execute(
            "INSERT INTO comments
             (id, sequence_number, problem_id, target_kind, target_id, content, author, deleted_by,
              created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                comment.base.id.to_string(),
                comment.base.sequence_number,
                comment.problem_id.to_string(),
                comment.target.kind().to_string(),
                comment.target.entity_id().map(|id| id.to_string()),
                comment.text(),
                comment.base.author,
                comment.deleted_by,
                timestamp(&comment.base.created_at),
                timestamp(&comment.base.updated_at),
            ],
        )?;
        self.record_revision(
            &Revision::capture(EntityKind::Comment, &comment.base, comment.base.author),
            &problem,
        )?;
        tx.commit()?;

        tracing::info!(comment = %comment.base.id, problem = %comment.problem_id, "comment added");
        Ok(())
    }

    pub fn get_comment(&self, id: &Uuid) -> Result<Option<Comment>> {
        let sql = format!("{} WHERE id = ?1", COMMENT_SELECT);
        Ok(self
            .conn
            .query_row(&sql, [id.to_string()], comment_from_row)
            .optional()?)
    }

    pub fn find_comment(&self, raw: &str) -> Result<Comment> {
        let id = self.resolve_id(EntityKind::Comment, raw)?;
        self.get_comment(&id)?
            .ok_or_else(|| IdeastormError::EntityNotFound(format!("comment {}", raw)))
    }

    /// Live comments of a problem, oldest first
    pub fn list_comments(&self, problem_id: &Uuid) -> Result<Vec<Comment>> {
        let sql = format!(
            "{} WHERE problem_id = ?1 AND deleted_by IS NULL ORDER BY created_at",
            COMMENT_SELECT
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let comments = stmt
            .query_map([problem_id.to_string()], comment_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(comments)
    }

    pub fn save_comment_deletion(&self, comment: &Comment) -> Result<()> {
        self.conn.execute(
            "UPDATE comments SET deleted_by = ?2 WHERE id = ?1",
            params![comment.base.id.to_string(), comment.deleted_by],
        )?;
        tracing::info!(comment = %comment.base.id, deleted_by = ?comment.deleted_by, "comment soft-delete toggled");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{Alternative, CriteriaFormat, User};
    use crate::permission::visible_filter;

    fn store_with_problem() -> (SqliteStore, Problem) {
        let store = SqliteStore::in_memory().unwrap();
        let mut problem = Problem::new("Traffic jams".to_string(), 1, 1);
        problem.base.content = Some("Downtown is stuck".to_string());
        problem.contributors.insert(2);
        problem.managers.insert(4);
        store.add_problem(&problem).unwrap();
        (store, problem)
    }

    #[test]
    fn test_problem_round_trip() {
        let (store, problem) = store_with_problem();
        let loaded = store.problem(&problem.base.id).unwrap();
        assert_eq!(loaded.base.title, "Traffic jams");
        assert_eq!(loaded.slug, "traffic-jams");
        assert!(loaded.contributors.contains(&2));
        assert!(loaded.managers.contains(&4));
        assert_eq!(loaded.criteria_count, 0);
        assert_eq!(loaded.base.created_at, problem.base.created_at);
    }

    #[test]
    fn test_find_by_sequence_and_prefix() {
        let (store, problem) = store_with_problem();
        assert_eq!(store.find_problem("1").unwrap().base.id, problem.base.id);
        let prefix = &problem.base.id.to_string()[..8];
        assert_eq!(store.find_problem(prefix).unwrap().base.id, problem.base.id);
        assert!(matches!(
            store.find_problem("zzzz"),
            Err(IdeastormError::EntityNotFound(_))
        ));
        assert_eq!(store.next_sequence_number(EntityKind::Problem).unwrap(), 2);
        assert_eq!(store.next_sequence_number(EntityKind::Idea).unwrap(), 1);
    }

    #[test]
    fn test_counts_follow_children() {
        let (store, problem) = store_with_problem();
        store
            .add_criteria(&Criteria::new("Cost".to_string(), problem.base.id, 1, 1))
            .unwrap();
        let mut idea = Idea::new("Bike lanes".to_string(), problem.base.id, 2, 1);
        store.add_idea(&idea).unwrap();

        let loaded = store.problem(&problem.base.id).unwrap();
        assert_eq!(loaded.criteria_count, 1);
        assert_eq!(loaded.idea_count, 1);

        idea.deleted_by = Some(2);
        store.save_idea_deletion(&idea).unwrap();
        assert_eq!(store.problem(&problem.base.id).unwrap().idea_count, 0);
        assert!(store.list_ideas(&problem.base.id, false).unwrap().is_empty());
        assert_eq!(store.list_ideas(&problem.base.id, true).unwrap().len(), 1);
    }

    #[test]
    fn test_updates_append_revisions() {
        let (store, problem) = store_with_problem();
        let update = ProblemUpdate {
            content: Some("Downtown is stuck at rush hour".to_string()),
            ..Default::default()
        };
        store.update_problem(&problem.base.id, update, 4).unwrap();

        let flags_only = ProblemUpdate {
            open: Some(false),
            ..Default::default()
        };
        let updated = store.update_problem(&problem.base.id, flags_only, 1).unwrap();
        assert!(!updated.open);

        let history = store.history(EntityKind::Problem, &problem.base.id).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history.newest().author, 4);
        assert_eq!(history.newest().content, "Downtown is stuck at rush hour");
        assert_eq!(history.previous().unwrap().author, 1);
    }

    #[test]
    fn test_revisions_bump_member_counters() {
        let (store, problem) = store_with_problem();
        // creation by the author notifies the two members
        assert_eq!(store.activity_counter(1).unwrap(), 0);
        assert_eq!(store.activity_counter(2).unwrap(), 1);
        assert_eq!(store.activity_counter(4).unwrap(), 1);

        let idea = Idea::new("Trams".to_string(), problem.base.id, 2, 1);
        store.add_idea(&idea).unwrap();
        assert_eq!(store.activity_counter(1).unwrap(), 1);
        assert_eq!(store.activity_counter(2).unwrap(), 1);
        assert_eq!(store.activity_counter(4).unwrap(), 2);
    }

    #[test]
    fn test_members_update() {
        let (store, problem) = store_with_problem();
        let update = ProblemUpdate {
            add_contributors: vec![7],
            remove_members: vec![2],
            ..Default::default()
        };
        let updated = store.update_problem(&problem.base.id, update, 1).unwrap();
        assert!(updated.contributors.contains(&7));
        assert!(!updated.contributors.contains(&2));
        let loaded = store.problem(&problem.base.id).unwrap();
        assert_eq!(loaded.contributors, updated.contributors);
    }

    #[test]
    fn test_list_problems_respects_visibility() {
        let (store, _) = store_with_problem();
        let mut hidden = Problem::new("Budget".to_string(), 1, 2);
        hidden.public = false;
        hidden.contributors.insert(2);
        store.add_problem(&hidden).unwrap();

        let anon = visible_filter(&User::anonymous(), EntityKind::Problem);
        assert_eq!(store.list_problems(&anon).unwrap().len(), 1);

        let member = visible_filter(&User::new(2, "bea"), EntityKind::Problem);
        assert_eq!(store.list_problems(&member).unwrap().len(), 2);

        let stranger = visible_filter(&User::new(3, "cy"), EntityKind::Problem);
        assert_eq!(store.list_problems(&stranger).unwrap().len(), 1);

        let root = visible_filter(&User::superuser(9, "root"), EntityKind::Problem);
        assert_eq!(store.list_problems(&root).unwrap().len(), 2);
    }

    #[test]
    fn test_alternative_ideas() {
        let (store, problem) = store_with_problem();
        let idea = Idea::new("Bike lanes".to_string(), problem.base.id, 2, 1);
        store.add_idea(&idea).unwrap();
        let mut alternative = Alternative::new("Plan A".to_string(), problem.base.id, 1, 1);
        alternative.idea_ids.push(idea.base.id);
        store.add_alternative(&alternative).unwrap();

        let loaded = store.get_alternative(&alternative.base.id).unwrap().unwrap();
        assert_eq!(loaded.idea_ids, vec![idea.base.id]);
        // attaching twice is harmless
        store.attach_idea(&alternative.base.id, &idea.base.id).unwrap();

        let other = Problem::new("Other".to_string(), 1, 2);
        store.add_problem(&other).unwrap();
        let stray = Idea::new("Stray".to_string(), other.base.id, 1, 2);
        store.add_idea(&stray).unwrap();
        assert!(store.attach_idea(&alternative.base.id, &stray.base.id).is_err());
    }

    #[test]
    fn test_comments_and_soft_delete() {
        let (store, problem) = store_with_problem();
        let idea = Idea::new("Bike lanes".to_string(), problem.base.id, 2, 1);
        store.add_idea(&idea).unwrap();
        let mut comment = Comment::new(
            "Love it".to_string(),
            problem.base.id,
            CommentTarget::Idea(idea.base.id),
            3,
            1,
        );
        store.add_comment(&comment).unwrap();

        let loaded = store.find_comment("1").unwrap();
        assert_eq!(loaded.target, CommentTarget::Idea(idea.base.id));
        assert_eq!(loaded.text(), "Love it");

        comment.deleted_by = Some(3);
        store.save_comment_deletion(&comment).unwrap();
        assert!(store.list_comments(&problem.base.id).unwrap().is_empty());
        assert_eq!(store.get_comment(&comment.base.id).unwrap().unwrap().deleted_by, Some(3));
    }

    #[test]
    fn test_criteria_keeps_scale_bounds() {
        let (store, problem) = store_with_problem();
        let mut criteria = Criteria::new("Comfort".to_string(), problem.base.id, 1, 1);
        criteria.format = CriteriaFormat::Scale;
        criteria.min = Some(1);
        criteria.max = Some(5);
        store.add_criteria(&criteria).unwrap();

        let loaded = store.get_criteria(&criteria.base.id).unwrap().unwrap();
        assert_eq!(loaded.format, CriteriaFormat::Scale);
        assert_eq!((loaded.min, loaded.max), (Some(1), Some(5)));
        assert!(loaded.check_value(6).is_err());
    }

    #[test]
    fn test_delete_problem_cascades() {
        let (store, problem) = store_with_problem();
        let criteria = Criteria::new("Cost".to_string(), problem.base.id, 1, 1);
        store.add_criteria(&criteria).unwrap();
        store.delete_problem(&problem.base.id).unwrap();

        assert!(store.get_problem(&problem.base.id).unwrap().is_none());
        assert!(store.get_criteria(&criteria.base.id).unwrap().is_none());
        // the log keeps what happened
        assert!(!store.revisions(&problem.base.id).unwrap().is_empty());
        assert!(store.delete_problem(&problem.base.id).is_err());
    }
}
