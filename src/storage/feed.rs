use rusqlite::{params, Row};

use crate::activity::{FeedItem, FeedPage, FeedQuery, Verb};
use crate::entity::EntityKind;
use crate::error::Result;

use super::sqlite_store::{parsed_at, time_at, uuid_at, SqliteStore};

fn feed_item_from_row(row: &Row<'_>) -> rusqlite::Result<FeedItem> {
    let kind: EntityKind = parsed_at(row, 0)?;
    let revision_count: u32 = row.get(6)?;
    Ok(FeedItem {
        kind,
        id: uuid_at(row, 1)?,
        problem_id: uuid_at(row, 2)?,
        title: row.get(3)?,
        author: row.get(4)?,
        modified: time_at(row, 5)?,
        verb: Verb::for_item(kind, revision_count),
    })
}

impl SqliteStore {
    /// Union of problem, idea and comment activity the query's user may
    /// see, newest first
    fn feed_union(&self, query: &FeedQuery) -> String {
        let problems = query.filter(EntityKind::Problem).sql_condition("p", "p");
        let ideas = query.filter(EntityKind::Idea).sql_condition("p", "i");
        let comments = query.filter(EntityKind::Comment).sql_condition("p", "c");
        format!(
            "SELECT 'problem' AS kind, p.id AS id, p.id AS problem_id, p.title AS title,
                    p.author AS author, p.updated_at AS modified,
                    (SELECT COUNT(*) FROM revisions r WHERE r.entity_id = p.id) AS revision_count
             FROM problems p
             WHERE {problems}
             UNION ALL
             SELECT 'idea', i.id, i.problem_id, i.title, i.author, i.updated_at,
                    (SELECT COUNT(*) FROM revisions r WHERE r.entity_id = i.id)
             FROM ideas i JOIN problems p ON p.id = i.problem_id
             WHERE i.deleted_by IS NULL AND {ideas}
             UNION ALL
             SELECT 'comment', c.id, c.problem_id, c.content, c.author, c.created_at, 1
             FROM comments c JOIN problems p ON p.id = c.problem_id
             WHERE c.deleted_by IS NULL AND {comments}"
        )
    }

    /// One page of the activity feed
    pub fn activity_feed(&self, query: &FeedQuery) -> Result<FeedPage> {
        let union = self.feed_union(query);

        let total: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM ({})", union),
            [],
            |row| row.get(0),
        )?;

        let sql = format!(
            "SELECT kind, id, problem_id, title, author, modified, revision_count FROM ({})
             ORDER BY modified DESC, id LIMIT ?1 OFFSET ?2",
            union
        );
        tracing::debug!(%sql, page = query.page, user = ?query.user, "feed query");

        let limit = i64::try_from(query.limit()).unwrap_or(i64::MAX);
        let offset = i64::try_from(query.offset()).unwrap_or(i64::MAX);
        let mut stmt = self.conn.prepare(&sql)?;
        let items = stmt
            .query_map(params![limit, offset], feed_item_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(FeedPage::new(query, items, u64::try_from(total).unwrap_or(0)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{Comment, CommentTarget, Idea, Problem};
    use crate::storage::IdeaUpdate;

    fn seeded() -> (SqliteStore, Problem, Problem) {
        let store = SqliteStore::in_memory().unwrap();
        let open = Problem::new("Open data".to_string(), 1, 1);
        store.add_problem(&open).unwrap();

        let mut private = Problem::new("Budget".to_string(), 1, 2);
        private.public = false;
        private.contributors.insert(2);
        store.add_problem(&private).unwrap();

        let idea = Idea::new("Portal".to_string(), open.base.id, 1, 1);
        store.add_idea(&idea).unwrap();
        let update = IdeaUpdate {
            content: Some("A single portal".to_string()),
            ..Default::default()
        };
        store.update_idea(&idea.base.id, update, 1).unwrap();

        let secret = Idea::new("Cut parks".to_string(), private.base.id, 2, 2);
        store.add_idea(&secret).unwrap();

        let comment = Comment::new("Agreed".to_string(), open.base.id, CommentTarget::Problem, 3, 1);
        store.add_comment(&comment).unwrap();
        (store, open, private)
    }

    #[test]
    fn test_anonymous_sees_public_only() {
        let (store, open, _) = seeded();
        let page = store.activity_feed(&FeedQuery::new(None, 1).unwrap()).unwrap();

        assert_eq!(page.total, 3);
        assert!(page.items.iter().all(|item| item.problem_id == open.base.id));
        let kinds: Vec<EntityKind> = page.items.iter().map(|item| item.kind).collect();
        assert!(kinds.contains(&EntityKind::Comment));
    }

    #[test]
    fn test_member_sees_private_items() {
        let (store, _, private) = seeded();
        let page = store.activity_feed(&FeedQuery::new(Some(2), 1).unwrap()).unwrap();
        assert_eq!(page.total, 5);
        assert!(page.items.iter().any(|item| item.problem_id == private.base.id));

        let stranger = store.activity_feed(&FeedQuery::new(Some(3), 1).unwrap()).unwrap();
        assert_eq!(stranger.total, 3);
    }

    #[test]
    fn test_newest_first_with_verbs() {
        let (store, _, _) = seeded();
        let page = store.activity_feed(&FeedQuery::new(Some(1), 1).unwrap()).unwrap();

        for pair in page.items.windows(2) {
            assert!(pair[0].modified >= pair[1].modified);
        }
        let portal = page.items.iter().find(|item| item.title == "Portal").unwrap();
        assert_eq!(portal.verb, Verb::Updated);
        let comment = page.items.iter().find(|item| item.kind == EntityKind::Comment).unwrap();
        assert_eq!(comment.verb, Verb::Commented);
        assert_eq!(comment.title, "Agreed");
        let budget = page.items.iter().find(|item| item.title == "Budget").unwrap();
        assert_eq!(budget.verb, Verb::Created);
    }

    #[test]
    fn test_pages() {
        let (store, _, _) = seeded();
        let query = FeedQuery::new(Some(1), 1).unwrap().with_page_size(2).unwrap();
        let first = store.activity_feed(&query).unwrap();
        assert_eq!(first.items.len(), 2);
        assert_eq!(first.page_count, 3);
        assert!(first.has_next());

        let query = FeedQuery::new(Some(1), 3).unwrap().with_page_size(2).unwrap();
        let last = store.activity_feed(&query).unwrap();
        assert_eq!(last.items.len(), 1);
        assert!(!last.has_next());

        let query = FeedQuery::new(Some(1), 9).unwrap().with_page_size(2).unwrap();
        assert!(store.activity_feed(&query).unwrap().items.is_empty());
    }
}
