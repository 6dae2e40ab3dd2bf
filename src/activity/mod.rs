//! Activity built from the revision log.
//!
//! A [`RevisionHistory`] is the newest-first list of snapshots of one entity.
//! [`activity_entry`] summarises its latest change for the activity stream
//! and [`RevisionHistory::diffs`] pairs every revision with the diff against
//! the one before it for the history screen.

mod feed;

pub use feed::{FeedItem, FeedPage, FeedQuery, Verb, DEFAULT_PAGE_SIZE};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::diff::{diff, render_diff, Segment};
use crate::entity::{EntityKind, Revision, UserId};

/// Revisions of one entity, newest first. Never empty.
#[derive(Debug, Clone)]
pub struct RevisionHistory {
    revisions: Vec<Revision>,
}

impl RevisionHistory {
    /// Build from newest-first revisions. Returns `None` for an empty log,
    /// which callers treat as a broken invariant of the store.
    pub fn new(mut revisions: Vec<Revision>) -> Option<Self> {
        if revisions.is_empty() {
            return None;
        }
        if revisions.windows(2).any(|w| w[0].updated < w[1].updated) {
            tracing::warn!(
                entity = %revisions[0].entity_id,
                "revision log out of order, sorting newest first"
            );
            revisions.sort_by(|a, b| b.updated.cmp(&a.updated));
        }
        Some(Self { revisions })
    }

    pub fn newest(&self) -> &Revision {
        &self.revisions[0]
    }

    /// The revision the newest one replaced, if any
    pub fn previous(&self) -> Option<&Revision> {
        self.revisions.get(1)
    }

    pub fn len(&self) -> usize {
        self.revisions.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn kind(&self) -> EntityKind {
        self.newest().entity_kind
    }

    pub fn revisions(&self) -> &[Revision] {
        &self.revisions
    }

    /// Each revision with the edit script from its predecessor, newest
    /// first. The oldest revision has nothing to compare against.
    pub fn diffs(&self) -> Vec<RevisionDiff<'_>> {
        self.revisions
            .iter()
            .enumerate()
            .map(|(i, revision)| RevisionDiff {
                revision,
                segments: self
                    .revisions
                    .get(i + 1)
                    .map(|older| diff(&older.comparison_text(), &revision.comparison_text())),
            })
            .collect()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RevisionDiff<'a> {
    pub revision: &'a Revision,
    pub segments: Option<Vec<Segment>>,
}

impl RevisionDiff<'_> {
    /// Diff markup, or the plain snapshot for the first revision
    pub fn render(&self) -> String {
        match &self.segments {
            Some(segments) => render_diff(segments),
            None => self.revision.comparison_text(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityStatus {
    Created,
    Updated,
}

impl std::fmt::Display for ActivityStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActivityStatus::Created => write!(f, "created"),
            ActivityStatus::Updated => write!(f, "updated"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivityEntry {
    pub status: ActivityStatus,
    pub actor: UserId,
    pub date: DateTime<Utc>,
    pub detail: String,
}

/// Describe the latest change in `history`.
///
/// With a single revision the entity was just created: the actor is
/// `fallback_author` and the detail is the snapshot itself. Otherwise the
/// actor is whoever committed the newest revision and the detail is the
/// rendered diff of the two newest revisions.
pub fn activity_entry(history: &RevisionHistory, fallback_author: UserId) -> ActivityEntry {
    let newest = history.newest();
    match history.previous() {
        Some(previous) => ActivityEntry {
            status: ActivityStatus::Updated,
            actor: newest.author,
            date: newest.updated,
            detail: render_diff(&diff(&previous.comparison_text(), &newest.comparison_text())),
        },
        None => ActivityEntry {
            status: ActivityStatus::Created,
            actor: fallback_author,
            date: newest.updated,
            detail: newest.comparison_text(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use uuid::Uuid;

    fn revision(id: Uuid, author: UserId, content: &str, minutes: i64) -> Revision {
        Revision {
            entity_kind: EntityKind::Idea,
            entity_id: id,
            author,
            title: "A".to_string(),
            content: content.to_string(),
            updated: DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap() + Duration::minutes(minutes),
        }
    }

    #[test]
    fn test_empty_history_rejected() {
        assert!(RevisionHistory::new(Vec::new()).is_none());
    }

    #[test]
    fn test_single_revision_is_created() {
        let id = Uuid::new_v4();
        let history = RevisionHistory::new(vec![revision(id, 5, "x", 0)]).unwrap();
        let entry = activity_entry(&history, 7);
        assert_eq!(entry.status, ActivityStatus::Created);
        assert_eq!(entry.actor, 7);
        assert_eq!(entry.detail, "<h3>A</h3>x");
        assert!(!entry.detail.contains("<ins>"));
    }

    #[test]
    fn test_update_reports_insert() {
        let id = Uuid::new_v4();
        let history =
            RevisionHistory::new(vec![revision(id, 2, "xy", 5), revision(id, 1, "x", 0)]).unwrap();
        let entry = activity_entry(&history, 1);
        assert_eq!(entry.status, ActivityStatus::Updated);
        assert_eq!(entry.actor, 2);
        assert_eq!(entry.detail, "<span><h3>A</h3>x</span><ins>y</ins>");
        assert_eq!(entry.date, history.newest().updated);
    }

    #[test]
    fn test_out_of_order_log_is_sorted() {
        let id = Uuid::new_v4();
        let history =
            RevisionHistory::new(vec![revision(id, 1, "x", 0), revision(id, 2, "xy", 5)]).unwrap();
        assert_eq!(history.newest().content, "xy");
    }

    #[test]
    fn test_diffs_pair_each_revision_with_predecessor() {
        let id = Uuid::new_v4();
        let history = RevisionHistory::new(vec![
            revision(id, 3, "x y z", 10),
            revision(id, 2, "x y", 5),
            revision(id, 1, "x", 0),
        ])
        .unwrap();
        let diffs = history.diffs();
        assert_eq!(diffs.len(), 3);
        assert!(diffs[0].render().ends_with("<ins> z</ins>"));
        assert!(diffs[1].render().ends_with("<ins> y</ins>"));
        assert!(diffs[2].segments.is_none());
        assert_eq!(diffs[2].render(), "<h3>A</h3>x");
    }
}
