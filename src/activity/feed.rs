//! Paginated activity stream.
//!
//! The stream is the union of problem, idea and comment changes, newest
//! first. Storage runs the query; this module owns the paging arithmetic
//! and the shape of a page.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::entity::{EntityKind, UserId, ANONYMOUS_ID};
use crate::error::{IdeastormError, Result};
use crate::permission::{Scope, VisibilityFilter};

pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Which page of the stream to fetch, and for whom
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedQuery {
    /// `None` shows public items only
    pub user: Option<UserId>,
    /// 1-based
    pub page: u32,
    pub page_size: u32,
}

impl FeedQuery {
    pub fn new(user: Option<UserId>, page: u32) -> Result<Self> {
        if page == 0 {
            return Err(IdeastormError::InvalidArgument(
                "feed pages start at 1".to_string(),
            ));
        }
        Ok(Self {
            user,
            page,
            page_size: DEFAULT_PAGE_SIZE,
        })
    }

    /// Accepts the wire form where user `0` means no user filter
    pub fn from_raw(user: UserId, page: u32) -> Result<Self> {
        let user = (user != ANONYMOUS_ID).then_some(user);
        Self::new(user, page)
    }

    pub fn with_page_size(mut self, page_size: u32) -> Result<Self> {
        if page_size == 0 {
            return Err(IdeastormError::InvalidArgument(
                "feed page size must be at least 1".to_string(),
            ));
        }
        self.page_size = page_size;
        Ok(self)
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.page_size)
    }

    pub fn limit(&self) -> u64 {
        u64::from(self.page_size)
    }

    /// Visibility applied to each stream of the union
    pub fn filter(&self, kind: EntityKind) -> VisibilityFilter {
        let scope = match self.user {
            Some(user) => Scope::PublicOrMember(user),
            None => Scope::PublicOnly,
        };
        VisibilityFilter { kind, scope }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Verb {
    Created,
    Updated,
    Commented,
}

impl std::fmt::Display for Verb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Verb::Created => write!(f, "created"),
            Verb::Updated => write!(f, "updated"),
            Verb::Commented => write!(f, "commented"),
        }
    }
}

impl Verb {
    /// Comments always read as `commented`; anything else is `created`
    /// until it has been revised
    pub fn for_item(kind: EntityKind, revision_count: u32) -> Self {
        match kind {
            EntityKind::Comment => Verb::Commented,
            _ if revision_count > 1 => Verb::Updated,
            _ => Verb::Created,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeedItem {
    pub kind: EntityKind,
    pub id: Uuid,
    pub problem_id: Uuid,
    pub title: String,
    pub author: UserId,
    pub modified: DateTime<Utc>,
    pub verb: Verb,
}

#[derive(Debug, Clone, Serialize)]
pub struct FeedPage {
    pub items: Vec<FeedItem>,
    /// Matching items across all pages
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
    pub page_count: u32,
}

impl FeedPage {
    pub fn new(query: &FeedQuery, items: Vec<FeedItem>, total: u64) -> Self {
        let page_count = total.div_ceil(u64::from(query.page_size));
        Self {
            items,
            total,
            page: query.page,
            page_size: query.page_size,
            page_count: u32::try_from(page_count).unwrap_or(u32::MAX),
        }
    }

    pub fn has_next(&self) -> bool {
        self.page < self.page_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset() {
        assert_eq!(FeedQuery::new(None, 1).unwrap().offset(), 0);
        assert_eq!(FeedQuery::new(None, 3).unwrap().offset(), 20);
        let q = FeedQuery::new(Some(4), 2).unwrap().with_page_size(25).unwrap();
        assert_eq!(q.offset(), 25);
        assert_eq!(q.limit(), 25);
    }

    #[test]
    fn test_page_zero_rejected() {
        assert!(matches!(
            FeedQuery::new(None, 0),
            Err(IdeastormError::InvalidArgument(_))
        ));
        assert!(FeedQuery::new(None, 1).unwrap().with_page_size(0).is_err());
    }

    #[test]
    fn test_zero_user_is_no_filter() {
        let q = FeedQuery::from_raw(0, 1).unwrap();
        assert_eq!(q.user, None);
        assert_eq!(q.filter(EntityKind::Idea).scope, Scope::PublicOnly);

        let q = FeedQuery::from_raw(9, 1).unwrap();
        assert_eq!(q.user, Some(9));
        assert_eq!(q.filter(EntityKind::Problem).scope, Scope::PublicOrMember(9));
    }

    #[test]
    fn test_page_count() {
        let q = FeedQuery::new(None, 1).unwrap();
        assert_eq!(FeedPage::new(&q, Vec::new(), 0).page_count, 0);
        assert_eq!(FeedPage::new(&q, Vec::new(), 10).page_count, 1);
        let page = FeedPage::new(&q, Vec::new(), 11);
        assert_eq!(page.page_count, 2);
        assert!(page.has_next());
    }

    #[test]
    fn test_verbs() {
        assert_eq!(Verb::for_item(EntityKind::Comment, 1), Verb::Commented);
        assert_eq!(Verb::for_item(EntityKind::Idea, 1), Verb::Created);
        assert_eq!(Verb::for_item(EntityKind::Problem, 3), Verb::Updated);
    }
}
