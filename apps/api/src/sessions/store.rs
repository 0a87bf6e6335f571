//! Session store — the persistence seam for sessions.
//!
//! `AppState` carries an `Arc<dyn SessionStore>`; `PgSessionStore` is used
//! when a database is configured, `MemorySessionStore` otherwise.

use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;
use uuid::Uuid;

use crate::models::pagination::{Page, Paginated};
use crate::models::session::{NewSession, Session, SessionStatus, SessionUpdate};
use crate::sessions::keywords::KeywordSet;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Coarse predicate the store evaluates before any in-process matching.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateFilter {
    pub exclude_host: Option<Uuid>,
    pub status: SessionStatus,
    pub public_only: bool,
    pub require_metadata: bool,
    /// When set, only sessions whose metadata shares at least one of these
    /// keywords are returned.
    pub any_keyword: Option<Vec<String>>,
}

impl CandidateFilter {
    /// Filter for keyword matching on behalf of `exclude_user_id`.
    pub fn for_matching(exclude_user_id: Uuid, keywords: &KeywordSet) -> Self {
        CandidateFilter {
            exclude_host: Some(exclude_user_id),
            status: SessionStatus::Upcoming,
            public_only: true,
            require_metadata: true,
            any_keyword: Some(keywords.to_vec()),
        }
    }

    pub fn admits(&self, session: &Session) -> bool {
        if self.exclude_host == Some(session.host_id) {
            return false;
        }
        if session.status != self.status.as_str() {
            return false;
        }
        if self.public_only && !session.is_public {
            return false;
        }
        let metadata = session.metadata.as_deref().unwrap_or_default();
        if self.require_metadata && metadata.is_empty() {
            return false;
        }
        match &self.any_keyword {
            Some(keywords) => metadata.iter().any(|m| keywords.contains(m)),
            None => true,
        }
    }
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn create(&self, new: NewSession) -> Result<Session, StoreError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Session>, StoreError>;

    /// Sessions the user hosts or joined, newest first.
    async fn find_by_user(&self, user_id: Uuid, page: Page)
        -> Result<Paginated<Session>, StoreError>;

    /// The user's upcoming sessions dated within `[start, end]`, earliest first.
    async fn find_upcoming(
        &self,
        user_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
        page: Page,
    ) -> Result<Paginated<Session>, StoreError>;

    /// Public upcoming sessions by date.
    async fn find_public(&self, page: Page) -> Result<Paginated<Session>, StoreError>;

    /// Case-insensitive substring search over title, category and description.
    async fn search(
        &self,
        query: &str,
        status: Option<SessionStatus>,
        page: Page,
    ) -> Result<Paginated<Session>, StoreError>;

    async fn update(&self, id: Uuid, update: SessionUpdate)
        -> Result<Option<Session>, StoreError>;

    /// Returns `false` when no session had that id.
    async fn remove(&self, id: Uuid) -> Result<bool, StoreError>;

    async fn add_participant(&self, id: Uuid, user_id: Uuid)
        -> Result<Option<Session>, StoreError>;

    async fn remove_participant(
        &self,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Session>, StoreError>;

    /// Every session the user hosts or joined, unpaginated.
    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Session>, StoreError>;

    /// Exchange sessions the user hosts, joined or requested, unpaginated.
    async fn list_exchanges_for_user(&self, user_id: Uuid) -> Result<Vec<Session>, StoreError>;

    /// All sessions admitted by `filter`, ordered by `(date, start_time, id)`.
    async fn fetch_candidates(&self, filter: &CandidateFilter)
        -> Result<Vec<Session>, StoreError>;
}
