use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::pagination::{Page, Paginated};
use crate::models::session::{NewSession, Session, SessionStatus, SessionUpdate};
use crate::sessions::store::{CandidateFilter, SessionStore, StoreError};

/// Process-local session store. Insertion order is the default order.
#[derive(Default)]
pub struct MemorySessionStore {
    sessions: RwLock<Vec<Session>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn with_sessions(sessions: Vec<Session>) -> Self {
        MemorySessionStore {
            sessions: RwLock::new(sessions),
        }
    }

    async fn modify<F>(&self, id: Uuid, f: F) -> Option<Session>
    where
        F: FnOnce(&mut Session),
    {
        let mut sessions = self.sessions.write().await;
        let session = sessions.iter_mut().find(|s| s.id == id)?;
        f(session);
        session.updated_at = Utc::now();
        Some(session.clone())
    }
}

fn newest_first(sessions: &mut [Session]) {
    sessions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}

fn contains_ignore_case(haystack: &str, needle_lower: &str) -> bool {
    haystack.to_lowercase().contains(needle_lower)
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn create(&self, new: NewSession) -> Result<Session, StoreError> {
        let session = Session::from_new(new, Utc::now());
        self.sessions.write().await.push(session.clone());
        Ok(session)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Session>, StoreError> {
        Ok(self.sessions.read().await.iter().find(|s| s.id == id).cloned())
    }

    async fn find_by_user(
        &self,
        user_id: Uuid,
        page: Page,
    ) -> Result<Paginated<Session>, StoreError> {
        let mut matching = self.list_for_user(user_id).await?;
        newest_first(&mut matching);
        Ok(Paginated::from_all(matching, page))
    }

    async fn find_upcoming(
        &self,
        user_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
        page: Page,
    ) -> Result<Paginated<Session>, StoreError> {
        let mut matching: Vec<Session> = self
            .sessions
            .read()
            .await
            .iter()
            .filter(|s| s.involves(user_id))
            .filter(|s| s.date >= start && s.date <= end)
            .filter(|s| s.status() == Some(SessionStatus::Upcoming))
            .cloned()
            .collect();
        matching.sort_by(|a, b| (a.date, a.start_time).cmp(&(b.date, b.start_time)));
        Ok(Paginated::from_all(matching, page))
    }

    async fn find_public(&self, page: Page) -> Result<Paginated<Session>, StoreError> {
        let mut matching: Vec<Session> = self
            .sessions
            .read()
            .await
            .iter()
            .filter(|s| s.is_public && s.status() == Some(SessionStatus::Upcoming))
            .cloned()
            .collect();
        matching.sort_by_key(|s| s.date);
        Ok(Paginated::from_all(matching, page))
    }

    async fn search(
        &self,
        query: &str,
        status: Option<SessionStatus>,
        page: Page,
    ) -> Result<Paginated<Session>, StoreError> {
        let needle = query.to_lowercase();
        let mut matching: Vec<Session> = self
            .sessions
            .read()
            .await
            .iter()
            .filter(|s| {
                contains_ignore_case(&s.title, &needle)
                    || contains_ignore_case(&s.skill_category, &needle)
                    || s.description
                        .as_deref()
                        .is_some_and(|d| contains_ignore_case(d, &needle))
            })
            .filter(|s| status.map_or(true, |st| s.status() == Some(st)))
            .cloned()
            .collect();
        newest_first(&mut matching);
        Ok(Paginated::from_all(matching, page))
    }

    async fn update(
        &self,
        id: Uuid,
        update: SessionUpdate,
    ) -> Result<Option<Session>, StoreError> {
        Ok(self
            .modify(id, |session| session.apply(&update, Utc::now()))
            .await)
    }

    async fn remove(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|s| s.id != id);
        Ok(sessions.len() != before)
    }

    async fn add_participant(
        &self,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Session>, StoreError> {
        Ok(self
            .modify(id, |session| {
                if !session.participants.contains(&user_id) {
                    session.participants.push(user_id);
                }
            })
            .await)
    }

    async fn remove_participant(
        &self,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Session>, StoreError> {
        Ok(self
            .modify(id, |session| session.participants.retain(|p| *p != user_id))
            .await)
    }

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Session>, StoreError> {
        Ok(self
            .sessions
            .read()
            .await
            .iter()
            .filter(|s| s.involves(user_id))
            .cloned()
            .collect())
    }

    async fn list_exchanges_for_user(&self, user_id: Uuid) -> Result<Vec<Session>, StoreError> {
        Ok(self
            .sessions
            .read()
            .await
            .iter()
            .filter(|s| s.involves_in_exchange(user_id))
            .cloned()
            .collect())
    }

    async fn fetch_candidates(
        &self,
        filter: &CandidateFilter,
    ) -> Result<Vec<Session>, StoreError> {
        let mut candidates: Vec<Session> = self
            .sessions
            .read()
            .await
            .iter()
            .filter(|s| filter.admits(s))
            .cloned()
            .collect();
        candidates.sort_by(|a, b| {
            (a.date, a.start_time, a.id).cmp(&(b.date, b.start_time, b.id))
        });
        Ok(candidates)
    }
}
