use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::info;
use uuid::Uuid;

use crate::models::pagination::{Page, Paginated};
use crate::models::session::{NewSession, Session, SessionStatus, SessionUpdate};
use crate::sessions::store::{CandidateFilter, SessionStore, StoreError};

const INVOLVES_USER: &str = "(host_id = $1 OR $1 = ANY(participants))";

const INVOLVES_USER_IN_EXCHANGE: &str =
    "skill_id IS NOT NULL AND (host_id = $1 OR $1 = ANY(participants) OR requested_by = $1)";

/// Nullable columns take a presence flag so an explicit `null` clears them;
/// the rest fall back to the stored value through `COALESCE`.
const UPDATE_SESSION: &str = r#"
    UPDATE sessions SET
        title              = COALESCE($2, title),
        description        = CASE WHEN $3 THEN $4 ELSE description END,
        date               = COALESCE($5, date),
        start_time         = COALESCE($6, start_time),
        end_time           = COALESCE($7, end_time),
        skill_category     = COALESCE($8, skill_category),
        status             = COALESCE($9, status),
        max_participants   = CASE WHEN $10 THEN $11 ELSE max_participants END,
        is_public          = COALESCE($12, is_public),
        sub_topics         = COALESCE($13, sub_topics),
        metadata           = CASE WHEN $14 THEN $15 ELSE metadata END,
        meeting_link       = CASE WHEN $16 THEN $17 ELSE meeting_link END,
        skill_id           = COALESCE($18, skill_id),
        requested_skill_id = COALESCE($19, requested_skill_id),
        requested_by       = COALESCE($20, requested_by),
        updated_at         = NOW()
    WHERE id = $1
    RETURNING *
"#;

const SEARCH_PREDICATE: &str = r#"
    (title ILIKE $1 ESCAPE '\' OR skill_category ILIKE $1 ESCAPE '\' OR description ILIKE $1 ESCAPE '\')
    AND ($2::text IS NULL OR status = $2)
"#;

/// PostgreSQL-backed session store.
#[derive(Clone)]
pub struct PgSessionStore {
    pool: PgPool,
}

impl PgSessionStore {
    pub fn new(pool: PgPool) -> Self {
        PgSessionStore { pool }
    }

    /// Applies the bundled schema migrations.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        info!("Session schema migrations applied");
        Ok(())
    }
}

/// Wraps a user query as an ILIKE substring pattern, escaping wildcards.
fn like_pattern(query: &str) -> String {
    let mut escaped = String::with_capacity(query.len() + 2);
    escaped.push('%');
    for c in query.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

fn to_total(count: i64) -> u64 {
    count.max(0) as u64
}

/// Pushes the coarse candidate predicate; kept separate so it can be tested
/// without a database.
fn push_candidate_query<'a>(builder: &mut QueryBuilder<'a, Postgres>, filter: &'a CandidateFilter) {
    builder.push("SELECT * FROM sessions WHERE status = ");
    builder.push_bind(filter.status.as_str());
    if filter.public_only {
        builder.push(" AND is_public");
    }
    if let Some(host) = filter.exclude_host {
        builder.push(" AND host_id <> ");
        builder.push_bind(host);
    }
    if filter.require_metadata {
        builder.push(" AND metadata IS NOT NULL AND cardinality(metadata) > 0");
    }
    if let Some(keywords) = &filter.any_keyword {
        builder.push(" AND metadata && ");
        builder.push_bind(keywords);
        builder.push("::text[]");
    }
    builder.push(" ORDER BY date ASC, start_time ASC, id ASC");
}

#[async_trait]
impl SessionStore for PgSessionStore {
    async fn create(&self, new: NewSession) -> Result<Session, StoreError> {
        let session = sqlx::query_as::<_, Session>(
            r#"
            INSERT INTO sessions
                (id, title, description, date, start_time, end_time, skill_category,
                 status, max_participants, is_public, host_id, sub_topics, metadata, meeting_link,
                 skill_id, requested_skill_id, requested_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&new.title)
        .bind(&new.description)
        .bind(new.date)
        .bind(new.start_time)
        .bind(new.end_time)
        .bind(&new.skill_category)
        .bind(SessionStatus::Upcoming.as_str())
        .bind(new.max_participants)
        .bind(new.is_public)
        .bind(new.host_id)
        .bind(&new.sub_topics)
        .bind(&new.metadata)
        .bind(&new.meeting_link)
        .bind(new.skill_id)
        .bind(new.requested_skill_id)
        .bind(new.requested_by)
        .fetch_one(&self.pool)
        .await?;

        info!("Created session {} for host {}", session.id, session.host_id);
        Ok(session)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Session>, StoreError> {
        Ok(
            sqlx::query_as::<_, Session>("SELECT * FROM sessions WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn find_by_user(
        &self,
        user_id: Uuid,
        page: Page,
    ) -> Result<Paginated<Session>, StoreError> {
        let data = sqlx::query_as::<_, Session>(&format!(
            "SELECT * FROM sessions WHERE {INVOLVES_USER} ORDER BY created_at DESC LIMIT $2 OFFSET $3"
        ))
        .bind(user_id)
        .bind(page.limit as i64)
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await?;

        let total: i64 =
            sqlx::query_scalar(&format!("SELECT COUNT(*) FROM sessions WHERE {INVOLVES_USER}"))
                .bind(user_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(Paginated::new(data, to_total(total), page))
    }

    async fn find_upcoming(
        &self,
        user_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
        page: Page,
    ) -> Result<Paginated<Session>, StoreError> {
        let predicate =
            format!("{INVOLVES_USER} AND date BETWEEN $2 AND $3 AND status = 'upcoming'");

        let data = sqlx::query_as::<_, Session>(&format!(
            "SELECT * FROM sessions WHERE {predicate} ORDER BY date ASC, start_time ASC LIMIT $4 OFFSET $5"
        ))
        .bind(user_id)
        .bind(start)
        .bind(end)
        .bind(page.limit as i64)
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM sessions WHERE {predicate}"))
            .bind(user_id)
            .bind(start)
            .bind(end)
            .fetch_one(&self.pool)
            .await?;

        Ok(Paginated::new(data, to_total(total), page))
    }

    async fn find_public(&self, page: Page) -> Result<Paginated<Session>, StoreError> {
        let data = sqlx::query_as::<_, Session>(
            r#"
            SELECT * FROM sessions
            WHERE is_public AND status = 'upcoming'
            ORDER BY date ASC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(page.limit as i64)
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM sessions WHERE is_public AND status = 'upcoming'",
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(Paginated::new(data, to_total(total), page))
    }

    async fn search(
        &self,
        query: &str,
        status: Option<SessionStatus>,
        page: Page,
    ) -> Result<Paginated<Session>, StoreError> {
        let pattern = like_pattern(query);
        let status = status.map(|s| s.as_str());

        let data = sqlx::query_as::<_, Session>(&format!(
            "SELECT * FROM sessions WHERE {SEARCH_PREDICATE} ORDER BY created_at DESC LIMIT $3 OFFSET $4"
        ))
        .bind(&pattern)
        .bind(status)
        .bind(page.limit as i64)
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await?;

        let total: i64 =
            sqlx::query_scalar(&format!("SELECT COUNT(*) FROM sessions WHERE {SEARCH_PREDICATE}"))
                .bind(&pattern)
                .bind(status)
                .fetch_one(&self.pool)
                .await?;

        Ok(Paginated::new(data, to_total(total), page))
    }

    async fn update(
        &self,
        id: Uuid,
        update: SessionUpdate,
    ) -> Result<Option<Session>, StoreError> {
        Ok(sqlx::query_as::<_, Session>(UPDATE_SESSION)
            .bind(id)
            .bind(&update.title)
            .bind(update.description.is_some())
            .bind(update.description.clone().flatten())
            .bind(update.date)
            .bind(update.start_time)
            .bind(update.end_time)
            .bind(&update.skill_category)
            .bind(&update.status)
            .bind(update.max_participants.is_some())
            .bind(update.max_participants.flatten())
            .bind(update.is_public)
            .bind(&update.sub_topics)
            .bind(update.metadata.is_some())
            .bind(update.metadata.clone().flatten())
            .bind(update.meeting_link.is_some())
            .bind(update.meeting_link.clone().flatten())
            .bind(update.skill_id)
            .bind(update.requested_skill_id)
            .bind(update.requested_by)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn remove(&self, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM sessions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn add_participant(
        &self,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Session>, StoreError> {
        Ok(sqlx::query_as::<_, Session>(
            r#"
            UPDATE sessions SET
                participants = CASE
                    WHEN $2 = ANY(participants) THEN participants
                    ELSE array_append(participants, $2)
                END,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn remove_participant(
        &self,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Session>, StoreError> {
        Ok(sqlx::query_as::<_, Session>(
            r#"
            UPDATE sessions SET
                participants = array_remove(participants, $2),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Session>, StoreError> {
        Ok(sqlx::query_as::<_, Session>(&format!(
            "SELECT * FROM sessions WHERE {INVOLVES_USER}"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn list_exchanges_for_user(&self, user_id: Uuid) -> Result<Vec<Session>, StoreError> {
        Ok(sqlx::query_as::<_, Session>(&format!(
            "SELECT * FROM sessions WHERE {INVOLVES_USER_IN_EXCHANGE}"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn fetch_candidates(
        &self,
        filter: &CandidateFilter,
    ) -> Result<Vec<Session>, StoreError> {
        let mut builder = QueryBuilder::new("");
        push_candidate_query(&mut builder, filter);
        Ok(builder
            .build_query_as::<Session>()
            .fetch_all(&self.pool)
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sessions::keywords::KeywordSet;

    #[test]
    fn test_like_pattern_wraps_and_escapes() {
        assert_eq!(like_pattern("rust"), "%rust%");
        assert_eq!(like_pattern("100%"), "%100\\%%");
        assert_eq!(like_pattern("a_b"), "%a\\_b%");
        assert_eq!(like_pattern(""), "%%");
    }

    #[test]
    fn test_negative_count_clamps_to_zero() {
        assert_eq!(to_total(-1), 0);
        assert_eq!(to_total(7), 7);
    }

    #[test]
    fn test_update_clears_nullable_columns_only_when_flagged() {
        for column in ["description", "max_participants", "metadata", "meeting_link"] {
            let line = UPDATE_SESSION
                .lines()
                .find(|l| l.trim_start().starts_with(&format!("{column} ")))
                .unwrap();
            assert!(line.contains("= CASE WHEN $"), "{line}");
            assert!(line.trim_end().ends_with(&format!("ELSE {column} END,")), "{line}");
        }
        assert!(UPDATE_SESSION.contains("title              = COALESCE($2, title)"));
    }

    #[test]
    fn test_schema_enforces_time_window_and_exchange_refs() {
        let create = include_str!("../../migrations/0001_create_sessions.sql");
        assert!(create.contains("CHECK (end_time > start_time)"));

        let exchange = include_str!("../../migrations/0002_exchange_sessions.sql");
        assert!(exchange.contains("CONSTRAINT sessions_exchange_refs CHECK"));
        for column in ["skill_id", "requested_skill_id", "requested_by"] {
            assert!(exchange.contains(&format!("{column} IS NULL")));
            assert!(exchange.contains(&format!("{column} IS NOT NULL")));
        }
    }

    #[test]
    fn test_candidate_query_for_matching() {
        let filter = CandidateFilter::for_matching(Uuid::new_v4(), &KeywordSet::new(["rust"]));
        let mut builder = QueryBuilder::new("");
        push_candidate_query(&mut builder, &filter);
        let sql = builder.sql();

        assert!(sql.starts_with("SELECT * FROM sessions WHERE status = $1"));
        assert!(sql.contains("AND is_public"));
        assert!(sql.contains("AND host_id <> $2"));
        assert!(sql.contains("metadata IS NOT NULL AND cardinality(metadata) > 0"));
        assert!(sql.contains("AND metadata && $3::text[]"));
        assert!(sql.ends_with("ORDER BY date ASC, start_time ASC, id ASC"));
    }

    #[test]
    fn test_candidate_query_without_optional_clauses() {
        let filter = CandidateFilter {
            exclude_host: None,
            status: SessionStatus::Completed,
            public_only: false,
            require_metadata: false,
            any_keyword: None,
        };
        let mut builder = QueryBuilder::new("");
        push_candidate_query(&mut builder, &filter);
        let sql = builder.sql();

        assert!(!sql.contains("is_public"));
        assert!(!sql.contains("host_id"));
        assert!(!sql.contains("metadata"));
    }
}
