//! Keyword-overlap matcher — finds public upcoming sessions hosted by other
//! users whose metadata shares enough keywords with a user's interests.
//!
//! Two stages:
//! 1. The store returns coarse candidates (`CandidateFilter::for_matching`).
//! 2. In process: exact overlap count, threshold, `(date, start_time, id)`
//!    ordering, truncation to `MAX_MATCH_RESULTS`.

use std::sync::Arc;

use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::models::session::Session;
use crate::sessions::keywords::KeywordSet;
use crate::sessions::store::{CandidateFilter, SessionStore, StoreError};

pub const MAX_MATCH_RESULTS: usize = 20;
pub const DEFAULT_MIN_MATCHES: u32 = 2;

#[derive(Debug, Error)]
pub enum MatchError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Session store unavailable: {0}")]
    StoreUnavailable(#[source] StoreError),
}

#[derive(Clone)]
pub struct SessionMatcher {
    store: Arc<dyn SessionStore>,
    default_min_matches: u32,
}

impl SessionMatcher {
    pub fn new(store: Arc<dyn SessionStore>, default_min_matches: u32) -> Self {
        SessionMatcher {
            store,
            default_min_matches,
        }
    }

    /// Returns at most `MAX_MATCH_RESULTS` sessions, earliest first.
    ///
    /// `min_matches` falls back to the configured default when `None` and
    /// must be at least 1. An empty keyword set matches nothing.
    pub async fn find_matches(
        &self,
        keywords: &KeywordSet,
        exclude_user_id: Uuid,
        min_matches: Option<i64>,
    ) -> Result<Vec<Session>, MatchError> {
        let min_matches = resolve_min_matches(min_matches, self.default_min_matches)?;

        if keywords.is_empty() {
            return Ok(Vec::new());
        }

        let filter = CandidateFilter::for_matching(exclude_user_id, keywords);
        let candidates = self
            .store
            .fetch_candidates(&filter)
            .await
            .map_err(MatchError::StoreUnavailable)?;

        let candidate_count = candidates.len();
        let matches = select_matches(candidates, &filter, keywords, min_matches);
        debug!(
            "Matched {} of {} candidates for user {exclude_user_id} (min_matches={min_matches})",
            matches.len(),
            candidate_count
        );

        Ok(matches)
    }
}

fn resolve_min_matches(requested: Option<i64>, default: u32) -> Result<usize, MatchError> {
    let value = requested.unwrap_or(default as i64);
    if value < 1 {
        return Err(MatchError::InvalidArgument(format!(
            "min_matches must be at least 1, got {value}"
        )));
    }
    usize::try_from(value)
        .map_err(|_| MatchError::InvalidArgument(format!("min_matches {value} is out of range")))
}

/// Exact eligibility, overlap threshold, ordering and truncation.
/// Eligibility is re-checked here; the store filter is only a pre-filter.
fn select_matches(
    candidates: Vec<Session>,
    filter: &CandidateFilter,
    keywords: &KeywordSet,
    min_matches: usize,
) -> Vec<Session> {
    let mut matches: Vec<Session> = candidates
        .into_iter()
        .filter(|s| filter.admits(s))
        .filter(|s| {
            let metadata = s.metadata.as_deref().unwrap_or_default();
            keywords.overlap(metadata) >= min_matches
        })
        .collect();

    matches.sort_by(|a, b| (a.date, a.start_time, a.id).cmp(&(b.date, b.start_time, b.id)));
    matches.truncate(MAX_MATCH_RESULTS);
    matches
}
