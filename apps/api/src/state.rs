use std::sync::Arc;

use crate::config::Config;
use crate::sessions::matcher::SessionMatcher;
use crate::sessions::store::SessionStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Pluggable session store. Postgres when `DATABASE_URL` is set, in-memory otherwise.
    pub sessions: Arc<dyn SessionStore>,
    pub matcher: SessionMatcher,
}

impl AppState {
    pub fn new(config: Config, sessions: Arc<dyn SessionStore>) -> Self {
        let matcher = SessionMatcher::new(sessions.clone(), config.match_min_keywords);
        AppState {
            config,
            sessions,
            matcher,
        }
    }
}
