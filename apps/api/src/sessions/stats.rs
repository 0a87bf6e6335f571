use std::collections::HashSet;

use serde::Serialize;
use uuid::Uuid;

use crate::models::session::{Session, SessionStatus};

/// Per-user exchange statistics shown on the dashboard.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SessionStats {
    pub completed_sessions: usize,
    pub scheduled_sessions: usize,
    /// Distinct other users met as host or fellow participant.
    pub unique_partners: usize,
}

/// Counts for the exchange dashboard, served in the camelCase shape the
/// web client reads.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeSessionStats {
    pub completed_exchange_sessions: usize,
    pub scheduled_exchange_sessions: usize,
    /// Distinct other users met as host, participant or requester.
    pub unique_exchange_partners: usize,
}

#[derive(Default)]
struct Tally {
    completed: usize,
    scheduled: usize,
    partners: HashSet<Uuid>,
}

impl Tally {
    fn add<I>(&mut self, user_id: Uuid, session: &Session, people: I)
    where
        I: IntoIterator<Item = Uuid>,
    {
        match session.status() {
            Some(SessionStatus::Completed) => self.completed += 1,
            Some(SessionStatus::Upcoming) => self.scheduled += 1,
            _ => {}
        }
        self.partners
            .extend(people.into_iter().filter(|id| *id != user_id));
    }
}

fn members(session: &Session) -> impl Iterator<Item = Uuid> + '_ {
    std::iter::once(session.host_id).chain(session.participants.iter().copied())
}

pub fn compute_session_stats(user_id: Uuid, sessions: &[Session]) -> SessionStats {
    let mut tally = Tally::default();
    for session in sessions.iter().filter(|s| s.involves(user_id)) {
        tally.add(user_id, session, members(session));
    }

    SessionStats {
        completed_sessions: tally.completed,
        scheduled_sessions: tally.scheduled,
        unique_partners: tally.partners.len(),
    }
}

/// Like [`compute_session_stats`], restricted to exchange sessions, where the
/// requesting user also counts as a partner.
pub fn compute_exchange_stats(user_id: Uuid, sessions: &[Session]) -> ExchangeSessionStats {
    let mut tally = Tally::default();
    for session in sessions.iter().filter(|s| s.involves_in_exchange(user_id)) {
        tally.add(
            user_id,
            session,
            members(session).chain(session.requested_by),
        );
    }

    ExchangeSessionStats {
        completed_exchange_sessions: tally.completed,
        scheduled_exchange_sessions: tally.scheduled,
        unique_exchange_partners: tally.partners.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sessions::test_support::session;

    #[test]
    fn test_empty_history() {
        let stats = compute_session_stats(Uuid::new_v4(), &[]);
        assert_eq!(
            stats,
            SessionStats {
                completed_sessions: 0,
                scheduled_sessions: 0,
                unique_partners: 0,
            }
        );
    }

    #[test]
    fn test_counts_statuses_and_distinct_partners() {
        let me = Uuid::new_v4();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();

        let mut hosted = session(me, &[]);
        hosted.participants = vec![alice, bob];
        hosted.status = "completed".to_string();

        let mut joined = session(alice, &[]);
        joined.participants = vec![me];

        let mut cancelled = session(me, &[]);
        cancelled.status = "cancelled".to_string();

        let unrelated = session(bob, &[]);

        let stats = compute_session_stats(me, &[hosted, joined, cancelled, unrelated]);
        assert_eq!(stats.completed_sessions, 1);
        assert_eq!(stats.scheduled_sessions, 1);
        assert_eq!(stats.unique_partners, 2);
    }

    fn exchange(host: Uuid, requested_by: Uuid) -> Session {
        let mut s = session(host, &[]);
        s.skill_id = Some(Uuid::new_v4());
        s.requested_skill_id = Some(Uuid::new_v4());
        s.requested_by = Some(requested_by);
        s
    }

    #[test]
    fn test_exchange_stats_count_requesters_and_skip_plain_sessions() {
        let me = Uuid::new_v4();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();

        let mut requested_by_me = exchange(alice, me);
        requested_by_me.status = "completed".to_string();
        let hosted = exchange(me, bob);
        let mut plain = session(me, &[]);
        plain.participants = vec![Uuid::new_v4()];
        let unrelated = exchange(alice, bob);

        let stats = compute_exchange_stats(me, &[requested_by_me, hosted, plain, unrelated]);
        assert_eq!(
            stats,
            ExchangeSessionStats {
                completed_exchange_sessions: 1,
                scheduled_exchange_sessions: 1,
                unique_exchange_partners: 2,
            }
        );
    }

    #[test]
    fn test_exchange_stats_serialize_camel_case() {
        let value = serde_json::to_value(compute_exchange_stats(Uuid::new_v4(), &[])).unwrap();
        assert_eq!(value["completedExchangeSessions"], 0);
        assert_eq!(value["scheduledExchangeSessions"], 0);
        assert_eq!(value["uniqueExchangePartners"], 0);
    }
}
