pub mod handlers;
pub mod keywords;
pub mod matcher;
pub mod memory;
pub mod postgres;
pub mod stats;
pub mod store;
pub mod validation;

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::{NaiveDate, NaiveTime, Utc};
    use uuid::Uuid;

    use crate::models::session::{NewSession, Session};

    pub fn new_session(host_id: Uuid) -> NewSession {
        NewSession {
            title: "Intro to Rust".to_string(),
            description: Some("Ownership and borrowing".to_string()),
            date: NaiveDate::from_ymd_opt(2026, 11, 1).unwrap(),
            start_time: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(11, 0, 0).unwrap(),
            skill_category: "programming".to_string(),
            max_participants: Some(5),
            is_public: true,
            host_id,
            sub_topics: vec![],
            metadata: None,
            meeting_link: None,
            skill_id: None,
            requested_skill_id: None,
            requested_by: None,
        }
    }

    /// Public upcoming session on 2026-11-01 at 10:00.
    pub fn session(host_id: Uuid, metadata: &[&str]) -> Session {
        session_at(
            host_id,
            metadata,
            NaiveDate::from_ymd_opt(2026, 11, 1).unwrap(),
            10,
        )
    }

    pub fn session_at(host_id: Uuid, metadata: &[&str], date: NaiveDate, hour: u32) -> Session {
        let mut new = new_session(host_id);
        new.date = date;
        new.start_time = NaiveTime::from_hms_opt(hour, 0, 0).unwrap();
        new.end_time = NaiveTime::from_hms_opt(hour, 59, 0).unwrap();
        new.metadata = Some(metadata.iter().map(|m| m.to_string()).collect());
        Session::from_new(new, Utc::now())
    }
}
