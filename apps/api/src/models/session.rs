use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Upcoming,
    Completed,
    Cancelled,
}

impl SessionStatus {
    pub const ALL: [SessionStatus; 3] = [
        SessionStatus::Upcoming,
        SessionStatus::Completed,
        SessionStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Upcoming => "upcoming",
            SessionStatus::Completed => "completed",
            SessionStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_str() == value)
    }
}

/// A scheduled skill-exchange meeting, as stored in the `sessions` table.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Session {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub date: NaiveDate,
    #[serde(with = "time_format")]
    pub start_time: NaiveTime,
    #[serde(with = "time_format")]
    pub end_time: NaiveTime,
    pub skill_category: String,
    pub status: String,
    pub max_participants: Option<i32>,
    pub is_public: bool,
    pub host_id: Uuid,
    pub participants: Vec<Uuid>,
    pub sub_topics: Vec<String>,
    /// Normalized topic keywords used by the matcher. `None` when never set.
    pub metadata: Option<Vec<String>>,
    pub meeting_link: Option<String>,
    /// Skill offered in an exchange. Set together with `requested_skill_id`
    /// and `requested_by` on exchange sessions, `None` on plain sessions.
    pub skill_id: Option<Uuid>,
    pub requested_skill_id: Option<Uuid>,
    pub requested_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Session {
    pub fn status(&self) -> Option<SessionStatus> {
        SessionStatus::parse(&self.status)
    }

    pub fn involves(&self, user_id: Uuid) -> bool {
        self.host_id == user_id || self.participants.contains(&user_id)
    }

    pub fn is_exchange(&self) -> bool {
        self.skill_id.is_some()
    }

    /// Host, participants and, for exchanges, the requesting user.
    pub fn involves_in_exchange(&self, user_id: Uuid) -> bool {
        self.is_exchange() && (self.involves(user_id) || self.requested_by == Some(user_id))
    }

    /// Builds a fresh record from a validated create request.
    pub fn from_new(new: NewSession, now: DateTime<Utc>) -> Self {
        Session {
            id: Uuid::new_v4(),
            title: new.title,
            description: new.description,
            date: new.date,
            start_time: new.start_time,
            end_time: new.end_time,
            skill_category: new.skill_category,
            status: SessionStatus::Upcoming.as_str().to_string(),
            max_participants: new.max_participants,
            is_public: new.is_public,
            host_id: new.host_id,
            participants: Vec::new(),
            sub_topics: new.sub_topics,
            metadata: new.metadata,
            meeting_link: new.meeting_link,
            skill_id: new.skill_id,
            requested_skill_id: new.requested_skill_id,
            requested_by: new.requested_by,
            created_at: now,
            updated_at: now,
        }
    }

    /// Applies the supplied fields of a partial update in place.
    pub fn apply(&mut self, update: &SessionUpdate, now: DateTime<Utc>) {
        if let Some(title) = &update.title {
            self.title = title.clone();
        }
        if let Some(description) = &update.description {
            self.description = description.clone();
        }
        if let Some(date) = update.date {
            self.date = date;
        }
        if let Some(start_time) = update.start_time {
            self.start_time = start_time;
        }
        if let Some(end_time) = update.end_time {
            self.end_time = end_time;
        }
        if let Some(skill_category) = &update.skill_category {
            self.skill_category = skill_category.clone();
        }
        if let Some(status) = &update.status {
            self.status = status.clone();
        }
        if let Some(max_participants) = update.max_participants {
            self.max_participants = max_participants;
        }
        if let Some(is_public) = update.is_public {
            self.is_public = is_public;
        }
        if let Some(sub_topics) = &update.sub_topics {
            self.sub_topics = sub_topics.clone();
        }
        if let Some(metadata) = &update.metadata {
            self.metadata = metadata.clone();
        }
        if let Some(meeting_link) = &update.meeting_link {
            self.meeting_link = meeting_link.clone();
        }
        if let Some(skill_id) = update.skill_id {
            self.skill_id = Some(skill_id);
        }
        if let Some(requested_skill_id) = update.requested_skill_id {
            self.requested_skill_id = Some(requested_skill_id);
        }
        if let Some(requested_by) = update.requested_by {
            self.requested_by = Some(requested_by);
        }
        self.updated_at = now;
    }
}

/// Body of `POST /api/v1/sessions`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSession {
    pub title: String,
    pub description: Option<String>,
    pub date: NaiveDate,
    #[serde(with = "time_format")]
    pub start_time: NaiveTime,
    #[serde(with = "time_format")]
    pub end_time: NaiveTime,
    pub skill_category: String,
    pub max_participants: Option<i32>,
    #[serde(default)]
    pub is_public: bool,
    pub host_id: Uuid,
    #[serde(default)]
    pub sub_topics: Vec<String>,
    pub metadata: Option<Vec<String>>,
    pub meeting_link: Option<String>,
    /// Exchange references, supplied all together or not at all.
    pub skill_id: Option<Uuid>,
    pub requested_skill_id: Option<Uuid>,
    pub requested_by: Option<Uuid>,
}

/// Body of `PATCH /api/v1/sessions/:id`. Absent fields are left untouched.
///
/// Nullable columns use `Option<Option<T>>`: an explicit JSON `null` clears
/// the column. Exchange references can be set or changed but not cleared.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionUpdate {
    pub title: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub description: Option<Option<String>>,
    pub date: Option<NaiveDate>,
    #[serde(default, with = "optional_time_format")]
    pub start_time: Option<NaiveTime>,
    #[serde(default, with = "optional_time_format")]
    pub end_time: Option<NaiveTime>,
    pub skill_category: Option<String>,
    pub status: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub max_participants: Option<Option<i32>>,
    pub is_public: Option<bool>,
    pub sub_topics: Option<Vec<String>>,
    #[serde(default, deserialize_with = "present")]
    pub metadata: Option<Option<Vec<String>>>,
    #[serde(default, deserialize_with = "present")]
    pub meeting_link: Option<Option<String>>,
    pub skill_id: Option<Uuid>,
    pub requested_skill_id: Option<Uuid>,
    pub requested_by: Option<Uuid>,
}

/// Marks a field as present whenever it appears in the body, `null` included.
fn present<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: serde::Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// Compact view returned by the matcher endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionSummary {
    pub id: Uuid,
    pub title: String,
    pub date: NaiveDate,
    #[serde(with = "time_format")]
    pub start_time: NaiveTime,
    pub skill_category: String,
    pub host_id: Uuid,
    pub participants: Vec<Uuid>,
}

impl From<&Session> for SessionSummary {
    fn from(session: &Session) -> Self {
        SessionSummary {
            id: session.id,
            title: session.title.clone(),
            date: session.date,
            start_time: session.start_time,
            skill_category: session.skill_category.clone(),
            host_id: session.host_id,
            participants: session.participants.clone(),
        }
    }
}

/// Wall-clock times travel as `HH:MM`; `HH:MM:SS` is accepted on input.
mod time_format {
    use chrono::NaiveTime;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&time.format("%H:%M").to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).map_err(de::Error::custom)
    }

    pub(super) fn parse(raw: &str) -> Result<NaiveTime, String> {
        NaiveTime::parse_from_str(raw, "%H:%M")
            .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
            .map_err(|_| format!("invalid time '{raw}', expected HH:MM"))
    }
}

mod optional_time_format {
    use chrono::NaiveTime;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        time: &Option<NaiveTime>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match time {
            Some(t) => serializer.serialize_str(&t.format("%H:%M").to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<NaiveTime>, D::Error> {
        Option::<String>::deserialize(deserializer)?
            .map(|raw| super::time_format::parse(&raw).map_err(de::Error::custom))
            .transpose()
    }
}
