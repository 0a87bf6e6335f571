//! Request validation for session writes. Failures map to 400 responses.

use chrono::NaiveTime;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::session::{NewSession, Session, SessionStatus, SessionUpdate};
use crate::sessions::keywords::KeywordSet;

fn require_text(field: &str, value: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

fn check_time_window(start: NaiveTime, end: NaiveTime) -> Result<(), AppError> {
    if end <= start {
        return Err(AppError::Validation(
            "end_time must be after start_time".to_string(),
        ));
    }
    Ok(())
}

fn check_max_participants(max: Option<i32>) -> Result<(), AppError> {
    match max {
        Some(n) if n < 1 => Err(AppError::Validation(
            "max_participants must be at least 1".to_string(),
        )),
        _ => Ok(()),
    }
}

/// A session is either a plain session or a full exchange: the offered
/// skill, the requested skill and the requesting user come together.
fn check_exchange_refs(
    skill_id: Option<Uuid>,
    requested_skill_id: Option<Uuid>,
    requested_by: Option<Uuid>,
) -> Result<(), AppError> {
    let set = [skill_id, requested_skill_id, requested_by]
        .iter()
        .filter(|r| r.is_some())
        .count();
    if set != 0 && set != 3 {
        return Err(AppError::Validation(
            "skill_id, requested_skill_id and requested_by must be supplied together".to_string(),
        ));
    }
    Ok(())
}

fn normalize_metadata(metadata: Vec<String>) -> Vec<String> {
    KeywordSet::new(metadata).to_vec()
}

pub fn validate_new_session(mut new: NewSession) -> Result<NewSession, AppError> {
    require_text("title", &new.title)?;
    require_text("skill_category", &new.skill_category)?;
    check_time_window(new.start_time, new.end_time)?;
    check_max_participants(new.max_participants)?;
    check_exchange_refs(new.skill_id, new.requested_skill_id, new.requested_by)?;

    new.metadata = new.metadata.map(normalize_metadata);
    Ok(new)
}

/// Validates a partial update against the session it will be applied to.
pub fn validate_update(
    mut update: SessionUpdate,
    current: &Session,
) -> Result<SessionUpdate, AppError> {
    if let Some(title) = &update.title {
        require_text("title", title)?;
    }
    if let Some(category) = &update.skill_category {
        require_text("skill_category", category)?;
    }
    if let Some(status) = &update.status {
        if SessionStatus::parse(status).is_none() {
            return Err(AppError::Validation(format!(
                "status must be one of upcoming, completed, cancelled; got '{status}'"
            )));
        }
    }
    check_max_participants(update.max_participants.flatten())?;
    check_time_window(
        update.start_time.unwrap_or(current.start_time),
        update.end_time.unwrap_or(current.end_time),
    )?;
    check_exchange_refs(
        update.skill_id.or(current.skill_id),
        update.requested_skill_id.or(current.requested_skill_id),
        update.requested_by.or(current.requested_by),
    )?;

    update.metadata = update.metadata.map(|m| m.map(normalize_metadata));
    Ok(update)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sessions::test_support::{new_session, session};

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn test_valid_session_normalizes_metadata() {
        let mut new = new_session(Uuid::new_v4());
        new.metadata = Some(vec!["Python".into(), " ML".into(), "python".into(), "".into()]);
        let validated = validate_new_session(new).unwrap();
        assert_eq!(
            validated.metadata,
            Some(vec!["ml".to_string(), "python".to_string()])
        );
    }

    #[test]
    fn test_blank_title_rejected() {
        let mut new = new_session(Uuid::new_v4());
        new.title = "   ".to_string();
        assert!(matches!(
            validate_new_session(new),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_end_before_start_rejected() {
        let mut new = new_session(Uuid::new_v4());
        new.start_time = t(11, 0);
        new.end_time = t(10, 0);
        assert!(validate_new_session(new).is_err());
    }

    #[test]
    fn test_zero_max_participants_rejected() {
        let mut new = new_session(Uuid::new_v4());
        new.max_participants = Some(0);
        assert!(validate_new_session(new).is_err());
    }

    #[test]
    fn test_update_rejects_unknown_status() {
        let update = SessionUpdate {
            status: Some("archived".to_string()),
            ..Default::default()
        };
        assert!(validate_update(update, &session(Uuid::new_v4(), &[])).is_err());
    }

    #[test]
    fn test_update_checks_merged_time_window() {
        // Stored window is 10:00-10:59.
        let current = session(Uuid::new_v4(), &[]);
        let update = SessionUpdate {
            end_time: Some(t(9, 30)),
            ..Default::default()
        };
        assert!(validate_update(update, &current).is_err());

        let update = SessionUpdate {
            start_time: Some(t(10, 30)),
            ..Default::default()
        };
        assert!(validate_update(update, &current).is_ok());
    }

    #[test]
    fn test_partial_exchange_refs_rejected_on_create() {
        let mut new = new_session(Uuid::new_v4());
        new.skill_id = Some(Uuid::new_v4());
        assert!(matches!(
            validate_new_session(new.clone()),
            Err(AppError::Validation(_))
        ));

        new.requested_skill_id = Some(Uuid::new_v4());
        new.requested_by = Some(Uuid::new_v4());
        assert!(validate_new_session(new).is_ok());
    }

    #[test]
    fn test_update_exchange_refs_checked_against_stored_row() {
        let plain = session(Uuid::new_v4(), &[]);
        let partial = SessionUpdate {
            requested_by: Some(Uuid::new_v4()),
            ..Default::default()
        };
        assert!(validate_update(partial.clone(), &plain).is_err());

        let mut exchange = plain.clone();
        exchange.skill_id = Some(Uuid::new_v4());
        exchange.requested_skill_id = Some(Uuid::new_v4());
        exchange.requested_by = Some(Uuid::new_v4());
        assert!(validate_update(partial, &exchange).is_ok());
    }

    #[test]
    fn test_update_clearing_nullable_fields_is_allowed() {
        let update = SessionUpdate {
            max_participants: Some(None),
            metadata: Some(None),
            ..Default::default()
        };
        let validated = validate_update(update, &session(Uuid::new_v4(), &["rust"])).unwrap();
        assert_eq!(validated.max_participants, Some(None));
        assert_eq!(validated.metadata, Some(None));

        let update = SessionUpdate {
            max_participants: Some(Some(0)),
            ..Default::default()
        };
        assert!(validate_update(update, &session(Uuid::new_v4(), &[])).is_err());
    }
}
