use std::ops::RangeInclusive;

use chrono::{DateTime, Utc};

use crate::scheduling::ScheduleError;

pub const DURATION_RANGE: RangeInclusive<u32> = 15..=180;
pub const PARTICIPANTS_RANGE: RangeInclusive<u32> = 1..=50;
const MAX_NAME_LEN: usize = 100;
const MAX_DESCRIPTION_LEN: usize = 500;

pub fn validate_name(value: &str) -> Result<String, ScheduleError> {
    let name = value.trim();
    if name.is_empty() {
        return Err(ScheduleError::Validation("name is required".into()));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(ScheduleError::Validation(format!(
            "name must be at most {MAX_NAME_LEN} characters"
        )));
    }
    Ok(name.to_string())
}

pub fn validate_description(value: Option<&str>) -> Result<String, ScheduleError> {
    let description = value.map(str::trim).unwrap_or_default();
    if description.chars().count() > MAX_DESCRIPTION_LEN {
        return Err(ScheduleError::Validation(format!(
            "description must be at most {MAX_DESCRIPTION_LEN} characters"
        )));
    }
    Ok(description.to_string())
}

pub fn validate_duration(value: u32) -> Result<u32, ScheduleError> {
    if DURATION_RANGE.contains(&value) {
        Ok(value)
    } else {
        Err(ScheduleError::Validation(format!(
            "duration must be between {} and {} minutes",
            DURATION_RANGE.start(),
            DURATION_RANGE.end()
        )))
    }
}

pub fn validate_max_participants(value: u32) -> Result<u32, ScheduleError> {
    if PARTICIPANTS_RANGE.contains(&value) {
        Ok(value)
    } else {
        Err(ScheduleError::Validation(format!(
            "maxParticipants must be between {} and {}",
            PARTICIPANTS_RANGE.start(),
            PARTICIPANTS_RANGE.end()
        )))
    }
}

/// Trims the room identifier and collapses inner whitespace runs.
pub fn canonical_room(value: &str) -> Result<String, ScheduleError> {
    let room = value.split_whitespace().collect::<Vec<_>>().join(" ");
    if room.is_empty() {
        return Err(ScheduleError::Validation("room is required".into()));
    }
    Ok(room)
}

/// Key two rooms are compared by: canonical form, case-insensitive.
pub fn room_key(room: &str) -> String {
    room.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

pub fn validate_future(
    schedule: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Result<DateTime<Utc>, ScheduleError> {
    if schedule > now {
        Ok(schedule)
    } else {
        Err(ScheduleError::Validation(
            "schedule must be in the future".into(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    #[test]
    fn test_validate_duration() {
        assert!(validate_duration(15).is_ok());
        assert!(validate_duration(180).is_ok());
        assert!(validate_duration(14).is_err());
        assert!(validate_duration(181).is_err());
    }

    #[test]
    fn test_validate_max_participants() {
        assert!(validate_max_participants(1).is_ok());
        assert!(validate_max_participants(50).is_ok());
        assert!(validate_max_participants(0).is_err());
        assert!(validate_max_participants(51).is_err());
    }

    #[test]
    fn test_validate_name() {
        assert_eq!(validate_name("  Spinning ").unwrap(), "Spinning");
        assert!(validate_name("   ").is_err());
        assert!(validate_name(&"x".repeat(101)).is_err());
    }

    #[test]
    fn test_canonical_room() {
        assert_eq!(canonical_room("  Sala   2 ").unwrap(), "Sala 2");
        assert!(canonical_room(" \t ").is_err());
        assert_eq!(room_key("SALA  2"), room_key(" sala 2"));
    }

    #[test]
    fn test_validate_future() {
        let now = Utc::now();
        assert!(validate_future(now + Duration::minutes(1), now).is_ok());
        assert!(validate_future(now, now).is_err());
        assert!(validate_future(now - Duration::minutes(1), now).is_err());
    }
}
