use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::models::Class;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictScope {
    Monitor,
    Room,
}

impl ConflictScope {
    pub fn as_str(self) -> &'static str {
        match self {
            ConflictScope::Monitor => "monitor",
            ConflictScope::Room => "room",
        }
    }

    fn label(self) -> &'static str {
        match self {
            ConflictScope::Monitor => "Monitor",
            ConflictScope::Room => "Room",
        }
    }
}

/// The class a proposed time slot collided with.
#[derive(Debug, Clone, PartialEq)]
pub struct Collision {
    pub scope: ConflictScope,
    pub class_id: Uuid,
    pub name: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Collision {
    pub fn new(scope: ConflictScope, class: &Class) -> Self {
        Self {
            scope,
            class_id: class.id,
            name: class.name.clone(),
            start: class.schedule,
            end: class.ends_at(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("{0}")]
    Validation(String),
    #[error("Class not found: {0}")]
    ClassNotFound(Uuid),
    #[error("Booking not found: {0}")]
    BookingNotFound(Uuid),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    InvalidState(String),
    #[error("Class has already started")]
    PastClass,
    #[error(
        "{} schedule conflict with class '{}' ({} - {})",
        .0.scope.label(),
        .0.name,
        .0.start.format("%Y-%m-%d %H:%M"),
        .0.end.format("%H:%M")
    )]
    ScheduleConflict(Collision),
    #[error("Class is full ({max} participants)")]
    ClassFull { max: u32 },
    #[error("maxParticipants ({requested}) cannot be lower than current participants ({current})")]
    CapacityBelowOccupancy { requested: u32, current: u32 },
    #[error("You already have a confirmed booking for this class")]
    DuplicateBooking,
    #[error("An active subscription is required to book classes")]
    SubscriptionRequired,
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),
    #[error("Bookings can only be cancelled until {cutoff}")]
    TooLate { cutoff: DateTime<Utc> },
    #[error("Class has {count} confirmed bookings and cannot be deleted")]
    HasActiveBookings { count: usize },
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_conflict_message_names_class_and_window() {
        let err = ScheduleError::ScheduleConflict(Collision {
            scope: ConflictScope::Room,
            class_id: Uuid::new_v4(),
            name: "Yoga".into(),
            start: Utc.with_ymd_and_hms(2025, 1, 10, 10, 0, 0).unwrap(),
            end: Utc.with_ymd_and_hms(2025, 1, 10, 11, 0, 0).unwrap(),
        });
        assert_eq!(
            err.to_string(),
            "Room schedule conflict with class 'Yoga' (2025-01-10 10:00 - 11:00)"
        );
    }
}
