use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::models::{Class, ClassStatus};
use crate::store::ClassTable;

/// Half-open time window `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSlot {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeSlot {
    pub fn new(start: DateTime<Utc>, duration_min: u32) -> Self {
        Self {
            start,
            end: start + Duration::minutes(i64::from(duration_min)),
        }
    }

    pub fn of(class: &Class) -> Self {
        Self::new(class.schedule, class.duration)
    }

    /// Touching endpoints do not overlap.
    pub fn overlaps(&self, other: &TimeSlot) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// First non-cancelled class among `candidates` whose window overlaps `slot`.
pub fn first_overlap<'a>(
    candidates: impl IntoIterator<Item = &'a Class>,
    slot: &TimeSlot,
    exclude: Option<Uuid>,
) -> Option<&'a Class> {
    candidates
        .into_iter()
        .filter(|class| class.status != ClassStatus::Cancelled)
        .filter(|class| Some(class.id) != exclude)
        .find(|class| TimeSlot::of(class).overlaps(slot))
}

pub fn find_monitor_conflict<'a>(
    classes: &'a ClassTable,
    monitor_id: &str,
    start: DateTime<Utc>,
    duration_min: u32,
    exclude: Option<Uuid>,
) -> Option<&'a Class> {
    let slot = TimeSlot::new(start, duration_min);
    first_overlap(classes.by_monitor(monitor_id), &slot, exclude)
}

pub fn find_room_conflict<'a>(
    classes: &'a ClassTable,
    room: &str,
    start: DateTime<Utc>,
    duration_min: u32,
    exclude: Option<Uuid>,
) -> Option<&'a Class> {
    let slot = TimeSlot::new(start, duration_min);
    first_overlap(classes.in_room(room), &slot, exclude)
}
