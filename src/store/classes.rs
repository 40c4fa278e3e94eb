use std::collections::HashMap;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::{Class, ClassStatus};
use crate::validation::room_key;

#[derive(Debug, Default)]
pub struct ClassTable {
    classes: HashMap<Uuid, Class>,
}

impl ClassTable {
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn get(&self, id: Uuid) -> Option<&Class> {
        self.classes.get(&id)
    }

    pub fn get_mut(&mut self, id: Uuid) -> Option<&mut Class> {
        self.classes.get_mut(&id)
    }

    pub fn insert(&mut self, class: Class) {
        self.classes.insert(class.id, class);
    }

    pub fn remove(&mut self, id: Uuid) -> Option<Class> {
        self.classes.remove(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Class> {
        self.classes.values()
    }

    pub fn by_monitor<'a, 'b>(
        &'a self,
        monitor_id: &'b str,
    ) -> impl Iterator<Item = &'a Class> + use<'a, 'b> {
        self.classes
            .values()
            .filter(move |class| class.monitor_id == monitor_id)
    }

    pub fn in_room<'a>(&'a self, room: &str) -> impl Iterator<Item = &'a Class> + use<'a> {
        let key = room_key(room);
        self.classes
            .values()
            .filter(move |class| room_key(&class.room) == key)
    }

    /// Takes one seat if the class still has room. Returns `false` when the
    /// class is missing or already full.
    pub fn try_reserve_seat(&mut self, id: Uuid) -> bool {
        match self.classes.get_mut(&id) {
            Some(class) if class.current_participants < class.max_participants => {
                class.current_participants += 1;
                true
            }
            _ => false,
        }
    }

    pub fn release_seat(&mut self, id: Uuid) {
        if let Some(class) = self.classes.get_mut(&id) {
            class.current_participants = class.current_participants.saturating_sub(1);
        }
    }

    /// ACTIVE classes whose end lies strictly before `now`.
    pub fn past_due(&self, now: DateTime<Utc>) -> Vec<Uuid> {
        self.classes
            .values()
            .filter(|class| class.status == ClassStatus::Active && class.ends_at() < now)
            .map(|class| class.id)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;

    fn class(max: u32) -> Class {
        let start = Utc.with_ymd_and_hms(2025, 1, 10, 10, 0, 0).unwrap();
        Class {
            id: Uuid::new_v4(),
            name: "Pilates".into(),
            description: String::new(),
            monitor_id: "m1".into(),
            monitor_name: "Marta".into(),
            schedule: start,
            duration: 60,
            room: "R1".into(),
            max_participants: max,
            current_participants: 0,
            status: ClassStatus::Active,
            created_at: start - Duration::days(1),
        }
    }

    #[test]
    fn test_reserve_seat_stops_at_capacity() {
        let mut table = ClassTable::default();
        let c = class(2);
        let id = c.id;
        table.insert(c);

        assert!(table.try_reserve_seat(id));
        assert!(table.try_reserve_seat(id));
        assert!(!table.try_reserve_seat(id));
        assert_eq!(table.get(id).unwrap().current_participants, 2);
        assert!(!table.try_reserve_seat(Uuid::new_v4()));
    }

    #[test]
    fn test_release_seat_floors_at_zero() {
        let mut table = ClassTable::default();
        let c = class(2);
        let id = c.id;
        table.insert(c);

        table.release_seat(id);
        assert_eq!(table.get(id).unwrap().current_participants, 0);
    }

    #[test]
    fn test_past_due_only_returns_finished_active_classes() {
        let mut table = ClassTable::default();
        let finished = class(5);
        let mut cancelled = class(5);
        cancelled.status = ClassStatus::Cancelled;
        table.insert(finished.clone());
        table.insert(cancelled);

        let during = finished.schedule + Duration::minutes(30);
        assert!(table.past_due(during).is_empty());
        assert!(table.past_due(finished.ends_at()).is_empty());
        let after = finished.ends_at() + Duration::seconds(1);
        assert_eq!(table.past_due(after), vec![finished.id]);
    }
}
