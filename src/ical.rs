use icalendar::{Calendar, Component, Event, EventLike};

use crate::models::Class;

#[derive(Clone)]
pub struct ICalExporter {
    calendar_name: String,
}

impl ICalExporter {
    pub fn new(calendar_name: impl Into<String>) -> Self {
        Self {
            calendar_name: calendar_name.into(),
        }
    }

    pub fn generate(&self, classes: &[Class]) -> Vec<u8> {
        let mut calendar = Calendar::new();
        calendar.name(&self.calendar_name);

        for class in classes {
            let mut event = Event::new();
            event.summary(&class.name);
            event.starts(class.schedule);
            event.ends(class.ends_at());
            event.location(&class.room);
            event.description(&format!(
                "{}\nMonitor: {}\nFree spots: {}/{}",
                class.description,
                class.monitor_name,
                class.free_spots(),
                class.max_participants
            ));
            event.uid(&format!("{}@gym-classes", class.id));
            calendar.push(event);
        }

        calendar.to_string().into_bytes()
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    use super::*;
    use crate::models::ClassStatus;

    fn class(name: &str) -> Class {
        Class {
            id: Uuid::new_v4(),
            name: name.into(),
            description: "Bring a towel".into(),
            monitor_id: "m1".into(),
            monitor_name: "Coach Carla".into(),
            schedule: Utc.with_ymd_and_hms(2025, 11, 24, 6, 0, 0).unwrap(),
            duration: 45,
            room: "Sala 1".into(),
            max_participants: 12,
            current_participants: 4,
            status: ClassStatus::Active,
            created_at: Utc.with_ymd_and_hms(2025, 11, 1, 6, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_generate_single_class() {
        let exporter = ICalExporter::new("Gym");
        let body = String::from_utf8(exporter.generate(&[class("HIIT")])).unwrap();
        assert!(body.contains("BEGIN:VEVENT"));
        assert!(body.contains("SUMMARY:HIIT"));
        assert!(body.contains("LOCATION:Sala 1"));
        assert!(body.contains("Free spots: 8/12"));
    }

    #[test]
    fn test_generate_empty_calendar() {
        let exporter = ICalExporter::new("Gym");
        let body = String::from_utf8(exporter.generate(&[])).unwrap();
        assert!(body.contains("BEGIN:VCALENDAR"));
        assert!(!body.contains("BEGIN:VEVENT"));
    }
}
