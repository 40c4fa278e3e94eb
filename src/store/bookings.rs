use std::collections::HashMap;

use uuid::Uuid;

use crate::models::{Booking, BookingStatus};

/// Bookings plus a unique index over `(user_id, class_id)` for CONFIRMED rows.
#[derive(Debug, Default)]
pub struct BookingTable {
    bookings: HashMap<Uuid, Booking>,
    confirmed: HashMap<(String, Uuid), Uuid>,
}

impl BookingTable {
    pub fn len(&self) -> usize {
        self.bookings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bookings.is_empty()
    }

    pub fn get(&self, id: Uuid) -> Option<&Booking> {
        self.bookings.get(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Booking> {
        self.bookings.values()
    }

    pub fn confirmed_for(&self, user_id: &str, class_id: Uuid) -> Option<&Booking> {
        self.confirmed
            .get(&(user_id.to_string(), class_id))
            .and_then(|id| self.bookings.get(id))
    }

    /// Inserts the booking unless it would be a second CONFIRMED row for the
    /// same user and class. Returns whether it was stored.
    #[must_use]
    pub fn insert(&mut self, booking: Booking) -> bool {
        if booking.status == BookingStatus::Confirmed {
            let key = (booking.user_id.clone(), booking.class_id);
            if self.confirmed.contains_key(&key) {
                return false;
            }
            self.confirmed.insert(key, booking.id);
        }
        self.bookings.insert(booking.id, booking);
        true
    }

    pub fn set_status(&mut self, id: Uuid, status: BookingStatus) -> Option<&Booking> {
        let booking = self.bookings.get_mut(&id)?;
        let key = (booking.user_id.clone(), booking.class_id);
        if booking.status == BookingStatus::Confirmed && status != BookingStatus::Confirmed {
            self.confirmed.remove(&key);
        }
        booking.status = status;
        Some(booking)
    }

    pub fn for_class(&self, class_id: Uuid) -> impl Iterator<Item = &Booking> {
        self.bookings
            .values()
            .filter(move |booking| booking.class_id == class_id)
    }

    pub fn confirmed_count(&self, class_id: Uuid) -> usize {
        self.for_class(class_id)
            .filter(|booking| booking.status == BookingStatus::Confirmed)
            .count()
    }

    /// Moves every CONFIRMED booking of the class to `status`. Returns how
    /// many bookings changed.
    pub fn cascade(&mut self, class_id: Uuid, status: BookingStatus) -> usize {
        let ids: Vec<Uuid> = self
            .for_class(class_id)
            .filter(|booking| booking.status == BookingStatus::Confirmed)
            .map(|booking| booking.id)
            .collect();
        for id in &ids {
            self.set_status(*id, status);
        }
        ids.len()
    }

    pub fn remove_for_class(&mut self, class_id: Uuid) -> usize {
        let before = self.bookings.len();
        self.bookings.retain(|_, booking| booking.class_id != class_id);
        self.confirmed.retain(|(_, class), _| *class != class_id);
        before - self.bookings.len()
    }
}
