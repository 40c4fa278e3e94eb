use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use crate::gateway::{SubscriptionGate, UserDirectory};
use crate::models::{
    Actor, Booking, BookingFilter, BookingStatus, Class, ClassBooking, ClassStatus, Role,
};
use crate::store::Store;

use super::{ClassManager, ScheduleError, ScheduleResult};

/// Minutes before class start after which a booking can no longer be cancelled.
pub const CANCELLATION_CUTOFF_MIN: i64 = 60;

pub struct BookingManager {
    store: Arc<Store>,
    classes: Arc<ClassManager>,
    subscriptions: Arc<dyn SubscriptionGate>,
    directory: Arc<dyn UserDirectory>,
}

fn ensure_bookable(class: &Class, now: DateTime<Utc>) -> ScheduleResult<()> {
    if class.status != ClassStatus::Active {
        return Err(ScheduleError::InvalidState(
            "Class is not available for booking".into(),
        ));
    }
    if class.schedule <= now {
        return Err(ScheduleError::PastClass);
    }
    if class.is_full() {
        return Err(ScheduleError::ClassFull {
            max: class.max_participants,
        });
    }
    Ok(())
}

impl BookingManager {
    pub fn new(
        store: Arc<Store>,
        classes: Arc<ClassManager>,
        subscriptions: Arc<dyn SubscriptionGate>,
        directory: Arc<dyn UserDirectory>,
    ) -> Self {
        Self {
            store,
            classes,
            subscriptions,
            directory,
        }
    }

    /// Books a seat for the caller. The subscription check happens between an
    /// optimistic look at the class and the final re-check, which runs under
    /// the write lock together with the seat reservation and the insert.
    pub async fn create(
        &self,
        actor: &Actor,
        class_id: Uuid,
        now: DateTime<Utc>,
    ) -> ScheduleResult<Booking> {
        if actor.role != Role::Socio {
            return Err(ScheduleError::Forbidden(
                "Only members can book classes".into(),
            ));
        }

        {
            let tables = self.store.read().await;
            let class = tables
                .classes
                .get(class_id)
                .ok_or(ScheduleError::ClassNotFound(class_id))?;
            ensure_bookable(class, now)?;
        }

        match self.subscriptions.has_active_subscription(&actor.token).await {
            Ok(true) => {}
            Ok(false) => return Err(ScheduleError::SubscriptionRequired),
            Err(err) => {
                warn!(user_id = %actor.user_id, "subscription check failed: {err}");
                return Err(ScheduleError::ServiceUnavailable(
                    "could not verify subscription".into(),
                ));
            }
        }

        let mut tables = self.store.write().await;
        let class = tables
            .classes
            .get(class_id)
            .ok_or(ScheduleError::ClassNotFound(class_id))?;
        ensure_bookable(class, now)?;
        let class_name = class.name.clone();
        let max = class.max_participants;
        if tables
            .bookings
            .confirmed_for(&actor.user_id, class_id)
            .is_some()
        {
            return Err(ScheduleError::DuplicateBooking);
        }
        if !tables.classes.try_reserve_seat(class_id) {
            return Err(ScheduleError::ClassFull { max });
        }

        let booking = Booking {
            id: Uuid::new_v4(),
            user_id: actor.user_id.clone(),
            user_name: actor.name.clone(),
            class_id,
            class_name,
            booking_date: now,
            status: BookingStatus::Confirmed,
        };
        if !tables.bookings.insert(booking.clone()) {
            tables.classes.release_seat(class_id);
            return Err(ScheduleError::DuplicateBooking);
        }
        drop(tables);

        info!(
            booking_id = %booking.id,
            class_id = %class_id,
            user_id = %actor.user_id,
            "booking confirmed"
        );
        Ok(booking)
    }

    pub async fn cancel(
        &self,
        id: Uuid,
        actor: &Actor,
        now: DateTime<Utc>,
    ) -> ScheduleResult<Booking> {
        let mut tables = self.store.write().await;
        let booking = tables
            .bookings
            .get(id)
            .ok_or(ScheduleError::BookingNotFound(id))?;
        if booking.user_id != actor.user_id {
            return Err(ScheduleError::Forbidden(
                "You can only cancel your own bookings".into(),
            ));
        }
        if booking.status != BookingStatus::Confirmed {
            return Err(ScheduleError::InvalidState(
                "Booking is already cancelled or completed".into(),
            ));
        }
        let class_id = booking.class_id;
        let class = tables
            .classes
            .get(class_id)
            .ok_or(ScheduleError::ClassNotFound(class_id))?;
        let cutoff = class.schedule - Duration::minutes(CANCELLATION_CUTOFF_MIN);
        if now > cutoff {
            return Err(ScheduleError::TooLate { cutoff });
        }

        tables.bookings.set_status(id, BookingStatus::Cancelled);
        tables.classes.release_seat(class_id);
        let booking = tables
            .bookings
            .get(id)
            .cloned()
            .ok_or(ScheduleError::BookingNotFound(id))?;
        drop(tables);

        info!(
            booking_id = %id,
            class_id = %class_id,
            user_id = %actor.user_id,
            "booking cancelled"
        );
        Ok(booking)
    }

    pub async fn list_mine(
        &self,
        actor: &Actor,
        status: Option<BookingStatus>,
        now: DateTime<Utc>,
    ) -> Vec<Booking> {
        let filter = BookingFilter {
            status,
            user_id: Some(actor.user_id.clone()),
            class_id: None,
        };
        self.collect(&filter, now).await
    }

    /// Bookings of one class, visible to its monitor and to admins. Member
    /// e-mails are attached when the user directory answers; otherwise they are
    /// left out.
    pub async fn list_for_class(
        &self,
        class_id: Uuid,
        status: Option<BookingStatus>,
        actor: &Actor,
        now: DateTime<Utc>,
    ) -> ScheduleResult<Vec<ClassBooking>> {
        let class = self.classes.get(class_id, now).await?;
        let is_monitor = actor.role == Role::Monitor && class.monitor_id == actor.user_id;
        if !(actor.is_admin() || is_monitor) {
            return Err(ScheduleError::Forbidden(
                "Only the class monitor or an admin can view its bookings".into(),
            ));
        }
        let filter = BookingFilter {
            status,
            user_id: None,
            class_id: Some(class_id),
        };
        let bookings = self.collect(&filter, now).await;

        let emails: HashMap<String, String> = match self.directory.list_users(&actor.token).await {
            Ok(users) => users.into_iter().map(|user| (user.id, user.email)).collect(),
            Err(err) => {
                warn!(class_id = %class_id, "user directory unavailable, omitting e-mails: {err}");
                HashMap::new()
            }
        };

        Ok(bookings
            .into_iter()
            .map(|booking| ClassBooking {
                user_email: emails.get(&booking.user_id).cloned(),
                booking,
            })
            .collect())
    }

    pub async fn list_all(
        &self,
        filter: &BookingFilter,
        actor: &Actor,
        now: DateTime<Utc>,
    ) -> ScheduleResult<Vec<Booking>> {
        if !actor.is_admin() {
            return Err(ScheduleError::Forbidden(
                "Only admins can list all bookings".into(),
            ));
        }
        Ok(self.collect(filter, now).await)
    }

    /// Newest first.
    async fn collect(&self, filter: &BookingFilter, now: DateTime<Utc>) -> Vec<Booking> {
        self.classes.mark_completed_classes(now).await;
        let tables = self.store.read().await;
        let mut bookings: Vec<Booking> = tables
            .bookings
            .iter()
            .filter(|booking| filter.matches(booking))
            .cloned()
            .collect();
        bookings.sort_by(|a, b| b.booking_date.cmp(&a.booking_date));
        bookings
    }
}
