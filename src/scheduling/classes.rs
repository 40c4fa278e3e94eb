use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::{
    Actor, BookingStatus, Class, ClassFilter, ClassStatus, CreateClassRequest, Role,
    UpdateClassRequest,
};
use crate::store::{Store, Tables};
use crate::validation::{
    canonical_room, validate_description, validate_duration, validate_future,
    validate_max_participants, validate_name,
};

use super::conflict::{find_monitor_conflict, find_room_conflict};
use super::{Collision, ConflictScope, ScheduleError, ScheduleResult};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepReport {
    pub classes: usize,
    pub bookings: usize,
}

pub struct ClassManager {
    store: Arc<Store>,
}

/// Rejects the slot if it collides with another class of the same monitor or
/// in the same room.
fn ensure_free_slot(
    tables: &Tables,
    monitor_id: &str,
    room: &str,
    start: DateTime<Utc>,
    duration: u32,
    exclude: Option<Uuid>,
) -> ScheduleResult<()> {
    if let Some(existing) =
        find_monitor_conflict(&tables.classes, monitor_id, start, duration, exclude)
    {
        return Err(ScheduleError::ScheduleConflict(Collision::new(
            ConflictScope::Monitor,
            existing,
        )));
    }
    if let Some(existing) = find_room_conflict(&tables.classes, room, start, duration, exclude) {
        return Err(ScheduleError::ScheduleConflict(Collision::new(
            ConflictScope::Room,
            existing,
        )));
    }
    Ok(())
}

fn ensure_manager(class: &Class, actor: &Actor) -> ScheduleResult<()> {
    if actor.is_admin() || (actor.role == Role::Monitor && class.monitor_id == actor.user_id) {
        Ok(())
    } else {
        Err(ScheduleError::Forbidden(
            "Only the class monitor or an admin can manage this class".into(),
        ))
    }
}

impl ClassManager {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    pub async fn create(
        &self,
        actor: &Actor,
        request: CreateClassRequest,
        now: DateTime<Utc>,
    ) -> ScheduleResult<Class> {
        if !actor.has_role(&[Role::Monitor, Role::Admin]) {
            return Err(ScheduleError::Forbidden(
                "Only monitors and admins can create classes".into(),
            ));
        }
        let (monitor_id, monitor_name) = match (actor.role, request.monitor_id) {
            (Role::Admin, Some(monitor_id)) => {
                let monitor_id = monitor_id.trim().to_string();
                if monitor_id.is_empty() {
                    return Err(ScheduleError::Validation(
                        "monitorId must not be empty".into(),
                    ));
                }
                let monitor_name = request
                    .monitor_name
                    .map(|name| name.trim().to_string())
                    .filter(|name| !name.is_empty())
                    .unwrap_or_else(|| monitor_id.clone());
                (monitor_id, monitor_name)
            }
            _ => (actor.user_id.clone(), actor.name.clone()),
        };

        let class = Class {
            id: Uuid::new_v4(),
            name: validate_name(&request.name)?,
            description: validate_description(request.description.as_deref())?,
            monitor_id,
            monitor_name,
            schedule: validate_future(request.schedule, now)?,
            duration: validate_duration(request.duration)?,
            room: canonical_room(&request.room)?,
            max_participants: validate_max_participants(request.max_participants)?,
            current_participants: 0,
            status: ClassStatus::Active,
            created_at: now,
        };

        let mut tables = self.store.write().await;
        ensure_free_slot(
            &tables,
            &class.monitor_id,
            &class.room,
            class.schedule,
            class.duration,
            None,
        )
        .inspect_err(|err| {
            info!(monitor_id = %class.monitor_id, room = %class.room, "class rejected: {err}")
        })?;
        tables.classes.insert(class.clone());
        drop(tables);

        info!(
            class_id = %class.id,
            monitor_id = %class.monitor_id,
            room = %class.room,
            schedule = %class.schedule,
            "class created"
        );
        Ok(class)
    }

    pub async fn update(
        &self,
        id: Uuid,
        changes: UpdateClassRequest,
        actor: &Actor,
        now: DateTime<Utc>,
    ) -> ScheduleResult<Class> {
        let mut tables = self.store.write().await;
        let current = tables
            .classes
            .get(id)
            .cloned()
            .ok_or(ScheduleError::ClassNotFound(id))?;
        ensure_manager(&current, actor)?;
        if current.status.is_terminal() {
            return Err(ScheduleError::InvalidState(
                "Cannot modify a cancelled or completed class".into(),
            ));
        }
        if current.schedule <= now {
            return Err(ScheduleError::InvalidState(
                "Cannot modify a class that has already started".into(),
            ));
        }

        let mut updated = current.clone();
        if let Some(name) = changes.name {
            updated.name = validate_name(&name)?;
        }
        if let Some(description) = changes.description {
            updated.description = validate_description(Some(&description))?;
        }
        if let Some(schedule) = changes.schedule {
            if schedule != current.schedule {
                validate_future(schedule, now)?;
            }
            updated.schedule = schedule;
        }
        if let Some(duration) = changes.duration {
            updated.duration = validate_duration(duration)?;
        }
        if let Some(room) = changes.room {
            updated.room = canonical_room(&room)?;
        }
        if let Some(max) = changes.max_participants {
            let max = validate_max_participants(max)?;
            if max < current.current_participants {
                return Err(ScheduleError::CapacityBelowOccupancy {
                    requested: max,
                    current: current.current_participants,
                });
            }
            updated.max_participants = max;
        }

        ensure_free_slot(
            &tables,
            &updated.monitor_id,
            &updated.room,
            updated.schedule,
            updated.duration,
            Some(id),
        )?;
        tables.classes.insert(updated.clone());
        drop(tables);

        info!(class_id = %id, actor = %actor.user_id, "class updated");
        Ok(updated)
    }

    /// Cancels the class together with all of its confirmed bookings. A class
    /// that has already ended is completed instead and cannot be cancelled.
    pub async fn cancel(
        &self,
        id: Uuid,
        actor: &Actor,
        now: DateTime<Utc>,
    ) -> ScheduleResult<Class> {
        self.mark_completed_classes(now).await;
        let mut tables = self.store.write().await;
        let class = tables
            .classes
            .get_mut(id)
            .ok_or(ScheduleError::ClassNotFound(id))?;
        ensure_manager(class, actor)?;
        match class.status {
            ClassStatus::Cancelled => {
                return Err(ScheduleError::InvalidState(
                    "Class is already cancelled".into(),
                ));
            }
            ClassStatus::Completed => {
                return Err(ScheduleError::InvalidState(
                    "Cannot cancel a completed class".into(),
                ));
            }
            ClassStatus::Active => {}
        }
        class.status = ClassStatus::Cancelled;
        let class = class.clone();
        let cancelled = tables.bookings.cascade(id, BookingStatus::Cancelled);
        drop(tables);

        info!(class_id = %id, actor = %actor.user_id, bookings = cancelled, "class cancelled");
        Ok(class)
    }

    /// Removes the class and every booking that references it. Refused while
    /// any booking is still confirmed.
    pub async fn delete(&self, id: Uuid, actor: &Actor) -> ScheduleResult<()> {
        if !actor.is_admin() {
            return Err(ScheduleError::Forbidden(
                "Only admins can delete classes".into(),
            ));
        }
        let mut tables = self.store.write().await;
        if tables.classes.get(id).is_none() {
            return Err(ScheduleError::ClassNotFound(id));
        }
        let count = tables.bookings.confirmed_count(id);
        if count > 0 {
            return Err(ScheduleError::HasActiveBookings { count });
        }
        let removed = tables.bookings.remove_for_class(id);
        tables.classes.remove(id);
        drop(tables);

        info!(class_id = %id, bookings = removed, "class deleted");
        Ok(())
    }

    /// Completes every ACTIVE class that has already ended, and their confirmed
    /// bookings with them. Running it again is a no-op.
    pub async fn mark_completed_classes(&self, now: DateTime<Utc>) -> SweepReport {
        if self.store.read().await.classes.past_due(now).is_empty() {
            return SweepReport::default();
        }

        let mut tables = self.store.write().await;
        let mut report = SweepReport::default();
        for id in tables.classes.past_due(now) {
            if let Some(class) = tables.classes.get_mut(id) {
                class.status = ClassStatus::Completed;
                report.classes += 1;
                report.bookings += tables.bookings.cascade(id, BookingStatus::Completed);
            }
        }
        drop(tables);

        if report.classes > 0 {
            info!(classes = report.classes, bookings = report.bookings, "completed past classes");
        }
        report
    }

    pub async fn get(&self, id: Uuid, now: DateTime<Utc>) -> ScheduleResult<Class> {
        self.mark_completed_classes(now).await;
        self.store
            .read()
            .await
            .classes
            .get(id)
            .cloned()
            .ok_or(ScheduleError::ClassNotFound(id))
    }

    pub async fn list(&self, filter: &ClassFilter, now: DateTime<Utc>) -> Vec<Class> {
        self.mark_completed_classes(now).await;
        let tables = self.store.read().await;
        let mut classes: Vec<Class> = tables
            .classes
            .iter()
            .filter(|class| filter.matches(class))
            .cloned()
            .collect();
        classes.sort_by_key(|class| class.schedule);
        classes
    }

    pub async fn list_for_monitor(
        &self,
        actor: &Actor,
        now: DateTime<Utc>,
    ) -> ScheduleResult<Vec<Class>> {
        if !actor.has_role(&[Role::Monitor, Role::Admin]) {
            warn!(user_id = %actor.user_id, role = %actor.role, "monitor listing refused");
            return Err(ScheduleError::Forbidden(
                "Only monitors can list their classes".into(),
            ));
        }
        let filter = ClassFilter {
            monitor_id: Some(actor.user_id.clone()),
            ..ClassFilter::default()
        };
        Ok(self.list(&filter, now).await)
    }

    /// ACTIVE classes that have not started yet.
    pub async fn upcoming(&self, now: DateTime<Utc>) -> Vec<Class> {
        let filter = ClassFilter {
            status: Some(ClassStatus::Active),
            from: Some(now),
            ..ClassFilter::default()
        };
        self.list(&filter, now).await
    }
}
