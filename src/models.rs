use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::validation::room_key;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Socio,
    Monitor,
    Admin,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Role::Socio => "socio",
            Role::Monitor => "monitor",
            Role::Admin => "admin",
        };
        f.write_str(name)
    }
}

/// Verified caller of a request. The credential is kept so it can be forwarded
/// to the services this one depends on.
#[derive(Debug, Clone, PartialEq)]
pub struct Actor {
    pub user_id: String,
    pub role: Role,
    pub name: String,
    pub email: String,
    pub token: String,
}

impl Actor {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn has_role(&self, roles: &[Role]) -> bool {
        roles.contains(&self.role)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClassStatus {
    Active,
    Cancelled,
    Completed,
}

impl ClassStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, ClassStatus::Active)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    Confirmed,
    Cancelled,
    Completed,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Class {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub monitor_id: String,
    pub monitor_name: String,
    #[schema(value_type = String, format = "date-time", example = "2025-01-10T10:00:00Z")]
    pub schedule: DateTime<Utc>,
    /// Minutes.
    pub duration: u32,
    pub room: String,
    pub max_participants: u32,
    pub current_participants: u32,
    pub status: ClassStatus,
    #[schema(value_type = String, format = "date-time")]
    pub created_at: DateTime<Utc>,
}

impl Class {
    pub fn ends_at(&self) -> DateTime<Utc> {
        self.schedule + Duration::minutes(i64::from(self.duration))
    }

    pub fn is_full(&self) -> bool {
        self.current_participants >= self.max_participants
    }

    pub fn free_spots(&self) -> u32 {
        self.max_participants.saturating_sub(self.current_participants)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: Uuid,
    pub user_id: String,
    pub user_name: String,
    pub class_id: Uuid,
    /// Snapshot of the class name at booking time.
    pub class_name: String,
    #[schema(value_type = String, format = "date-time")]
    pub booking_date: DateTime<Utc>,
    pub status: BookingStatus,
}

/// Booking as seen by the monitor of its class, with the member's e-mail when
/// the user directory could provide it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClassBooking {
    #[serde(flatten)]
    pub booking: Booking,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_email: Option<String>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateClassRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[schema(value_type = String, format = "date-time")]
    pub schedule: DateTime<Utc>,
    pub duration: u32,
    pub max_participants: u32,
    pub room: String,
    /// Only honoured for admins creating a class on a monitor's behalf.
    #[serde(default)]
    pub monitor_id: Option<String>,
    #[serde(default)]
    pub monitor_name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateClassRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub schedule: Option<DateTime<Utc>>,
    pub duration: Option<u32>,
    pub max_participants: Option<u32>,
    pub room: Option<String>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingRequest {
    pub class_id: Uuid,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassFilter {
    pub status: Option<ClassStatus>,
    pub monitor_id: Option<String>,
    pub room: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingFilter {
    pub status: Option<BookingStatus>,
    pub user_id: Option<String>,
    pub class_id: Option<Uuid>,
}

impl ClassFilter {
    pub fn matches(&self, class: &Class) -> bool {
        self.status.is_none_or(|status| class.status == status)
            && self
                .monitor_id
                .as_deref()
                .is_none_or(|monitor| class.monitor_id == monitor)
            && self
                .room
                .as_deref()
                .is_none_or(|room| room_key(room) == room_key(&class.room))
            && self.from.is_none_or(|from| class.schedule >= from)
            && self.to.is_none_or(|to| class.schedule <= to)
    }
}

impl BookingFilter {
    pub fn matches(&self, booking: &Booking) -> bool {
        self.status.is_none_or(|status| booking.status == status)
            && self
                .user_id
                .as_deref()
                .is_none_or(|user| booking.user_id == user)
            && self.class_id.is_none_or(|class| booking.class_id == class)
    }
}
