mod bookings;
mod classes;
pub mod conflict;
mod error;

pub use bookings::{BookingManager, CANCELLATION_CUTOFF_MIN};
pub use classes::{ClassManager, SweepReport};
pub use conflict::{TimeSlot, find_monitor_conflict, find_room_conflict};
pub use error::{Collision, ConflictScope, ScheduleError};

pub type ScheduleResult<T> = Result<T, ScheduleError>;
