//! In-process entity stores.
//!
//! Both tables live behind a single lock so that a lifecycle transition and
//! everything it cascades into commit together: a write guard is held from the
//! conflict or capacity check until the last mutation of the transition.

mod bookings;
mod classes;

pub use bookings::BookingTable;
pub use classes::ClassTable;

use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Debug, Default)]
pub struct Tables {
    pub classes: ClassTable,
    pub bookings: BookingTable,
}

#[derive(Debug, Default)]
pub struct Store {
    tables: RwLock<Tables>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn read(&self) -> RwLockReadGuard<'_, Tables> {
        self.tables.read().await
    }

    pub async fn write(&self) -> RwLockWriteGuard<'_, Tables> {
        self.tables.write().await
    }
}
