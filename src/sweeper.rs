use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::debug;

use crate::scheduling::ClassManager;

/// Background task that periodically completes classes that have ended.
pub async fn run_completion_sweep(classes: Arc<ClassManager>, every: Duration) {
    let mut interval = tokio::time::interval(every);
    loop {
        interval.tick().await;
        let report = classes.mark_completed_classes(Utc::now()).await;
        debug!(
            classes = report.classes,
            bookings = report.bookings,
            "completion sweep finished"
        );
    }
}
