use parkly_booking::{ReviewQueue, UnmatchedDetection};
use parkly_catalog::HostSummary;
use parkly_shared::models::events::DetectionsAcknowledgedEvent;
use parkly_shared::ParkingEvent;
use tokio::sync::Mutex;
use tracing::warn;

use crate::error::{AppError, Notice};
use crate::state::AppState;

/// Host landing page: earnings summary plus the unmatched-vehicle review sheet.
pub struct DashboardScreen {
    state: AppState,
    summary: Mutex<Option<HostSummary>>,
    review: Mutex<ReviewQueue>,
}

impl DashboardScreen {
    pub fn new(state: AppState) -> Self {
        Self {
            state,
            summary: Mutex::new(None),
            review: Mutex::new(ReviewQueue::new()),
        }
    }

    /// The summary must load; the review queue is best effort.
    pub async fn load(&self) -> Result<(), AppError> {
        let owner_id = self.state.session.user_id;
        let summary = self.state.ports.directory.host_summary(owner_id).await?;
        *self.summary.lock().await = Some(summary);

        let mut review = self.review.lock().await;
        if let Err(e) = review.refresh(self.state.ports.bookings.as_ref(), owner_id).await {
            warn!("Could not load unmatched vehicles: {}", e);
        }
        Ok(())
    }

    pub async fn summary(&self) -> Option<HostSummary> {
        self.summary.lock().await.clone()
    }

    pub async fn is_review_open(&self) -> bool {
        self.review.lock().await.is_open()
    }

    pub async fn review_entries(&self) -> Vec<UnmatchedDetection> {
        self.review.lock().await.entries().to_vec()
    }

    pub async fn toggle(&self, log_id: i64) -> bool {
        self.review.lock().await.toggle(log_id)
    }

    pub async fn selected(&self) -> Vec<i64> {
        self.review.lock().await.selected_ids()
    }

    pub async fn close_review(&self) {
        self.review.lock().await.close();
    }

    pub async fn mark_visited(&self) -> Result<Notice, AppError> {
        let log_ids = self
            .review
            .lock()
            .await
            .mark_selected_visited(self.state.ports.bookings.as_ref())
            .await?;

        let count = log_ids.len();
        self.state.publish(ParkingEvent::DetectionsAcknowledged(DetectionsAcknowledgedEvent {
            owner_id: self.state.session.user_id,
            log_ids,
            timestamp: ParkingEvent::now(),
        }));
        Ok(Notice::new(
            "Success",
            format!("{} vehicle{} marked as visited.", count, if count == 1 { "" } else { "s" }),
        ))
    }
}
