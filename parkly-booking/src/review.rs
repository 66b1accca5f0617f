use parkly_core::ApiError;
use std::collections::BTreeSet;
use tracing::{info, warn};

use crate::models::UnmatchedDetection;
use crate::repository::BookingService;

#[derive(Debug, thiserror::Error)]
pub enum ReviewError {
    #[error("No vehicles selected")]
    NothingSelected,

    #[error("Failed to update vehicle logs: {0}")]
    Request(#[from] ApiError),
}

/// Unmatched detections awaiting the host's "visited" acknowledgement.
///
/// Selection is a set keyed by vehicle-log id. A successful bulk update
/// removes exactly the selected entries and closes the queue once it is
/// empty; a failed one leaves entries and selection untouched.
#[derive(Debug, Default)]
pub struct ReviewQueue {
    entries: Vec<UnmatchedDetection>,
    selected: BTreeSet<i64>,
    open: bool,
}

impl ReviewQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the queue contents. Opens only when there is something to review.
    pub fn load(&mut self, entries: Vec<UnmatchedDetection>) {
        self.open = !entries.is_empty();
        self.entries = entries;
        self.selected.clear();
    }

    pub async fn refresh(&mut self, service: &dyn BookingService, owner_id: i64) -> Result<usize, ReviewError> {
        let entries = service.unmatched_detections(owner_id).await?;
        info!("{} unmatched detections pending for owner {}", entries.len(), owner_id);
        self.load(entries);
        Ok(self.entries.len())
    }

    pub fn entries(&self) -> &[UnmatchedDetection] {
        &self.entries
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn close(&mut self) {
        self.open = false;
    }

    /// Flip selection of one entry. Unknown ids are ignored. Returns whether
    /// the entry is selected afterwards.
    pub fn toggle(&mut self, log_id: i64) -> bool {
        if !self.entries.iter().any(|e| e.id == log_id) {
            return false;
        }
        if !self.selected.remove(&log_id) {
            self.selected.insert(log_id);
            return true;
        }
        false
    }

    pub fn is_selected(&self, log_id: i64) -> bool {
        self.selected.contains(&log_id)
    }

    pub fn selected_ids(&self) -> Vec<i64> {
        self.selected.iter().copied().collect()
    }

    pub fn can_submit(&self) -> bool {
        !self.selected.is_empty()
    }

    /// Mark every selected entry visited in one request.
    pub async fn mark_selected_visited(&mut self, service: &dyn BookingService) -> Result<Vec<i64>, ReviewError> {
        if self.selected.is_empty() {
            return Err(ReviewError::NothingSelected);
        }
        let ids = self.selected_ids();

        if let Err(e) = service.mark_visited(&ids).await {
            warn!("Marking {} vehicle logs visited failed: {}", ids.len(), e);
            return Err(e.into());
        }

        let selected = std::mem::take(&mut self.selected);
        self.entries.retain(|e| !selected.contains(&e.id));
        if self.entries.is_empty() {
            self.open = false;
        }
        info!("Marked vehicle logs {:?} visited; {} remaining", ids, self.entries.len());
        Ok(ids)
    }
}
