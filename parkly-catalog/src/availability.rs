use parkly_core::ApiError;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::listing::ParkingDirectory;
use crate::pricing::TimeWindow;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AvailabilityStatus {
    #[default]
    Unknown,
    Available,
    Unavailable,
}

/// The input an availability answer belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AvailabilityKey {
    pub parking_id: i64,
    pub window: TimeWindow,
}

/// Handed out when a check starts; the answer is only applied if the ticket
/// is still the newest one when the response arrives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AvailabilityTicket {
    pub key: AvailabilityKey,
    pub generation: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Applied(AvailabilityStatus),
    Failed,
    /// A newer edit superseded this request; the answer was dropped.
    Stale,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum AvailabilityError {
    #[error("Failed to check parking availability: {0}")]
    Request(#[from] ApiError),

    #[error("End time must be after start time.")]
    InvalidWindow,
}

/// Last-edit-wins bookkeeping for availability answers.
///
/// Every edit of the time range bumps a monotonic generation. Responses
/// carry the ticket they were issued with and are discarded unless both the
/// generation and the key still match.
#[derive(Debug, Default)]
pub struct AvailabilityTracker {
    generation: u64,
    current: Option<AvailabilityKey>,
    status: AvailabilityStatus,
    in_flight: bool,
    last_error: Option<String>,
}

impl AvailabilityTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a check for `key`. Status drops back to `Unknown` until answered.
    pub fn request(&mut self, key: AvailabilityKey) -> AvailabilityTicket {
        self.generation += 1;
        self.current = Some(key);
        self.status = AvailabilityStatus::Unknown;
        self.in_flight = true;
        self.last_error = None;
        AvailabilityTicket { key, generation: self.generation }
    }

    /// The window stopped being checkable (end cleared or not after start).
    pub fn invalidate(&mut self) {
        self.generation += 1;
        self.current = None;
        self.status = AvailabilityStatus::Unknown;
        self.in_flight = false;
        self.last_error = None;
    }

    pub fn resolve(
        &mut self,
        ticket: &AvailabilityTicket,
        result: Result<bool, AvailabilityError>,
    ) -> Resolution {
        if ticket.generation != self.generation || self.current != Some(ticket.key) {
            debug!(
                "Discarding stale availability answer (gen {} vs current {})",
                ticket.generation, self.generation
            );
            return Resolution::Stale;
        }

        self.in_flight = false;
        match result {
            Ok(true) => {
                self.status = AvailabilityStatus::Available;
                Resolution::Applied(self.status)
            }
            Ok(false) => {
                self.status = AvailabilityStatus::Unavailable;
                Resolution::Applied(self.status)
            }
            Err(e) => {
                self.status = AvailabilityStatus::Unknown;
                self.last_error = Some(e.to_string());
                Resolution::Failed
            }
        }
    }

    pub fn status(&self) -> AvailabilityStatus {
        self.status
    }

    pub fn is_checking(&self) -> bool {
        self.in_flight
    }

    pub fn current_key(&self) -> Option<AvailabilityKey> {
        self.current
    }

    /// Message of the last failed check, kept until the next edit so the
    /// screen can offer a retry.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }
}

/// Issues availability queries against the directory.
#[derive(Clone)]
pub struct AvailabilityChecker {
    directory: Arc<dyn ParkingDirectory>,
}

impl AvailabilityChecker {
    pub fn new(directory: Arc<dyn ParkingDirectory>) -> Self {
        Self { directory }
    }

    pub async fn query(&self, ticket: &AvailabilityTicket) -> Result<bool, AvailabilityError> {
        if !ticket.key.window.is_valid() {
            return Err(AvailabilityError::InvalidWindow);
        }

        match self.directory.check_availability(&ticket.key).await {
            Ok(available) => {
                info!(
                    "Parking {} available={} for {} -> {}",
                    ticket.key.parking_id, available, ticket.key.window.start, ticket.key.window.end
                );
                Ok(available)
            }
            Err(e) => {
                warn!("Availability check failed for parking {}: {}", ticket.key.parking_id, e);
                Err(e.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listing::{HostSummary, ParkingListing};
    use async_trait::async_trait;
    use chrono::{Duration, TimeZone, Utc};
    use std::collections::HashMap;
    use tokio::sync::{oneshot, Mutex};

    fn key(end_hour: i64) -> AvailabilityKey {
        let start = Utc.with_ymd_and_hms(2026, 10, 20, 10, 0, 0).unwrap();
        AvailabilityKey {
            parking_id: 1,
            window: TimeWindow::new(start, start + Duration::hours(end_hour)),
        }
    }

    #[test]
    fn test_stale_answer_is_discarded() {
        let mut tracker = AvailabilityTracker::new();
        let first = tracker.request(key(1));
        let second = tracker.request(key(2));

        assert_eq!(tracker.resolve(&second, Ok(false)), Resolution::Applied(AvailabilityStatus::Unavailable));
        // the older request answers late
        assert_eq!(tracker.resolve(&first, Ok(true)), Resolution::Stale);
        assert_eq!(tracker.status(), AvailabilityStatus::Unavailable);
    }

    #[test]
    fn test_same_key_new_generation_still_supersedes() {
        let mut tracker = AvailabilityTracker::new();
        let first = tracker.request(key(1));
        let again = tracker.request(key(1));
        assert_eq!(tracker.resolve(&first, Ok(true)), Resolution::Stale);
        assert_eq!(tracker.resolve(&again, Ok(true)), Resolution::Applied(AvailabilityStatus::Available));
    }

    #[test]
    fn test_failure_leaves_unknown_and_records_error() {
        let mut tracker = AvailabilityTracker::new();
        let ticket = tracker.request(key(1));
        let result = tracker.resolve(&ticket, Err(ApiError::Transport("connection refused".into()).into()));
        assert_eq!(result, Resolution::Failed);
        assert_eq!(tracker.status(), AvailabilityStatus::Unknown);
        assert!(tracker.last_error().unwrap().contains("connection refused"));
        assert!(!tracker.is_checking());
    }

    #[test]
    fn test_invalidate_drops_in_flight_answer() {
        let mut tracker = AvailabilityTracker::new();
        let ticket = tracker.request(key(1));
        tracker.invalidate();
        assert_eq!(tracker.resolve(&ticket, Ok(true)), Resolution::Stale);
        assert_eq!(tracker.status(), AvailabilityStatus::Unknown);
        assert!(tracker.current_key().is_none());
    }

    /// Directory whose answers are released by the test, per window length.
    struct GatedDirectory {
        gates: Mutex<HashMap<i64, oneshot::Receiver<bool>>>,
    }

    #[async_trait]
    impl ParkingDirectory for GatedDirectory {
        async fn get_listing(&self, _parking_id: i64) -> Result<ParkingListing, ApiError> {
            Err(ApiError::Status { status: 404, message: "not used".into() })
        }

        async fn check_availability(&self, key: &AvailabilityKey) -> Result<bool, ApiError> {
            let hours = (key.window.end - key.window.start).num_hours();
            let gate = self.gates.lock().await.remove(&hours).expect("gate registered");
            gate.await.map_err(|e| ApiError::Transport(e.to_string()))
        }

        async fn host_summary(&self, _owner_id: i64) -> Result<HostSummary, ApiError> {
            Ok(HostSummary::default())
        }
    }

    #[tokio::test]
    async fn test_out_of_order_completion_keeps_latest_edit() {
        let (tx_first, rx_first) = oneshot::channel();
        let (tx_second, rx_second) = oneshot::channel();
        let mut gates = HashMap::new();
        gates.insert(1, rx_first);
        gates.insert(2, rx_second);

        let checker = AvailabilityChecker::new(Arc::new(GatedDirectory { gates: Mutex::new(gates) }));
        let tracker = Arc::new(Mutex::new(AvailabilityTracker::new()));

        let first = tracker.lock().await.request(key(1));
        let second = tracker.lock().await.request(key(2));

        let run = |ticket: AvailabilityTicket| {
            let checker = checker.clone();
            let tracker = tracker.clone();
            async move {
                let result = checker.query(&ticket).await;
                tracker.lock().await.resolve(&ticket, result)
            }
        };

        let first_task = tokio::spawn(run(first));
        let second_task = tokio::spawn(run(second));

        // newest answers first, then the superseded one
        tx_second.send(false).unwrap();
        let second_resolution = second_task.await.unwrap();
        tx_first.send(true).unwrap();
        let first_resolution = first_task.await.unwrap();

        assert_eq!(second_resolution, Resolution::Applied(AvailabilityStatus::Unavailable));
        assert_eq!(first_resolution, Resolution::Stale);
        assert_eq!(tracker.lock().await.status(), AvailabilityStatus::Unavailable);
    }
}
