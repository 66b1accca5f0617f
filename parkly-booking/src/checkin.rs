use parkly_core::detection::{PlateRecognizer, PlateReport};
use parkly_core::ApiError;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::changes::BookingPolicy;
use crate::models::{Booking, BookingStatus};
use crate::repository::BookingService;

/// Uppercase ASCII letters and digits only: `"abc-123 "` becomes `"ABC123"`.
pub fn normalize_plate(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pipeline {
    Custom,
    EasyOcr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlateMatch {
    /// Normalized candidate that matched.
    pub plate: String,
    pub pipeline: Pipeline,
    pub confidence: Option<f64>,
}

/// First candidate whose normalized form is contained in the registered
/// plate. Custom-model candidates are tried before EasyOCR ones.
///
/// Candidates that normalize to nothing are skipped; an empty string would
/// be contained in every plate.
pub fn match_plate(registered: &str, report: &PlateReport) -> Option<PlateMatch> {
    let allowed = normalize_plate(registered);
    if allowed.is_empty() {
        return None;
    }

    let pipelines = [
        (Pipeline::Custom, &report.custom_plates, &report.custom_confidence),
        (Pipeline::EasyOcr, &report.easyocr_plates, &report.easyocr_confidence),
    ];
    for (pipeline, plates, scores) in pipelines {
        for (i, candidate) in plates.iter().enumerate() {
            let normalized = normalize_plate(candidate);
            if !normalized.is_empty() && allowed.contains(&normalized) {
                return Some(PlateMatch {
                    plate: normalized,
                    pipeline,
                    confidence: scores.get(i).copied(),
                });
            }
        }
    }
    None
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CheckInState {
    #[default]
    Pending,
    Matched { plate: String },
}

#[derive(Debug, Clone, PartialEq)]
pub enum CheckInOutcome {
    Matched(PlateMatch),
    /// Nothing matched; the raw candidates were forwarded for host review.
    Unmatched { reported_plates: String },
}

#[derive(Debug, thiserror::Error)]
pub enum CheckInError {
    #[error("Booking {booking_id} is {status} and cannot be checked in")]
    NotEligible { booking_id: i64, status: BookingStatus },

    #[error("Booking {0} is already checked in")]
    AlreadyCheckedIn(i64),

    #[error("A check-in is already running")]
    InFlight,

    #[error("Plate recognition failed: {0}")]
    RecognitionFailed(#[source] ApiError),

    #[error("Failed to confirm check-in: {0}")]
    Confirm(#[source] ApiError),

    #[error("Failed to report unmatched vehicle: {0}")]
    Reporting(#[source] ApiError),
}

/// Runs one plate capture against a booking and records the result.
pub struct CheckInReconciler {
    recognizer: Arc<dyn PlateRecognizer>,
    bookings: Arc<dyn BookingService>,
    states: Mutex<HashMap<i64, CheckInState>>,
    running: AtomicBool,
}

impl CheckInReconciler {
    pub fn new(recognizer: Arc<dyn PlateRecognizer>, bookings: Arc<dyn BookingService>) -> Self {
        Self {
            recognizer,
            bookings,
            states: Mutex::new(HashMap::new()),
            running: AtomicBool::new(false),
        }
    }

    pub async fn state(&self, booking_id: i64) -> CheckInState {
        self.states
            .lock()
            .await
            .get(&booking_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub async fn check_in(&self, booking: &Booking) -> Result<CheckInOutcome, CheckInError> {
        if !BookingPolicy::check_in_offered(booking) {
            return Err(CheckInError::NotEligible {
                booking_id: booking.id,
                status: booking.status,
            });
        }
        if let CheckInState::Matched { .. } = self.state(booking.id).await {
            return Err(CheckInError::AlreadyCheckedIn(booking.id));
        }
        if self
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(CheckInError::InFlight);
        }

        let result = self.reconcile(booking).await;
        self.running.store(false, Ordering::Release);
        result
    }

    async fn reconcile(&self, booking: &Booking) -> Result<CheckInOutcome, CheckInError> {
        let report = self.recognizer.recognize().await.map_err(|e| {
            warn!("Plate recognition failed for booking {}: {}", booking.id, e);
            CheckInError::RecognitionFailed(e)
        })?;

        match match_plate(&booking.vehicle_number, &report) {
            Some(found) => {
                self.bookings
                    .confirm_check_in(booking.id, &found.plate)
                    .await
                    .map_err(CheckInError::Confirm)?;
                info!(
                    "Booking {} checked in with plate {} ({:?})",
                    booking.id, found.plate, found.pipeline
                );
                self.states.lock().await.insert(
                    booking.id,
                    CheckInState::Matched {
                        plate: found.plate.clone(),
                    },
                );
                Ok(CheckInOutcome::Matched(found))
            }
            None => {
                let reported_plates = report.reported_plates();
                warn!(
                    "No detected plate matches booking {} (expected {}); reporting {:?}",
                    booking.id, booking.vehicle_number, reported_plates
                );
                self.bookings
                    .report_unmatched(booking.id, &reported_plates)
                    .await
                    .map_err(CheckInError::Reporting)?;
                Ok(CheckInOutcome::Unmatched { reported_plates })
            }
        }
    }
}
