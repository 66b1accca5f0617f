use chrono::{DateTime, Utc};
use parkly_booking::{Booking, BookingPolicy, BookingStatus, CheckInOutcome, StatusFilter};
use parkly_shared::models::events::{BookingCancelledEvent, CheckInMatchedEvent, UnmatchedCheckInEvent};
use parkly_shared::ParkingEvent;
use tokio::sync::Mutex;
use tracing::info;

use crate::error::{AppError, Notice};
use crate::state::AppState;

/// Which buttons a booking card shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookingActions {
    pub cancel: bool,
    pub check_in: bool,
}

/// The driver's own bookings.
pub struct BookingsScreen {
    state: AppState,
    bookings: Mutex<Vec<Booking>>,
    filter: Mutex<StatusFilter>,
}

impl BookingsScreen {
    pub fn new(state: AppState) -> Self {
        Self {
            state,
            bookings: Mutex::new(Vec::new()),
            filter: Mutex::new(StatusFilter::All),
        }
    }

    pub async fn refresh(&self) -> Result<usize, AppError> {
        let list = self
            .state
            .ports
            .bookings
            .list_for_user(self.state.session.user_id)
            .await?;
        for booking in list.iter().filter(|b| b.status == BookingStatus::Completed) {
            self.state.cache.complete(booking.id).await;
        }
        let count = list.len();
        *self.bookings.lock().await = list;
        Ok(count)
    }

    pub async fn set_filter(&self, filter: StatusFilter) {
        *self.filter.lock().await = filter;
    }

    pub async fn visible(&self) -> Vec<Booking> {
        let filter = *self.filter.lock().await;
        let bookings = self.bookings.lock().await;
        filter.apply(&bookings).into_iter().cloned().collect()
    }

    pub fn actions(&self, booking: &Booking, now: DateTime<Utc>) -> BookingActions {
        BookingActions {
            cancel: self.state.policy.cancellation_offered(booking, now),
            check_in: BookingPolicy::check_in_offered(booking),
        }
    }

    async fn find(&self, booking_id: i64) -> Result<Booking, AppError> {
        self.bookings
            .lock()
            .await
            .iter()
            .find(|b| b.id == booking_id)
            .cloned()
            .ok_or(AppError::BookingNotFound(booking_id))
    }

    /// Cancel, then reload the list so the new status shows.
    pub async fn cancel(&self, booking_id: i64, now: DateTime<Utc>) -> Result<Notice, AppError> {
        self.state.ensure_session(now)?;
        let booking = self.find(booking_id).await?;
        self.state
            .policy
            .cancel(self.state.ports.bookings.as_ref(), &booking, now)
            .await?;

        self.state.publish(ParkingEvent::BookingCancelled(BookingCancelledEvent {
            booking_id,
            timestamp: ParkingEvent::now(),
        }));
        self.state.cache.forget(booking_id).await;
        self.refresh().await?;
        Ok(Notice::new("Success", format!("Booking#{} cancelled.", booking_id)))
    }

    pub async fn check_in(&self, booking_id: i64) -> Result<Notice, AppError> {
        let booking = self.find(booking_id).await?;

        match self.state.reconciler.check_in(&booking).await? {
            CheckInOutcome::Matched(found) => {
                self.state.publish(ParkingEvent::CheckInMatched(CheckInMatchedEvent {
                    booking_id,
                    plate: found.plate.clone(),
                    confidence: found.confidence,
                    timestamp: ParkingEvent::now(),
                }));
                let confidence = found
                    .confidence
                    .map(|c| format!("{:.2}", c))
                    .unwrap_or_else(|| "N/A".to_string());
                info!("Check-in matched for booking {}", booking_id);
                Ok(Notice::new(
                    "Checked In",
                    format!("Vehicle {} detected (confidence {}).", found.plate, confidence),
                ))
            }
            CheckInOutcome::Unmatched { reported_plates } => {
                self.state.publish(ParkingEvent::UnmatchedCheckIn(UnmatchedCheckInEvent {
                    booking_id,
                    reported_plates,
                    timestamp: ParkingEvent::now(),
                }));
                Ok(Notice::new(
                    "Mismatch",
                    "Can not check in as plate number does not match.",
                ))
            }
        }
    }
}
