//! In-memory booking service for unit tests.

use async_trait::async_trait;
use parkly_core::ApiError;
use tokio::sync::Mutex;

use crate::models::{Booking, NewBooking, UnmatchedDetection, VehicleLog};
use crate::repository::BookingService;

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Create(NewBooking),
    Cancel(i64),
    Confirm(i64, String),
    Report(i64, String),
    MarkVisited(Vec<i64>),
}

#[derive(Default)]
pub struct FakeBookings {
    pub calls: Mutex<Vec<Call>>,
    pub fail_with: Mutex<Option<ApiError>>,
    pub created: Mutex<Option<Booking>>,
    pub detections: Mutex<Vec<UnmatchedDetection>>,
}

impl FakeBookings {
    pub fn failing(error: ApiError) -> Self {
        Self { fail_with: Mutex::new(Some(error)), ..Default::default() }
    }

    pub async fn calls(&self) -> Vec<Call> {
        self.calls.lock().await.clone()
    }

    async fn record(&self, call: Call) -> Result<(), ApiError> {
        self.calls.lock().await.push(call);
        match self.fail_with.lock().await.clone() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl BookingService for FakeBookings {
    async fn create_booking(&self, booking: &NewBooking) -> Result<Booking, ApiError> {
        self.record(Call::Create(booking.clone())).await?;
        self.created
            .lock()
            .await
            .clone()
            .ok_or_else(|| ApiError::Decode("no canned booking".into()))
    }

    async fn cancel_booking(&self, booking_id: i64) -> Result<(), ApiError> {
        self.record(Call::Cancel(booking_id)).await
    }

    async fn list_for_user(&self, _user_id: i64) -> Result<Vec<Booking>, ApiError> {
        Ok(Vec::new())
    }

    async fn list_for_owner(&self, _owner_id: i64) -> Result<Vec<Booking>, ApiError> {
        Ok(Vec::new())
    }

    async fn list_for_parking(&self, _parking_id: i64) -> Result<Vec<Booking>, ApiError> {
        Ok(Vec::new())
    }

    async fn confirm_check_in(&self, booking_id: i64, plate: &str) -> Result<(), ApiError> {
        self.record(Call::Confirm(booking_id, plate.to_string())).await
    }

    async fn report_unmatched(&self, booking_id: i64, reported_plates: &str) -> Result<(), ApiError> {
        self.record(Call::Report(booking_id, reported_plates.to_string())).await
    }

    async fn vehicle_logs(&self, _booking_id: i64) -> Result<Vec<VehicleLog>, ApiError> {
        Ok(Vec::new())
    }

    async fn unmatched_detections(&self, _owner_id: i64) -> Result<Vec<UnmatchedDetection>, ApiError> {
        Ok(self.detections.lock().await.clone())
    }

    async fn mark_visited(&self, log_ids: &[i64]) -> Result<(), ApiError> {
        self.record(Call::MarkVisited(log_ids.to_vec())).await
    }
}
