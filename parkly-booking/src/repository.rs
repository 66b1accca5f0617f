use async_trait::async_trait;
use parkly_core::ApiError;

use crate::models::{Booking, NewBooking, UnmatchedDetection, VehicleLog};

/// Booking-side endpoints of the marketplace API.
#[async_trait]
pub trait BookingService: Send + Sync {
    async fn create_booking(&self, booking: &NewBooking) -> Result<Booking, ApiError>;

    async fn cancel_booking(&self, booking_id: i64) -> Result<(), ApiError>;

    async fn list_for_user(&self, user_id: i64) -> Result<Vec<Booking>, ApiError>;

    async fn list_for_owner(&self, owner_id: i64) -> Result<Vec<Booking>, ApiError>;

    async fn list_for_parking(&self, parking_id: i64) -> Result<Vec<Booking>, ApiError>;

    /// Record a recognized plate against the booking.
    async fn confirm_check_in(&self, booking_id: i64, plate: &str) -> Result<(), ApiError>;

    /// Forward the raw recognizer output for host review.
    async fn report_unmatched(&self, booking_id: i64, reported_plates: &str) -> Result<(), ApiError>;

    async fn vehicle_logs(&self, booking_id: i64) -> Result<Vec<VehicleLog>, ApiError>;

    async fn unmatched_detections(&self, owner_id: i64) -> Result<Vec<UnmatchedDetection>, ApiError>;

    async fn mark_visited(&self, log_ids: &[i64]) -> Result<(), ApiError>;
}
