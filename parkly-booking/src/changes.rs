use chrono::{DateTime, Duration, Utc};
use parkly_core::ApiError;
use tracing::info;

use crate::models::{Booking, BookingStatus};
use crate::repository::BookingService;

/// Which actions a booking still offers its driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookingPolicy {
    pub cancellation_window: Duration,
}

impl Default for BookingPolicy {
    fn default() -> Self {
        Self {
            cancellation_window: Duration::hours(24),
        }
    }
}

impl BookingPolicy {
    pub fn new(cancellation_window: Duration) -> Self {
        Self { cancellation_window }
    }

    /// Confirmed bookings starting strictly more than the window away.
    pub fn cancellation_offered(&self, booking: &Booking, now: DateTime<Utc>) -> bool {
        booking.status == BookingStatus::Confirmed && booking.start_time - now > self.cancellation_window
    }

    pub fn check_in_offered(booking: &Booking) -> bool {
        booking.status != BookingStatus::Cancelled
    }

    pub async fn cancel(
        &self,
        service: &dyn BookingService,
        booking: &Booking,
        now: DateTime<Utc>,
    ) -> Result<(), CancelError> {
        if !self.cancellation_offered(booking, now) {
            return Err(CancelError::NotCancellable {
                booking_id: booking.id,
                window_hours: self.cancellation_window.num_hours(),
            });
        }
        service.cancel_booking(booking.id).await?;
        info!("Booking {} cancelled", booking.id);
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CancelError {
    #[error("Booking {booking_id} can only be cancelled more than {window_hours} hours before it starts")]
    NotCancellable { booking_id: i64, window_hours: i64 },

    #[error("Failed to cancel booking: {0}")]
    Request(#[from] ApiError),
}
