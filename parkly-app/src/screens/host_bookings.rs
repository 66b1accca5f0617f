use chrono::{DateTime, Utc};
use parkly_booking::{host_view, Booking, DateFilter, StatusFilter, VehicleLog};
use tokio::sync::Mutex;

use crate::error::AppError;
use crate::state::AppState;

/// Bookings across a host's listings, or for one listing.
pub struct HostBookingsScreen {
    state: AppState,
    parking_id: Option<i64>,
    bookings: Mutex<Vec<Booking>>,
}

impl HostBookingsScreen {
    pub fn new(state: AppState, parking_id: Option<i64>) -> Self {
        Self {
            state,
            parking_id,
            bookings: Mutex::new(Vec::new()),
        }
    }

    pub async fn refresh(&self) -> Result<usize, AppError> {
        let service = &self.state.ports.bookings;
        let list = match self.parking_id {
            Some(parking_id) => service.list_for_parking(parking_id).await?,
            None => service.list_for_owner(self.state.session.user_id).await?,
        };
        let count = list.len();
        *self.bookings.lock().await = list;
        Ok(count)
    }

    pub async fn view(&self, status: StatusFilter, date: DateFilter, now: DateTime<Utc>) -> Vec<Booking> {
        host_view(&self.bookings.lock().await, status, date, now)
    }

    pub async fn vehicle_logs(&self, booking_id: i64) -> Result<Vec<VehicleLog>, AppError> {
        Ok(self.state.ports.bookings.vehicle_logs(booking_id).await?)
    }
}
