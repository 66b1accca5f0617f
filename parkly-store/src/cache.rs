use parkly_booking::Booking;
use tokio::sync::RwLock;

/// The driver's most recent booking plus bookings they have finished.
#[derive(Debug, Default)]
pub struct BookingCache {
    active: RwLock<Option<Booking>>,
    completed: RwLock<Vec<Booking>>,
}

impl BookingCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_active(&self, booking: Booking) {
        *self.active.write().await = Some(booking);
    }

    pub async fn active(&self) -> Option<Booking> {
        self.active.read().await.clone()
    }

    /// Moves the active booking to the completed list if ids match.
    pub async fn complete(&self, booking_id: i64) -> bool {
        let mut active = self.active.write().await;
        match active.take() {
            Some(booking) if booking.id == booking_id => {
                self.completed.write().await.push(booking);
                true
            }
            other => {
                *active = other;
                false
            }
        }
    }

    pub async fn completed(&self) -> Vec<Booking> {
        self.completed.read().await.clone()
    }

    /// Drop a cancelled booking wherever it is cached.
    pub async fn forget(&self, booking_id: i64) {
        let mut active = self.active.write().await;
        if active.as_ref().is_some_and(|b| b.id == booking_id) {
            *active = None;
        }
        self.completed.write().await.retain(|b| b.id != booking_id);
    }
}
