use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct BookingCommittedEvent {
    pub booking_id: i64,
    pub parking_id: i64,
    pub payment_id: String,
    pub amount_minor: i64,
    pub timestamp: i64,
}

/// Charge went through but the booking could not be created.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PaymentOrphanedEvent {
    pub parking_id: i64,
    pub user_id: i64,
    pub payment_id: String,
    pub amount_minor: i64,
    pub reason: String,
    pub timestamp: i64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CheckInMatchedEvent {
    pub booking_id: i64,
    pub plate: String,
    pub confidence: Option<f64>,
    pub timestamp: i64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct UnmatchedCheckInEvent {
    pub booking_id: i64,
    pub reported_plates: String,
    pub timestamp: i64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct DetectionsAcknowledgedEvent {
    pub owner_id: i64,
    pub log_ids: Vec<i64>,
    pub timestamp: i64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct BookingCancelledEvent {
    pub booking_id: i64,
    pub timestamp: i64,
}

/// Everything the client announces on its in-process event bus.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ParkingEvent {
    BookingCommitted(BookingCommittedEvent),
    PaymentOrphaned(PaymentOrphanedEvent),
    CheckInMatched(CheckInMatchedEvent),
    UnmatchedCheckIn(UnmatchedCheckInEvent),
    DetectionsAcknowledged(DetectionsAcknowledgedEvent),
    BookingCancelled(BookingCancelledEvent),
}

impl ParkingEvent {
    pub fn now() -> i64 {
        chrono::Utc::now().timestamp()
    }
}
