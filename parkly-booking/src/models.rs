use chrono::{DateTime, Utc};
use parkly_core::wire::{iso8601, iso8601_opt, lenient_string};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    Confirmed,
    Completed,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Confirmed => "CONFIRMED",
            BookingStatus::Completed => "COMPLETED",
            BookingStatus::Cancelled => "CANCELLED",
        }
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A reservation as the booking endpoints return it.
///
/// The list endpoints for drivers and hosts decorate the same record with
/// different contact fields, so everything past the core columns is optional.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    #[serde(rename = "bookingId", alias = "id")]
    pub id: i64,
    #[serde(default)]
    pub parking_id: Option<i64>,
    #[serde(default)]
    pub user_id: Option<i64>,
    #[serde(with = "iso8601")]
    pub start_time: DateTime<Utc>,
    #[serde(with = "iso8601")]
    pub end_time: DateTime<Utc>,
    #[serde(default)]
    pub vehicle_number: String,
    #[serde(default, with = "lenient_string")]
    pub slot_number: Option<String>,
    #[serde(default, alias = "totalPrice")]
    pub price: Decimal,
    pub status: BookingStatus,
    #[serde(default, with = "iso8601_opt", alias = "createdDate")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub payment_id: Option<String>,
    #[serde(default)]
    pub parking_name: Option<String>,
    #[serde(default)]
    pub parking_address: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub owner_name: Option<String>,
    #[serde(default)]
    pub owner_phone: Option<String>,
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub customer_phone: Option<String>,
}

/// Body of `POST /api/booking/create`. Sent only after a successful charge.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewBooking {
    pub user_id: i64,
    pub parking_id: i64,
    #[serde(with = "iso8601")]
    pub start_time: DateTime<Utc>,
    #[serde(with = "iso8601")]
    pub end_time: DateTime<Utc>,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_price: Decimal,
    pub vehicle_number: String,
    pub payment_id: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DetectionStatus {
    Matched,
    Unmatched,
    PendingReview,
}

/// One camera detection recorded against a booking.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VehicleLog {
    #[serde(default)]
    pub plate_number: String,
    #[serde(with = "iso8601")]
    pub detected_at: DateTime<Utc>,
    pub matched_booking_status: DetectionStatus,
}

/// A detection the host has not reviewed yet.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UnmatchedDetection {
    #[serde(rename = "vehicleLogId")]
    pub id: i64,
    #[serde(default)]
    pub plate_number: String,
    #[serde(with = "iso8601")]
    pub detected_at: DateTime<Utc>,
    #[serde(default)]
    pub parking_name: Option<String>,
    #[serde(default)]
    pub parking_address: Option<String>,
    #[serde(default)]
    pub booking_id: Option<i64>,
    #[serde(default)]
    pub expected_vehicle_number: Option<String>,
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub customer_phone: Option<String>,
    #[serde(default, with = "iso8601_opt")]
    pub booking_start_time: Option<DateTime<Utc>>,
    #[serde(default, with = "iso8601_opt")]
    pub booking_end_time: Option<DateTime<Utc>>,
}

impl UnmatchedDetection {
    pub fn readings(&self) -> PlateReadings {
        PlateReadings::parse(&self.plate_number)
    }
}

/// The two recognizer outputs packed into a reported plate string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlateReadings {
    pub easyocr: String,
    pub custom: String,
}

impl PlateReadings {
    const MISSING: &'static str = "N/A";

    /// Splits on the first comma; OCR noise (`~`) is dropped.
    pub fn parse(raw: &str) -> Self {
        let (first, second) = match raw.split_once(',') {
            Some((a, b)) => (a, Some(b)),
            None => (raw, None),
        };
        let clean = |s: &str| {
            let s = s.replace('~', "");
            let s = s.trim();
            if s.is_empty() {
                Self::MISSING.to_string()
            } else {
                s.to_string()
            }
        };
        Self {
            easyocr: clean(first),
            custom: second.map(clean).unwrap_or_else(|| Self::MISSING.to_string()),
        }
    }
}
