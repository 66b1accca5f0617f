use async_trait::async_trait;
use parkly_core::ApiError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::availability::AvailabilityKey;

/// Optional amenities a host can advertise.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ParkingFeatures {
    #[serde(default)]
    pub has_roof: Option<bool>,
    #[serde(default)]
    pub cctv_available: Option<bool>,
    #[serde(default)]
    pub is_indoor: Option<bool>,
}

impl ParkingFeatures {
    pub fn labels(&self) -> Vec<&'static str> {
        let mut labels = Vec::new();
        if self.has_roof.unwrap_or(false) {
            labels.push("Roofed");
        }
        if self.cctv_available.unwrap_or(false) {
            labels.push("CCTV");
        }
        if self.is_indoor.unwrap_or(false) {
            labels.push("Indoor");
        }
        labels
    }
}

/// A space listed by a host. Read-mostly from the client's side.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ParkingListing {
    pub id: i64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub address: String,
    /// Hourly rate in major currency units.
    pub charges: Decimal,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub total_slots: Option<u32>,
    #[serde(default)]
    pub available_slots: Option<u32>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(flatten)]
    pub features: ParkingFeatures,
}

impl ParkingListing {
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        self.latitude.zip(self.longitude)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Revenue {
    #[serde(default)]
    pub daily: Decimal,
    #[serde(default)]
    pub weekly: Decimal,
    #[serde(default)]
    pub monthly: Decimal,
}

/// Earnings and capacity across every listing a host owns.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HostSummary {
    #[serde(default)]
    pub revenue: Revenue,
    #[serde(default)]
    pub total_slots: u32,
}

#[async_trait]
pub trait ParkingDirectory: Send + Sync {
    async fn get_listing(&self, parking_id: i64) -> Result<ParkingListing, ApiError>;

    /// Advisory check; the server holds no lock between this and booking creation.
    async fn check_availability(&self, key: &AvailabilityKey) -> Result<bool, ApiError>;

    async fn host_summary(&self, owner_id: i64) -> Result<HostSummary, ApiError>;
}
