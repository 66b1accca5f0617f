use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::ApiError;

/// Output of one run of the plate-recognition backend: candidates from the
/// third-party engine and from the custom model, with their confidences.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlateReport {
    #[serde(rename = "Detected Number Plate (EasyOCR)", default)]
    pub easyocr_plates: Vec<String>,
    #[serde(rename = "Confidence Scores (EasyOCR)", default)]
    pub easyocr_confidence: Vec<f64>,
    #[serde(rename = "Detected Number Plate (Custom)", default)]
    pub custom_plates: Vec<String>,
    #[serde(rename = "Confidence Scores (Custom)", default)]
    pub custom_confidence: Vec<f64>,
}

impl PlateReport {
    pub fn is_empty(&self) -> bool {
        self.easyocr_plates.is_empty() && self.custom_plates.is_empty()
    }

    /// Raw candidates of both pipelines as sent with an unmatched check-in:
    /// EasyOCR candidates, a comma, then the custom-model candidates.
    pub fn reported_plates(&self) -> String {
        format!("{},{}", self.easyocr_plates.join(","), self.custom_plates.join(","))
    }
}

/// Live slot counts reported by the lot camera.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotOccupancy {
    pub total_slots: u32,
    pub occupied_slots: u32,
    pub available_slots: u32,
    #[serde(default)]
    pub video_source: Option<String>,
}

#[async_trait]
pub trait PlateRecognizer: Send + Sync {
    /// Run both recognizer pipelines against the entry camera.
    async fn recognize(&self) -> Result<PlateReport, ApiError>;
}

#[async_trait]
pub trait OccupancyFeed: Send + Sync {
    async fn occupancy(&self) -> Result<SlotOccupancy, ApiError>;
}
