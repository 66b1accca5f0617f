//! HTTP client for the marketplace API and the detection backend.

use async_trait::async_trait;
use parkly_booking::{Booking, BookingService, NewBooking, UnmatchedDetection, VehicleLog};
use parkly_catalog::{AvailabilityKey, HostSummary, ParkingDirectory, ParkingListing};
use parkly_core::detection::{OccupancyFeed, PlateRecognizer, PlateReport, SlotOccupancy};
use parkly_core::identity::{AuthService, Credentials, LoginResponse};
use parkly_core::payment::{CardRegistration, ChargeRequest, PaymentGateway, PaymentReceipt};
use parkly_core::wire::format_timestamp;
use parkly_core::ApiError;
use parkly_shared::Masked;
use reqwest::{header, Client, Method, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use crate::app_config::Config;

#[derive(Deserialize)]
struct AvailabilityResponse {
    available: bool,
}

/// One client for every remote port. Cheap to clone; clones share the
/// connection pool.
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: Url,
    plate_url: Url,
    occupancy_url: Url,
    token: Option<Masked<String>>,
}

fn parse_url(raw: &str) -> Result<Url, ApiError> {
    Url::parse(raw).map_err(|e| ApiError::InvalidUrl(format!("{}: {}", raw, e)))
}

fn send_error(e: reqwest::Error) -> ApiError {
    if e.is_timeout() {
        ApiError::Timeout(e.to_string())
    } else {
        ApiError::Transport(e.to_string())
    }
}

impl ApiClient {
    pub fn new(config: &Config) -> Result<Self, ApiError> {
        let http = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            base_url: parse_url(&config.api.base_url)?,
            plate_url: parse_url(&config.detection.plate_url)?,
            occupancy_url: parse_url(&config.detection.occupancy_url)?,
            token: None,
        })
    }

    /// A copy that sends `Authorization: Bearer <token>` on marketplace API
    /// calls. Detection backends are not sent the token.
    pub fn authorized(&self, token: Masked<String>) -> Self {
        Self {
            token: Some(token),
            ..self.clone()
        }
    }

    /// Base URL joined with percent-encoded path segments.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        debug!("{} {}", method, url.path());
        let builder = self.http.request(method, url).header(header::ACCEPT, "application/json");
        match &self.token {
            Some(token) => builder.bearer_auth(token.expose()),
            None => builder,
        }
    }

    /// Detection hosts are separate services and never see the session token.
    fn detection_request(&self, url: Url) -> RequestBuilder {
        debug!("POST {}", url);
        self.http.post(url).header(header::ACCEPT, "application/json")
    }

    async fn check(response: Response) -> Result<Response, ApiError> {
        match response.status() {
            status if status.is_success() => Ok(response),
            StatusCode::UNAUTHORIZED => Err(ApiError::Unauthorized),
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(ApiError::Status {
                    status: status.as_u16(),
                    message: body,
                })
            }
        }
    }

    async fn send_json<T: DeserializeOwned>(builder: RequestBuilder) -> Result<T, ApiError> {
        let response = builder.send().await.map_err(send_error)?;
        Self::check(response)
            .await?
            .json::<T>()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }

    async fn send_empty(builder: RequestBuilder) -> Result<(), ApiError> {
        let response = builder.send().await.map_err(send_error)?;
        Self::check(response).await.map(|_| ())
    }
}

#[async_trait]
impl AuthService for ApiClient {
    async fn login(&self, credentials: &Credentials) -> Result<LoginResponse, ApiError> {
        let url = self.endpoint(&["auth", "login"])?;
        Self::send_json(self.request(Method::POST, url).json(credentials)).await
    }
}

#[async_trait]
impl ParkingDirectory for ApiClient {
    async fn get_listing(&self, parking_id: i64) -> Result<ParkingListing, ApiError> {
        let url = self.endpoint(&["api", "parking", &parking_id.to_string()])?;
        Self::send_json(self.request(Method::GET, url)).await
    }

    async fn check_availability(&self, key: &AvailabilityKey) -> Result<bool, ApiError> {
        let url = self.endpoint(&["api", "parking", "check", "availability"])?;
        let builder = self.request(Method::GET, url).query(&[
            ("parkingId", key.parking_id.to_string()),
            ("start", format_timestamp(&key.window.start)),
            ("end", format_timestamp(&key.window.end)),
        ]);
        let body: AvailabilityResponse = Self::send_json(builder).await?;
        Ok(body.available)
    }

    async fn host_summary(&self, owner_id: i64) -> Result<HostSummary, ApiError> {
        let url = self.endpoint(&["api", "parking", "dashboard", "host-summary"])?;
        Self::send_json(self.request(Method::GET, url).query(&[("ownerId", owner_id)])).await
    }
}

#[async_trait]
impl PaymentGateway for ApiClient {
    async fn charge(&self, request: &ChargeRequest) -> Result<PaymentReceipt, ApiError> {
        let url = self.endpoint(&["stripe", "payment", "make-payment"])?;
        let builder = self.request(Method::POST, url).query(&[
            ("paymentMethodId", request.payment_method_id.expose().clone()),
            ("amount", request.amount_minor.to_string()),
            ("customerId", request.customer_id.to_string()),
        ]);
        Self::send_json(builder).await
    }

    async fn register_card(&self, registration: &CardRegistration) -> Result<(), ApiError> {
        let url = self.endpoint(&["stripe", "payment", "add"])?;
        Self::send_empty(self.request(Method::POST, url).json(registration)).await
    }
}

#[async_trait]
impl BookingService for ApiClient {
    async fn create_booking(&self, booking: &NewBooking) -> Result<Booking, ApiError> {
        let url = self.endpoint(&["api", "booking", "createBooking"])?;
        Self::send_json(self.request(Method::POST, url).json(booking)).await
    }

    async fn cancel_booking(&self, booking_id: i64) -> Result<(), ApiError> {
        let url = self.endpoint(&["api", "booking", "cancel", &booking_id.to_string()])?;
        Self::send_empty(self.request(Method::PUT, url)).await
    }

    async fn list_for_user(&self, user_id: i64) -> Result<Vec<Booking>, ApiError> {
        let url = self.endpoint(&["api", "booking", "user", &user_id.to_string()])?;
        Self::send_json(self.request(Method::GET, url)).await
    }

    async fn list_for_owner(&self, owner_id: i64) -> Result<Vec<Booking>, ApiError> {
        let url = self.endpoint(&["api", "booking", "owner", &owner_id.to_string()])?;
        Self::send_json(self.request(Method::GET, url)).await
    }

    async fn list_for_parking(&self, parking_id: i64) -> Result<Vec<Booking>, ApiError> {
        let url = self.endpoint(&["api", "booking", "byParking", &parking_id.to_string()])?;
        Self::send_json(self.request(Method::GET, url)).await
    }

    async fn confirm_check_in(&self, booking_id: i64, plate: &str) -> Result<(), ApiError> {
        let url = self.endpoint(&["api", "booking", "confirm", &booking_id.to_string(), plate])?;
        Self::send_empty(self.request(Method::PUT, url)).await
    }

    async fn report_unmatched(&self, booking_id: i64, reported_plates: &str) -> Result<(), ApiError> {
        let url = self.endpoint(&[
            "api",
            "booking",
            "unmatched-checkin",
            &booking_id.to_string(),
            reported_plates,
        ])?;
        Self::send_empty(self.request(Method::PUT, url)).await
    }

    async fn vehicle_logs(&self, booking_id: i64) -> Result<Vec<VehicleLog>, ApiError> {
        let url = self.endpoint(&["api", "vehicle", "logs", &booking_id.to_string()])?;
        Self::send_json(self.request(Method::GET, url)).await
    }

    async fn unmatched_detections(&self, owner_id: i64) -> Result<Vec<UnmatchedDetection>, ApiError> {
        let url = self.endpoint(&["api", "booking", "unmatched-checkins", &owner_id.to_string()])?;
        Self::send_json(self.request(Method::GET, url)).await
    }

    async fn mark_visited(&self, log_ids: &[i64]) -> Result<(), ApiError> {
        let url = self.endpoint(&["api", "booking", "mark-visited"])?;
        Self::send_empty(self.request(Method::PUT, url).json(log_ids)).await
    }
}

#[async_trait]
impl PlateRecognizer for ApiClient {
    async fn recognize(&self) -> Result<PlateReport, ApiError> {
        Self::send_json(self.detection_request(self.plate_url.clone())).await
    }
}

#[async_trait]
impl OccupancyFeed for ApiClient {
    async fn occupancy(&self) -> Result<SlotOccupancy, ApiError> {
        Self::send_json(self.detection_request(self.occupancy_url.clone())).await
    }
}
