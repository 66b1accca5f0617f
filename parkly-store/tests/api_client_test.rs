use chrono::{TimeZone, Utc};
use parkly_booking::{BookingService, BookingStatus, NewBooking};
use parkly_catalog::{AvailabilityKey, ParkingDirectory, TimeWindow};
use parkly_core::detection::{OccupancyFeed, PlateRecognizer};
use parkly_core::identity::{AuthService, Credentials, Role};
use parkly_core::payment::{ChargeRequest, PaymentGateway};
use parkly_core::ApiError;
use parkly_shared::Masked;
use parkly_store::{ApiClient, Config};
use rust_decimal::Decimal;
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> ApiClient {
    let mut config = Config::for_base_url(&server.uri());
    config.detection.plate_url = format!("{}/plates/process-video", server.uri());
    config.detection.occupancy_url = format!("{}/slots/process-video", server.uri());
    ApiClient::new(&config).unwrap()
}

#[tokio::test]
async fn test_login_posts_trimmed_credentials() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .and(body_json(json!({"email": "host@example.com", "password": "secret"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token": "jwt-abc",
            "userId": 3,
            "role": "SELLER",
            "name": "Sana",
            "expiresIn": 3600000
        })))
        .expect(1)
        .mount(&server)
        .await;

    let credentials = Credentials::new(" host@example.com ", "secret ").unwrap();
    let response = client_for(&server).login(&credentials).await.unwrap();

    assert_eq!(response.user_id, 3);
    assert_eq!(response.role, Role::Seller);
    assert_eq!(response.token.expose(), "jwt-abc");
}

#[tokio::test]
async fn test_availability_query_and_bearer_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/parking/check/availability"))
        .and(query_param("parkingId", "7"))
        .and(query_param("start", "2026-10-20T10:00:00.000Z"))
        .and(query_param("end", "2026-10-20T12:30:00.000Z"))
        .and(header("authorization", "Bearer jwt-abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"available": false})))
        .expect(1)
        .mount(&server)
        .await;

    let api = client_for(&server).authorized(Masked::new("jwt-abc".to_string()));
    let key = AvailabilityKey {
        parking_id: 7,
        window: TimeWindow::new(
            Utc.with_ymd_and_hms(2026, 10, 20, 10, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2026, 10, 20, 12, 30, 0).unwrap(),
        ),
    };

    assert!(!api.check_availability(&key).await.unwrap());
}

#[tokio::test]
async fn test_charge_sends_minor_units_as_query() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/stripe/payment/make-payment"))
        .and(query_param("paymentMethodId", "pm_123"))
        .and(query_param("amount", "30000"))
        .and(query_param("customerId", "5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"paymentId": "pi_9"})))
        .expect(1)
        .mount(&server)
        .await;

    let receipt = client_for(&server)
        .charge(&ChargeRequest {
            payment_method_id: Masked::new("pm_123".to_string()),
            amount_minor: 30000,
            customer_id: 5,
        })
        .await
        .unwrap();

    assert_eq!(receipt.payment_id, "pi_9");
}

#[tokio::test]
async fn test_create_booking_round_trip() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/booking/createBooking"))
        .and(body_json(json!({
            "userId": 5,
            "parkingId": 7,
            "startTime": "2026-10-20T10:00:00.000Z",
            "endTime": "2026-10-20T12:30:00.000Z",
            "totalPrice": 300.0,
            "vehicleNumber": "ABC-123",
            "paymentId": "pi_9"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "slotNumber": 4,
            "startTime": "2026-10-20T10:00:00",
            "endTime": "2026-10-20T12:30:00",
            "price": 300,
            "bookingId": 42,
            "status": "CONFIRMED"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let booking = client_for(&server)
        .create_booking(&NewBooking {
            user_id: 5,
            parking_id: 7,
            start_time: Utc.with_ymd_and_hms(2026, 10, 20, 10, 0, 0).unwrap(),
            end_time: Utc.with_ymd_and_hms(2026, 10, 20, 12, 30, 0).unwrap(),
            total_price: Decimal::from(300),
            vehicle_number: "ABC-123".into(),
            payment_id: "pi_9".into(),
        })
        .await
        .unwrap();

    assert_eq!(booking.id, 42);
    assert_eq!(booking.slot_number.as_deref(), Some("4"));
    assert_eq!(booking.status, BookingStatus::Confirmed);
}

#[tokio::test]
async fn test_error_statuses_are_mapped() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/booking/user/5"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/api/booking/cancel/42"))
        .respond_with(ResponseTemplate::new(409).set_body_string("too late to cancel"))
        .mount(&server)
        .await;

    let api = client_for(&server);
    assert_eq!(api.list_for_user(5).await.unwrap_err(), ApiError::Unauthorized);
    assert_eq!(
        api.cancel_booking(42).await.unwrap_err(),
        ApiError::Status {
            status: 409,
            message: "too late to cancel".into()
        }
    );
}

#[tokio::test]
async fn test_malformed_body_is_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/parking/7"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let err = client_for(&server).get_listing(7).await.unwrap_err();
    assert!(matches!(err, ApiError::Decode(_)));
}

#[tokio::test]
async fn test_slow_response_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/plates/process-video"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
        .mount(&server)
        .await;

    let mut config = Config::for_base_url(&server.uri());
    config.detection.plate_url = format!("{}/plates/process-video", server.uri());
    config.api.request_timeout_secs = 1;
    let api = ApiClient::new(&config).unwrap();

    assert!(matches!(api.recognize().await, Err(ApiError::Timeout(_))));
}

#[tokio::test]
async fn test_detection_backends() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/plates/process-video"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Detected Number Plate (EasyOCR)": ["abc123"],
            "Confidence Scores (EasyOCR)": [0.93],
            "Detected Number Plate (Custom)": [],
            "Confidence Scores (Custom)": []
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/slots/process-video"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total_slots": 20,
            "occupied_slots": 5,
            "available_slots": 15,
            "video_source": "cam-1"
        })))
        .mount(&server)
        .await;

    let api = client_for(&server);
    let report = api.recognize().await.unwrap();
    assert_eq!(report.easyocr_plates, vec!["abc123"]);
    assert!(report.custom_plates.is_empty());

    let occupancy = api.occupancy().await.unwrap();
    assert_eq!(occupancy.available_slots, 15);
}

#[tokio::test]
async fn test_review_endpoints() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/booking/unmatched-checkins/3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"vehicleLogId": 11, "plateNumber": "XYZ999,", "detectedAt": "2026-10-20T10:05:00"},
            {"vehicleLogId": 12, "plateNumber": ",LEB1", "detectedAt": "2026-10-20T10:07:00"}
        ])))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/api/booking/mark-visited"))
        .and(body_json(json!([11, 12])))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let api = client_for(&server);
    let entries = api.unmatched_detections(3).await.unwrap();
    assert_eq!(entries.iter().map(|e| e.id).collect::<Vec<_>>(), vec![11, 12]);
    api.mark_visited(&[11, 12]).await.unwrap();
}

#[tokio::test]
async fn test_host_summary_query() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/parking/dashboard/host-summary"))
        .and(query_param("ownerId", "3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "revenue": {"daily": 300, "weekly": 2100, "monthly": 9000},
            "totalSlots": 12
        })))
        .mount(&server)
        .await;

    let summary = client_for(&server).host_summary(3).await.unwrap();
    assert_eq!(summary.total_slots, 12);
    assert_eq!(summary.revenue.daily, Decimal::from(300));
}

#[tokio::test]
async fn test_detection_hosts_never_get_the_session_token() {
    let api_server = MockServer::start().await;
    let ocr_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/process-video"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total_slots": 4,
            "occupied_slots": 1,
            "available_slots": 3
        })))
        .mount(&ocr_server)
        .await;

    let mut config = Config::for_base_url(&api_server.uri());
    config.detection.plate_url = format!("{}/process-video", ocr_server.uri());
    config.detection.occupancy_url = format!("{}/process-video", ocr_server.uri());
    let api = ApiClient::new(&config)
        .unwrap()
        .authorized(Masked::new("jwt-secret".to_string()));

    // One endpoint serves both; every PlateReport field has a default.
    api.recognize().await.unwrap();
    api.occupancy().await.unwrap();

    let requests = ocr_server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 2);
    for request in requests {
        assert!(request.headers.get("authorization").is_none());
    }
}
