use chrono::{DateTime, Utc};
use parkly_booking::{BookingCommitter, BookingPolicy, BookingService, CheckInReconciler};
use parkly_catalog::{AvailabilityChecker, ParkingDirectory};
use parkly_core::detection::{OccupancyFeed, PlateRecognizer};
use parkly_core::identity::Session;
use parkly_core::payment::PaymentGateway;
use parkly_shared::ParkingEvent;
use parkly_store::app_config::BusinessRules;
use parkly_store::{ApiClient, BookingCache, CardWallet};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::error::AppError;

/// Remote collaborators, one trait object per concern.
#[derive(Clone)]
pub struct Ports {
    pub directory: Arc<dyn ParkingDirectory>,
    pub bookings: Arc<dyn BookingService>,
    pub payments: Arc<dyn PaymentGateway>,
    pub plates: Arc<dyn PlateRecognizer>,
    pub occupancy: Arc<dyn OccupancyFeed>,
}

impl Ports {
    /// Every port backed by the same HTTP client.
    pub fn from_client(client: ApiClient) -> Self {
        let client = Arc::new(client);
        Self {
            directory: client.clone(),
            bookings: client.clone(),
            payments: client.clone(),
            plates: client.clone(),
            occupancy: client,
        }
    }
}

/// Everything a screen needs, handed to it explicitly. One per signed-in user.
#[derive(Clone)]
pub struct AppState {
    pub session: Session,
    pub ports: Ports,
    pub availability: AvailabilityChecker,
    pub committer: Arc<BookingCommitter>,
    pub reconciler: Arc<CheckInReconciler>,
    pub policy: BookingPolicy,
    pub wallet: Arc<CardWallet>,
    pub cache: Arc<BookingCache>,
    pub events: broadcast::Sender<ParkingEvent>,
    pub rules: BusinessRules,
}

impl AppState {
    pub fn new(session: Session, ports: Ports, rules: BusinessRules) -> Self {
        let (events, _) = broadcast::channel(100);
        Self {
            availability: AvailabilityChecker::new(ports.directory.clone()),
            committer: Arc::new(BookingCommitter::new(ports.payments.clone(), ports.bookings.clone())),
            reconciler: Arc::new(CheckInReconciler::new(ports.plates.clone(), ports.bookings.clone())),
            policy: BookingPolicy::new(rules.cancellation_window()),
            wallet: Arc::new(CardWallet::new(ports.payments.clone())),
            cache: Arc::new(BookingCache::new()),
            session,
            ports,
            events,
            rules,
        }
    }

    /// Fire and forget; having no subscribers is not an error.
    pub fn publish(&self, event: ParkingEvent) {
        if self.events.send(event).is_err() {
            debug!("No event subscribers");
        }
    }

    /// Refuse to act on behalf of a session the server will reject anyway.
    pub fn ensure_session(&self, now: DateTime<Utc>) -> Result<(), AppError> {
        if self.session.is_expired(now) {
            warn!("Session for user {} expired", self.session.user_id);
            return Err(AppError::SessionExpired);
        }
        Ok(())
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ParkingEvent> {
        self.events.subscribe()
    }
}
