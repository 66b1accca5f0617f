use chrono::{DateTime, Utc};
use parkly_booking::{Booking, BookingDraft, CommitError, DraftStep};
use parkly_catalog::{AvailabilityStatus, AvailabilityTicket, ParkingListing, Quote, Resolution};
use parkly_core::detection::SlotOccupancy;
use parkly_core::payment::PaymentMethod;
use parkly_shared::models::events::{BookingCommittedEvent, PaymentOrphanedEvent};
use parkly_shared::ParkingEvent;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::error::AppError;
use crate::state::AppState;

fn new_draft(state: &AppState, listing: &ParkingListing, now: DateTime<Utc>) -> BookingDraft {
    let mut draft = BookingDraft::new(listing.id, now, state.rules.min_lead_time());
    draft.set_rate(listing.charges);
    draft
}

/// Controller behind the "book this space" flow.
pub struct BookParkingScreen {
    state: AppState,
    listing: ParkingListing,
    draft: Mutex<BookingDraft>,
}

impl BookParkingScreen {
    pub async fn open(state: AppState, parking_id: i64, now: DateTime<Utc>) -> Result<Self, AppError> {
        let listing = state
            .ports
            .directory
            .get_listing(parking_id)
            .await
            .map_err(AppError::Listing)?;

        info!("Opened booking form for parking {} at {}/hr", parking_id, listing.charges);
        let draft = new_draft(&state, &listing, now);

        Ok(Self {
            state,
            listing,
            draft: Mutex::new(draft),
        })
    }

    fn fresh_draft(&self, now: DateTime<Utc>) -> BookingDraft {
        new_draft(&self.state, &self.listing, now)
    }

    pub fn listing(&self) -> &ParkingListing {
        &self.listing
    }

    /// Live slot counts, if the lot camera answers. Never an error.
    pub async fn slot_occupancy(&self) -> Option<SlotOccupancy> {
        match self.state.ports.occupancy.occupancy().await {
            Ok(occupancy) => Some(occupancy),
            Err(e) => {
                warn!("Slot occupancy unavailable: {}", e);
                None
            }
        }
    }

    /// Change the start; returns a ticket when a new availability check is due.
    pub async fn edit_start(
        &self,
        start: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<Option<AvailabilityTicket>, AppError> {
        Ok(self.draft.lock().await.set_start(start, now)?)
    }

    pub async fn edit_end(&self, end: DateTime<Utc>) -> Option<AvailabilityTicket> {
        self.draft.lock().await.set_end(end)
    }

    /// Run one availability query and apply it unless a later edit won.
    /// The draft lock is not held while the request is in flight.
    pub async fn check_availability(&self, ticket: AvailabilityTicket) -> Result<AvailabilityStatus, AppError> {
        let result = self.state.availability.query(&ticket).await;

        let mut draft = self.draft.lock().await;
        match draft.apply_availability(&ticket, result.clone()) {
            Resolution::Applied(status) => Ok(status),
            Resolution::Stale => Ok(draft.availability()),
            Resolution::Failed => match result {
                Err(e) => Err(e.into()),
                Ok(_) => Ok(draft.availability()),
            },
        }
    }

    pub async fn set_start(&self, start: DateTime<Utc>, now: DateTime<Utc>) -> Result<AvailabilityStatus, AppError> {
        match self.edit_start(start, now).await? {
            Some(ticket) => self.check_availability(ticket).await,
            None => Ok(self.availability().await),
        }
    }

    pub async fn set_end(&self, end: DateTime<Utc>) -> Result<AvailabilityStatus, AppError> {
        match self.edit_end(end).await {
            Some(ticket) => self.check_availability(ticket).await,
            None => Ok(self.availability().await),
        }
    }

    /// Re-run the check for the current window, e.g. after a failed attempt.
    pub async fn retry_availability(&self) -> Result<AvailabilityStatus, AppError> {
        let ticket = self.draft.lock().await.refresh_availability();
        match ticket {
            Some(ticket) => self.check_availability(ticket).await,
            None => Ok(AvailabilityStatus::Unknown),
        }
    }

    pub async fn set_vehicle_number(&self, vehicle_number: &str) {
        self.draft.lock().await.set_vehicle_number(vehicle_number);
    }

    pub async fn availability(&self) -> AvailabilityStatus {
        self.draft.lock().await.availability()
    }

    pub async fn quote(&self) -> Option<Quote> {
        let draft = self.draft.lock().await;
        let window = draft.window().filter(|w| w.is_valid())?;
        Some(Quote::for_window(self.listing.charges, &window))
    }

    pub async fn duration_text(&self) -> Option<String> {
        self.draft.lock().await.duration_text()
    }

    pub async fn step(&self) -> DraftStep {
        self.draft.lock().await.step()
    }

    pub async fn can_submit(&self, now: DateTime<Utc>) -> bool {
        !self.state.committer.is_committing() && self.draft.lock().await.can_submit(now)
    }

    /// Gate the details step, then offer the saved cards.
    pub async fn proceed_to_payment(&self, now: DateTime<Utc>) -> Result<Vec<PaymentMethod>, AppError> {
        self.draft.lock().await.proceed_to_payment(now)?;
        let cards = self.state.wallet.cards().await;
        if cards.is_empty() {
            return Err(AppError::NoPaymentMethods);
        }
        Ok(cards)
    }

    pub async fn back_to_details(&self) {
        self.draft.lock().await.back_to_details();
    }

    pub async fn select_card(&self, card_id: &str) -> Result<(), AppError> {
        let card = self.state.wallet.get(card_id).await?;
        self.draft.lock().await.select_payment_method(card);
        Ok(())
    }

    /// Pay, then create the booking. Announces the outcome on the event bus.
    pub async fn submit(&self, now: DateTime<Utc>) -> Result<Booking, AppError> {
        self.state.ensure_session(now)?;
        let request = self
            .draft
            .lock()
            .await
            .commit_request(self.state.session.user_id, now)?;
        let parking_id = request.parking_id;

        match self.state.committer.commit(request).await {
            Ok(committed) => {
                self.state.publish(ParkingEvent::BookingCommitted(BookingCommittedEvent {
                    booking_id: committed.booking.id,
                    parking_id,
                    payment_id: committed.payment_id.clone(),
                    amount_minor: committed.amount_minor,
                    timestamp: ParkingEvent::now(),
                }));
                self.state.cache.set_active(committed.booking.clone()).await;
                *self.draft.lock().await = self.fresh_draft(now);
                Ok(committed.booking)
            }
            Err(CommitError::PostPaymentCommitFailed {
                payment_id,
                amount_minor,
                source,
            }) => {
                self.state.publish(ParkingEvent::PaymentOrphaned(PaymentOrphanedEvent {
                    parking_id,
                    user_id: self.state.session.user_id,
                    payment_id: payment_id.clone(),
                    amount_minor,
                    reason: source.to_string(),
                    timestamp: ParkingEvent::now(),
                }));
                Err(CommitError::PostPaymentCommitFailed {
                    payment_id,
                    amount_minor,
                    source,
                }
                .into())
            }
            Err(e) => Err(e.into()),
        }
    }
}
