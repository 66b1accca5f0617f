use parkly_catalog::{to_minor_units, TimeWindow};
use parkly_core::payment::{ChargeRequest, PaymentGateway, PaymentMethod};
use parkly_core::ApiError;
use rust_decimal::Decimal;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::models::{Booking, NewBooking};
use crate::repository::BookingService;

/// A validated draft, ready to be paid for.
#[derive(Debug, Clone, PartialEq)]
pub struct CommitRequest {
    pub user_id: i64,
    pub parking_id: i64,
    pub window: TimeWindow,
    pub vehicle_number: String,
    pub total_price: Decimal,
    pub payment_method: PaymentMethod,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CommittedBooking {
    pub booking: Booking,
    pub payment_id: String,
    pub amount_minor: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum CommitError {
    #[error("A booking is already being submitted")]
    InFlight,

    #[error("Invalid amount: {0}")]
    InvalidAmount(Decimal),

    #[error("Payment failed: {0}")]
    PaymentFailed(#[source] ApiError),

    /// The charge went through but no booking exists for it.
    #[error("Payment {payment_id} succeeded but the booking could not be created: {source}")]
    PostPaymentCommitFailed {
        payment_id: String,
        amount_minor: i64,
        #[source]
        source: ApiError,
    },
}

/// Clears the in-flight flag on every exit path.
struct InFlightGuard<'a>(&'a AtomicBool);

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Charges first, then records the booking. Never the other way round.
pub struct BookingCommitter {
    payments: Arc<dyn PaymentGateway>,
    bookings: Arc<dyn BookingService>,
    in_flight: AtomicBool,
}

impl BookingCommitter {
    pub fn new(payments: Arc<dyn PaymentGateway>, bookings: Arc<dyn BookingService>) -> Self {
        Self {
            payments,
            bookings,
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn is_committing(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub async fn commit(&self, request: CommitRequest) -> Result<CommittedBooking, CommitError> {
        let _guard = InFlightGuard::acquire(&self.in_flight).ok_or(CommitError::InFlight)?;

        let amount_minor = to_minor_units(request.total_price)
            .filter(|amount| *amount > 0)
            .ok_or(CommitError::InvalidAmount(request.total_price))?;

        info!(
            "Charging {} minor units for parking {} ({} -> {})",
            amount_minor, request.parking_id, request.window.start, request.window.end
        );
        let receipt = self
            .payments
            .charge(&ChargeRequest {
                payment_method_id: request.payment_method.token.clone(),
                amount_minor,
                customer_id: request.user_id,
            })
            .await
            .map_err(|e| {
                warn!("Payment failed for parking {}: {}", request.parking_id, e);
                CommitError::PaymentFailed(e)
            })?;

        let new_booking = NewBooking {
            user_id: request.user_id,
            parking_id: request.parking_id,
            start_time: request.window.start,
            end_time: request.window.end,
            total_price: request.total_price,
            vehicle_number: request.vehicle_number.clone(),
            payment_id: receipt.payment_id.clone(),
        };

        match self.bookings.create_booking(&new_booking).await {
            Ok(mut booking) => {
                // The create response omits what we sent; fill it back in.
                booking.parking_id.get_or_insert(request.parking_id);
                booking.user_id.get_or_insert(request.user_id);
                booking.payment_id.get_or_insert_with(|| receipt.payment_id.clone());
                if booking.vehicle_number.is_empty() {
                    booking.vehicle_number = request.vehicle_number;
                }
                info!("Booking {} created with payment {}", booking.id, receipt.payment_id);
                Ok(CommittedBooking {
                    booking,
                    payment_id: receipt.payment_id,
                    amount_minor,
                })
            }
            Err(e) => {
                error!(
                    "Payment {} captured ({} minor units) but booking creation failed for parking {}: {}",
                    receipt.payment_id, amount_minor, request.parking_id, e
                );
                Err(CommitError::PostPaymentCommitFailed {
                    payment_id: receipt.payment_id,
                    amount_minor,
                    source: e,
                })
            }
        }
    }
}
