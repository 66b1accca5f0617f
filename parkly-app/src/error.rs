use parkly_booking::{CancelError, CheckInError, CommitError, ReviewError, ValidationError};
use parkly_catalog::AvailabilityError;
use parkly_core::identity::CredentialsError;
use parkly_core::ApiError;
use parkly_store::WalletError;
use serde::Serialize;

/// What the user sees when something goes wrong: an alert title and body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub title: String,
    pub message: String,
}

impl Notice {
    pub fn new(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for Notice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.title, self.message)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Credentials(#[from] CredentialsError),

    #[error("Login failed: {0}")]
    Login(#[source] ApiError),

    #[error("Failed to load parking details: {0}")]
    Listing(#[source] ApiError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Availability(#[from] AvailabilityError),

    #[error("No saved payment methods")]
    NoPaymentMethods,

    #[error(transparent)]
    Wallet(#[from] WalletError),

    #[error(transparent)]
    Commit(#[from] CommitError),

    #[error(transparent)]
    CheckIn(#[from] CheckInError),

    #[error(transparent)]
    Cancel(#[from] CancelError),

    #[error(transparent)]
    Review(#[from] ReviewError),

    #[error("Booking {0} not found")]
    BookingNotFound(i64),

    #[error("Session expired")]
    SessionExpired,

    #[error(transparent)]
    Api(#[from] ApiError),
}

impl AppError {
    pub fn notice(&self) -> Notice {
        match self {
            AppError::Credentials(e) => Notice::new("Error", e.to_string()),
            AppError::Login(ApiError::Unauthorized) => Notice::new("Login Failed", "Invalid email or password."),
            AppError::Login(_) => Notice::new("Login Failed", "Something went wrong. Please try again."),
            AppError::Listing(_) => Notice::new("Error", "Failed to load parking details."),
            AppError::Validation(e) => Notice::new(e.title(), e.to_string()),
            AppError::Availability(AvailabilityError::InvalidWindow) => {
                Notice::new("Invalid Time", "End time must be after start time.")
            }
            AppError::Availability(_) => Notice::new("Error", "Failed to check parking availability."),
            AppError::NoPaymentMethods => {
                Notice::new("No Payment Methods", "Please add a payment card before booking.")
            }
            AppError::Wallet(WalletError::Invalid(e)) => Notice::new("Error", e.to_string()),
            AppError::Wallet(WalletError::NotFound(_)) => {
                Notice::new("Select Payment Method", "Please select a payment card.")
            }
            AppError::Wallet(WalletError::Registration(_)) => Notice::new("Error", "Failed to add card."),
            AppError::Commit(CommitError::InFlight) => {
                Notice::new("Please Wait", "Your booking is already being processed.")
            }
            AppError::Commit(CommitError::InvalidAmount(amount)) => Notice::new(
                "Invalid Amount",
                format!("Cannot charge {} for this booking.", amount),
            ),
            AppError::Commit(CommitError::PaymentFailed(_)) => Notice::new(
                "Payment Failed",
                "We couldn't process your payment. Please try another card.",
            ),
            AppError::Commit(CommitError::PostPaymentCommitFailed { payment_id, source, .. }) => {
                let reason = if source.is_conflict() {
                    "the slot was taken before the booking could be saved"
                } else {
                    "the booking could not be saved"
                };
                Notice::new(
                    "Booking Failed",
                    format!(
                        "Your payment was received but {}. Please contact support with payment reference {}.",
                        reason, payment_id
                    ),
                )
            }
            AppError::CheckIn(CheckInError::NotEligible { .. }) => {
                Notice::new("Check-in Unavailable", "Cancelled bookings cannot be checked in.")
            }
            AppError::CheckIn(CheckInError::AlreadyCheckedIn(_)) => {
                Notice::new("Checked In", "This booking is already checked in.")
            }
            AppError::CheckIn(CheckInError::InFlight) => {
                Notice::new("Please Wait", "A check-in is already in progress.")
            }
            AppError::CheckIn(_) => Notice::new("Error", "Something went wrong during check-in."),
            AppError::Cancel(CancelError::NotCancellable { window_hours, .. }) => Notice::new(
                "Cannot Cancel",
                format!("Bookings can only be cancelled more than {} hours before they start.", window_hours),
            ),
            AppError::Cancel(CancelError::Request(_)) => {
                Notice::new("Error", "Failed to cancel booking. Please try again later.")
            }
            AppError::Review(ReviewError::NothingSelected) => {
                Notice::new("Nothing Selected", "Select at least one vehicle.")
            }
            AppError::Review(ReviewError::Request(_)) => {
                Notice::new("Error", "Failed to mark vehicles as visited.")
            }
            AppError::BookingNotFound(id) => Notice::new("Error", format!("Booking#{} not found.", id)),
            AppError::SessionExpired | AppError::Api(ApiError::Unauthorized) => {
                Notice::new("Session Expired", "Please log in again.")
            }
            AppError::Api(_) => Notice::new("Error", "Something went wrong. Please try again."),
        }
    }
}
