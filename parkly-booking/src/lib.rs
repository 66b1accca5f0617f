pub mod changes;
pub mod checkin;
pub mod draft;
pub mod filters;
pub mod models;
pub mod orchestrator;
pub mod repository;
pub mod review;

pub use changes::{BookingPolicy, CancelError};
pub use checkin::{
    match_plate, normalize_plate, CheckInError, CheckInOutcome, CheckInReconciler, CheckInState, Pipeline, PlateMatch,
};
pub use draft::{BookingDraft, DraftStep, ValidationError};
pub use filters::{host_view, DateFilter, StatusFilter};
pub use models::{Booking, BookingStatus, DetectionStatus, NewBooking, PlateReadings, UnmatchedDetection, VehicleLog};
pub use orchestrator::{BookingCommitter, CommitError, CommitRequest, CommittedBooking};
pub use repository::BookingService;
pub use review::{ReviewError, ReviewQueue};

#[cfg(test)]
pub(crate) mod testing;
