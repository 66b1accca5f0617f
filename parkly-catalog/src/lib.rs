pub mod availability;
pub mod listing;
pub mod pricing;

pub use availability::{
    AvailabilityChecker, AvailabilityError, AvailabilityKey, AvailabilityStatus, AvailabilityTicket,
    AvailabilityTracker, Resolution,
};
pub use listing::{HostSummary, ParkingDirectory, ParkingFeatures, ParkingListing, Revenue};
pub use pricing::{price, to_minor_units, Quote, TimeWindow};
