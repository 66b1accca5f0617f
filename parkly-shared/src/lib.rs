pub mod models;
pub mod pii;

pub use models::events::ParkingEvent;
pub use pii::Masked;
