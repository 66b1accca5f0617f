pub mod detection;
pub mod error;
pub mod identity;
pub mod payment;
pub mod wire;

pub use error::ApiError;
