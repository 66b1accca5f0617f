pub mod auth;
pub mod error;
pub mod screens;
pub mod state;

pub use error::{AppError, Notice};
pub use state::{AppState, Ports};
