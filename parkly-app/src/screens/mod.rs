pub mod book_parking;
pub mod bookings;
pub mod dashboard;
pub mod host_bookings;
pub mod wallet;

pub use book_parking::BookParkingScreen;
pub use bookings::{BookingActions, BookingsScreen};
pub use dashboard::DashboardScreen;
pub use host_bookings::HostBookingsScreen;
pub use wallet::WalletScreen;
