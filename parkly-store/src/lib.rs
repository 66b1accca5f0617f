pub mod api_client;
pub mod app_config;
pub mod cache;
pub mod wallet;

pub use api_client::ApiClient;
pub use app_config::Config;
pub use cache::BookingCache;
pub use wallet::{CardWallet, TokenizedCard, WalletError};
