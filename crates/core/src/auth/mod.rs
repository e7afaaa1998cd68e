//! OAuth token lifecycle for provider connections

pub mod ports;
pub mod token_manager;

pub use ports::OAuthTokenClient;
pub use token_manager::TokenManager;
