/// REST client for the accounting API
pub mod client;
/// Wire types and error classification
pub mod types;

pub use client::AccountingApiClient;
pub use types::*;
