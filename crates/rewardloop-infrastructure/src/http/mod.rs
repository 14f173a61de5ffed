mod client;
mod gateway;

pub use client::{HttpClient, RetryConfig};
pub use gateway::{GatewayConfig, HttpRewardsGateway};
