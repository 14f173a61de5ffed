mod message_builder;
mod sender;

use serde::{Deserialize, Serialize};
use std::time::Duration;

use rewardloop_domain::shared::DomainError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushApiConfig {
    /// Push collaborator endpoint.
    pub api_url: String,
    /// Application token identifying this sender.
    pub app_token: String,
}

/// Push collaborator client: one POST per delivery, recipients inline.
pub struct PushApiSender {
    pub(super) client: reqwest::Client,
    pub(super) config: PushApiConfig,
}

impl PushApiSender {
    pub fn new(config: PushApiConfig) -> Result<Self, DomainError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(20))
            .build()
            .map_err(|e| DomainError::Infrastructure(format!("Create push client: {e}")))?;
        Ok(Self { client, config })
    }
}
