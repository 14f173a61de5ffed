mod activity;
mod auth;
mod dashboard;
mod risk;
mod wire;

use async_trait::async_trait;
use reqwest::Response;
use serde::{Deserialize, Serialize};

use rewardloop_domain::gateway::{
    ActivityKind, ActivityOutcome, ApiError, DashboardSnapshot, RewardsGateway, TokenGrant,
};

use super::client::{map_reqwest_error, HttpClient};

/// Remote task API endpoints and request constants.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Token grant endpoint (refresh + one-time code exchange).
    pub auth_url: String,
    pub dashboard_url: String,
    pub activity_url: String,
    pub client_id: String,
    pub scope: String,
    pub redirect_uri: String,
    /// Country tag submitted with activity envelopes.
    pub country: String,
    /// Client channel tag submitted with activity envelopes.
    pub channel: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            auth_url: "https://login.rewardhost.example/oauth20_token.srf".to_string(),
            dashboard_url: "https://rewards.rewardhost.example/api/dashboard".to_string(),
            activity_url: "https://rewards.rewardhost.example/api/reportactivity".to_string(),
            client_id: "0000000040170455".to_string(),
            scope: "service::rewards-platform::MBI_SSL".to_string(),
            redirect_uri: "https://login.rewardhost.example/oauth20_desktop.srf".to_string(),
            country: "us".to_string(),
            channel: "PC".to_string(),
        }
    }
}

/// HTTP implementation of the remote task API collaborator.
pub struct HttpRewardsGateway {
    http: HttpClient,
    config: GatewayConfig,
}

impl HttpRewardsGateway {
    pub fn new(config: GatewayConfig) -> anyhow::Result<Self> {
        Ok(Self {
            http: HttpClient::new()?,
            config,
        })
    }

    pub fn with_client(http: HttpClient, config: GatewayConfig) -> Self {
        Self { http, config }
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Read the body and run the shared risk/error classification. Callers
    /// get the raw body back only for successful, non-risk responses.
    pub(super) async fn check_response(&self, response: Response) -> Result<String, ApiError> {
        let status = response.status();
        let body = response.text().await.map_err(map_reqwest_error)?;

        if let Some(kind) = risk::classify_status(status) {
            return Err(ApiError::Risk {
                kind,
                message: format!("HTTP {}", status.as_u16()),
            });
        }
        if let Some(kind) = risk::classify_body(&body) {
            return Err(ApiError::Risk {
                kind,
                message: risk::snippet(&body),
            });
        }
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(ApiError::Auth(risk::snippet(&body)));
        }
        if !status.is_success() {
            return Err(ApiError::Http {
                status: status.as_u16(),
                message: risk::snippet(&body),
            });
        }

        Ok(body)
    }
}

#[async_trait]
impl RewardsGateway for HttpRewardsGateway {
    async fn refresh_tokens(&self, refresh_token: &str) -> Result<TokenGrant, ApiError> {
        self.http
            .execute_with_retry("refresh_tokens", || self.request_refresh(refresh_token))
            .await
    }

    async fn exchange_code(&self, code: &str) -> Result<TokenGrant, ApiError> {
        self.http
            .execute_with_retry("exchange_code", || self.request_code_exchange(code))
            .await
    }

    async fn fetch_dashboard(&self, access_token: &str) -> Result<DashboardSnapshot, ApiError> {
        self.http
            .execute_with_retry("fetch_dashboard", || self.request_dashboard(access_token))
            .await
    }

    async fn report_activity(
        &self,
        access_token: &str,
        kind: ActivityKind,
    ) -> Result<ActivityOutcome, ApiError> {
        self.http
            .execute_with_retry("report_activity", || {
                self.request_activity(access_token, kind)
            })
            .await
    }
}
