use log::info;

use rewardloop_domain::gateway::{ApiError, TokenGrant};

use super::super::client::map_reqwest_error;
use super::wire::TokenGrantBody;

impl super::HttpRewardsGateway {
    /// Refresh-grant exchange. The remote rotates the refresh secret on every
    /// grant, so the returned pair must fully replace the stored one.
    pub(super) async fn request_refresh(&self, refresh_token: &str) -> Result<TokenGrant, ApiError> {
        let form = [
            ("client_id", self.config.client_id.as_str()),
            ("scope", self.config.scope.as_str()),
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
        ];
        self.request_grant(&form).await
    }

    /// One-time authorization-code exchange used during account onboarding.
    pub(super) async fn request_code_exchange(&self, code: &str) -> Result<TokenGrant, ApiError> {
        let form = [
            ("client_id", self.config.client_id.as_str()),
            ("scope", self.config.scope.as_str()),
            ("grant_type", "authorization_code"),
            ("redirect_uri", self.config.redirect_uri.as_str()),
            ("code", code),
        ];
        self.request_grant(&form).await
    }

    async fn request_grant(&self, form: &[(&str, &str)]) -> Result<TokenGrant, ApiError> {
        let response = self
            .http
            .inner()
            .post(&self.config.auth_url)
            .form(form)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let body = match self.check_response(response).await {
            Ok(body) => body,
            // The grant endpoint reports a refused secret as 400; that is an
            // auth failure, not a generic HTTP error.
            Err(ApiError::Http { status: 400, message }) => {
                return Err(ApiError::Auth(message));
            }
            Err(e) => return Err(e),
        };

        let grant: TokenGrantBody =
            serde_json::from_str(&body).map_err(|e| ApiError::Decode(e.to_string()))?;

        info!(
            "🔑 Token grant received (expires in {}s)",
            grant.expires_in
        );

        Ok(TokenGrant {
            access_token: grant.access_token,
            refresh_token: grant.refresh_token,
            expires_in: grant.expires_in,
        })
    }
}
