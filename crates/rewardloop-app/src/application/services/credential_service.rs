use chrono::{Duration, Utc};
use log::{info, warn};
use std::sync::Arc;

use rewardloop_domain::account::{Account, LogLevel};
use rewardloop_domain::credentials::CredentialInput;
use rewardloop_domain::gateway::{RewardsGateway, TokenGrant};
use rewardloop_domain::shared::DomainError;

/// A token this close to expiry is refreshed before any task call.
pub const TOKEN_REFRESH_THRESHOLD_MINUTES: i64 = 15;

/// Credential lifecycle: keep each account's access token usable, rotate the
/// long-lived secret on every refresh, and run the one-time onboarding code
/// exchange.
pub struct CredentialService {
    gateway: Arc<dyn RewardsGateway>,
}

impl CredentialService {
    pub fn new(gateway: Arc<dyn RewardsGateway>) -> Self {
        Self { gateway }
    }

    /// Resolve an access token for the account, refreshing when it is
    /// missing, expired, or inside the refresh threshold.
    ///
    /// A failed refresh falls back to a still-present (possibly stale) access
    /// token with a warning; with no token at all the failure is fatal for
    /// this run.
    pub async fn ensure_valid_token(&self, account: &mut Account) -> Result<String, DomainError> {
        let now = Utc::now();
        let threshold = Duration::minutes(TOKEN_REFRESH_THRESHOLD_MINUTES);

        if account.token_valid(now, threshold) {
            if let Some(token) = account.access_token() {
                return Ok(token.to_string());
            }
        }

        if account.refresh_token().is_empty() {
            return Err(DomainError::InvalidCredentials(format!(
                "Account {} has no refresh token",
                account.name()
            )));
        }

        match self.gateway.refresh_tokens(account.refresh_token()).await {
            Ok(grant) => {
                account.apply_token_grant(&grant, now);
                account.push_log(LogLevel::Info, "Access token refreshed", now);
                info!("[{}] Access token refreshed", account.name());
                Ok(grant.access_token)
            }
            Err(e) => {
                if let Some(stale) = account.access_token() {
                    let stale = stale.to_string();
                    warn!(
                        "[{}] Token refresh failed ({}); continuing with existing token",
                        account.name(),
                        e
                    );
                    account.push_log(
                        LogLevel::Warn,
                        format!("Token refresh failed ({e}); continuing with existing token"),
                        now,
                    );
                    Ok(stale)
                } else {
                    account.push_log(LogLevel::Error, format!("Token refresh failed: {e}"), now);
                    Err(DomainError::TokenRefused(e.to_string()))
                }
            }
        }
    }

    /// One-time code exchange used only during account onboarding, never
    /// during scheduled runs.
    pub async fn exchange_code(&self, code: &str) -> Result<TokenGrant, DomainError> {
        self.gateway
            .exchange_code(code)
            .await
            .map_err(|e| DomainError::TokenRefused(e.to_string()))
    }

    /// Build a new account from pasted credential input. A raw refresh
    /// secret is stored as-is; a callback URL goes through the code exchange
    /// first.
    pub async fn onboard_account(
        &self,
        name: String,
        input: &str,
    ) -> Result<Account, DomainError> {
        match CredentialInput::parse(input)? {
            CredentialInput::RefreshToken(token) => Account::new(name, token),
            CredentialInput::ExchangeCode(code) => {
                let grant = self.exchange_code(&code).await?;
                let mut account = Account::new(name, grant.refresh_token.clone())?;
                account.apply_token_grant(&grant, Utc::now());
                Ok(account)
            }
        }
    }
}
