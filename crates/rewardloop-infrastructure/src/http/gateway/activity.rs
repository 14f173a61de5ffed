use log::debug;
use serde_json::json;

use rewardloop_domain::gateway::{ActivityKind, ActivityOutcome, ApiError};

use super::super::client::map_reqwest_error;
use super::wire::ActivityBody;

impl super::HttpRewardsGateway {
    /// Submit one operation through the generic activity envelope.
    pub(super) async fn request_activity(
        &self,
        access_token: &str,
        kind: ActivityKind,
    ) -> Result<ActivityOutcome, ApiError> {
        let payload = json!({
            "amount": 1,
            "type": kind.activity_type(),
            "attributes": { "offerid": kind.attributes() },
            "id": idempotency_id(),
            "country": self.config.country,
            "channel": self.config.channel,
        });

        let response = self
            .http
            .inner()
            .post(&self.config.activity_url)
            .bearer_auth(access_token)
            .json(&payload)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let body = self.check_response(response).await?;
        let parsed: ActivityBody =
            serde_json::from_str(&body).map_err(|e| ApiError::Decode(e.to_string()))?;

        let already_claimed = parsed
            .message
            .as_deref()
            .map(|m| m.to_lowercase().contains("already"))
            .unwrap_or(false);

        debug!(
            "🎯 Activity {}: +{} points (already claimed: {})",
            kind, parsed.points, already_claimed
        );

        Ok(ActivityOutcome {
            points: parsed.points,
            already_claimed,
        })
    }
}

/// Fresh random token per submission; the remote dedupes on it.
fn idempotency_id() -> String {
    use rand::Rng;
    let mut rng = rand::thread_rng();
    (0..32)
        .map(|_| {
            let idx = rng.gen_range(0..16u32);
            char::from_digit(idx, 16).unwrap_or('0')
        })
        .collect()
}
