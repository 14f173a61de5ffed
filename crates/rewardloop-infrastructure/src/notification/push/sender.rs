use async_trait::async_trait;

use rewardloop_domain::notification::{PushMessage, PushSender};
use rewardloop_domain::shared::DomainError;

#[async_trait]
impl PushSender for super::PushApiSender {
    async fn send(&self, recipients: &[String], message: &PushMessage) -> Result<(), DomainError> {
        if recipients.is_empty() {
            return Err(DomainError::InvalidInput(
                "Push delivery needs at least one recipient".to_string(),
            ));
        }

        let payload = self.build_payload(recipients, message);

        let response = self
            .client
            .post(&self.config.api_url)
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                DomainError::Infrastructure(format!("Failed to send push notification: {e}"))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(DomainError::Infrastructure(format!(
                "Push API failed with status {status}: {body}"
            )));
        }

        // The collaborator reports per-request errors inside a 200 envelope.
        let resp_body: serde_json::Value = response.json().await.map_err(|e| {
            DomainError::Infrastructure(format!("Failed to parse push response: {e}"))
        })?;

        if let Some(code) = resp_body.get("code").and_then(|c| c.as_i64()) {
            if code != 0 {
                let msg = resp_body
                    .get("msg")
                    .and_then(|m| m.as_str())
                    .unwrap_or("Unknown error");
                return Err(DomainError::Infrastructure(format!(
                    "Push API error code {code}: {msg}"
                )));
            }
        }

        Ok(())
    }

    async fn test(&self) -> Result<(), DomainError> {
        let message = PushMessage::text(
            "RewardLoop test notification",
            "If you can read this, the push channel is configured correctly.",
        );
        // A connectivity probe has no account context; deliver to the
        // sender's own app feed by passing the app token as recipient.
        self.send(&[self.config.app_token.clone()], &message).await
    }
}
