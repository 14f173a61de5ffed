use serde_json::json;

use rewardloop_domain::notification::{ContentType, PushMessage};

impl super::PushApiSender {
    /// Build the delivery payload: `{recipients, content, contentType}` plus
    /// the sender's app token and a short summary line.
    pub(super) fn build_payload(
        &self,
        recipients: &[String],
        message: &PushMessage,
    ) -> serde_json::Value {
        json!({
            "appToken": self.config.app_token,
            "uids": recipients,
            "summary": summary_line(&message.title),
            "content": message.content,
            "contentType": content_type_code(message.content_type),
        })
    }
}

/// Wire codes used by the push collaborator.
fn content_type_code(content_type: ContentType) -> u8 {
    match content_type {
        ContentType::Text => 1,
        ContentType::Markdown => 3,
    }
}

/// The collaborator truncates long summaries; cut cleanly ourselves.
fn summary_line(title: &str) -> String {
    const MAX_CHARS: usize = 100;
    let cleaned = title.trim().replace('\n', " ");
    if cleaned.chars().count() <= MAX_CHARS {
        cleaned
    } else {
        let mut out: String = cleaned.chars().take(MAX_CHARS).collect();
        out.push_str("...");
        out
    }
}
