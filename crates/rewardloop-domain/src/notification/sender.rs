use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::shared::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    Text,
    Markdown,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Text => "text",
            ContentType::Markdown => "markdown",
        }
    }
}

/// Preformatted report block handed to the push collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushMessage {
    pub title: String,
    pub content: String,
    pub content_type: ContentType,
}

impl PushMessage {
    pub fn markdown(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            content_type: ContentType::Markdown,
        }
    }

    pub fn text(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            content_type: ContentType::Text,
        }
    }
}

/// Push collaborator interface: delivery to a recipient list.
/// Delivery is at-most-once from our side; the remote offers no stronger
/// guarantee.
#[async_trait]
pub trait PushSender: Send + Sync {
    async fn send(&self, recipients: &[String], message: &PushMessage) -> Result<(), DomainError>;

    /// Connectivity probe used when a target is configured.
    async fn test(&self) -> Result<(), DomainError>;
}
