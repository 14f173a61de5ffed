use log::info;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use rewardloop_domain::shared::DomainError;

/// One configured sync remote: put/get files under a namespaced folder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloudSyncConfig {
    /// Remote service root, e.g. `https://dav.example.com/dav`.
    pub base_url: String,
    pub username: String,
    pub password: String,
    /// Namespace folder all uploads live under.
    #[serde(default = "default_remote_folder")]
    pub remote_folder: String,
}

fn default_remote_folder() -> String {
    "rewardloop".to_string()
}

/// Cloud-sync collaborator over plain authenticated PUT/GET.
pub struct CloudSyncClient {
    client: reqwest::Client,
    config: CloudSyncConfig,
}

impl CloudSyncClient {
    pub fn new(config: CloudSyncConfig) -> Result<Self, DomainError> {
        url::Url::parse(&config.base_url).map_err(|e| {
            DomainError::Validation(format!("Invalid sync base URL {}: {e}", config.base_url))
        })?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(20))
            .build()
            .map_err(|e| DomainError::Infrastructure(format!("Create sync client: {e}")))?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &CloudSyncConfig {
        &self.config
    }

    fn url_for(&self, path: &str) -> String {
        format!(
            "{}/{}/{}",
            self.config.base_url.trim_end_matches('/'),
            self.config.remote_folder.trim_matches('/'),
            path.trim_start_matches('/')
        )
    }

    pub async fn put(&self, path: &str, bytes: Vec<u8>) -> Result<(), DomainError> {
        let url = self.url_for(path);
        let response = self
            .client
            .put(&url)
            .basic_auth(&self.config.username, Some(&self.config.password))
            .body(bytes)
            .send()
            .await
            .map_err(|e| DomainError::Infrastructure(format!("Sync upload {url}: {e}")))?;

        if !response.status().is_success() {
            return Err(DomainError::Infrastructure(format!(
                "Sync upload {url} failed with status {}",
                response.status()
            )));
        }

        info!("☁️  Uploaded {}", url);
        Ok(())
    }

    /// `None` when the remote file does not exist yet.
    pub async fn get(&self, path: &str) -> Result<Option<Vec<u8>>, DomainError> {
        let url = self.url_for(path);
        let response = self
            .client
            .get(&url)
            .basic_auth(&self.config.username, Some(&self.config.password))
            .send()
            .await
            .map_err(|e| DomainError::Infrastructure(format!("Sync download {url}: {e}")))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(DomainError::Infrastructure(format!(
                "Sync download {url} failed with status {}",
                response.status()
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| DomainError::Infrastructure(format!("Sync download {url}: {e}")))?;
        Ok(Some(bytes.to_vec()))
    }
}
