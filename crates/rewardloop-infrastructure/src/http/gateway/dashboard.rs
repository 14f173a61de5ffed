use chrono::Utc;
use log::debug;
use reqwest::header;

use rewardloop_domain::gateway::{
    ApiError, DashboardSnapshot, PromotionKind, TaskProgress,
};

use super::super::client::map_reqwest_error;
use super::wire::DashboardBody;

impl super::HttpRewardsGateway {
    pub(super) async fn request_dashboard(
        &self,
        access_token: &str,
    ) -> Result<DashboardSnapshot, ApiError> {
        let response = self
            .http
            .inner()
            .get(&self.config.dashboard_url)
            .bearer_auth(access_token)
            .header(
                header::ACCEPT,
                header::HeaderValue::from_static("application/json, text/plain, */*"),
            )
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let body = self.check_response(response).await?;
        let parsed: DashboardBody =
            serde_json::from_str(&body).map_err(|e| ApiError::Decode(e.to_string()))?;

        let promotions: Vec<_> = parsed
            .promotions
            .into_iter()
            .map(|p| p.into_promotion())
            .collect();

        let read = promotions
            .iter()
            .find(|p| p.kind == PromotionKind::ReadArticle)
            .map(|p| TaskProgress {
                progress: p.progress,
                max: p.max,
            })
            .unwrap_or_default();

        let daily_set = promotions
            .iter()
            .find(|p| p.kind == PromotionKind::DailySet)
            .map(|p| TaskProgress {
                progress: p.progress,
                max: p.max,
            })
            .unwrap_or_default();

        let check_in_done = promotions
            .iter()
            .find(|p| p.kind == PromotionKind::DailyCheckIn)
            .map(|p| p.complete)
            .unwrap_or(false);

        debug!(
            "📈 Dashboard: {} points, read {}/{}, check-in done: {}",
            parsed.balance, read.progress, read.max, check_in_done
        );

        Ok(DashboardSnapshot {
            total_points: parsed.balance,
            check_in_done,
            read,
            daily_set,
            promotions,
            fetched_at: Utc::now(),
        })
    }
}
