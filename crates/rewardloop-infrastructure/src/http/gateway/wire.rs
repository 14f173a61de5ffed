use serde::Deserialize;

use rewardloop_domain::gateway::{Promotion, PromotionKind};

#[derive(Debug, Deserialize)]
pub(super) struct TokenGrantBody {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
}

#[derive(Debug, Deserialize)]
pub(super) struct DashboardBody {
    #[serde(default)]
    pub balance: i64,
    #[serde(default)]
    pub promotions: Vec<PromotionBody>,
}

#[derive(Debug, Deserialize)]
pub(super) struct PromotionBody {
    #[serde(rename = "offerId", default)]
    pub offer_id: String,
    #[serde(rename = "class", default)]
    pub content_class: String,
    #[serde(default)]
    pub progress: u32,
    #[serde(default)]
    pub max: u32,
    #[serde(default)]
    pub points: i64,
    #[serde(default)]
    pub complete: bool,
}

#[derive(Debug, Deserialize)]
pub(super) struct ActivityBody {
    #[serde(default)]
    pub points: i64,
    #[serde(default)]
    pub message: Option<String>,
}

/// Map an offer to a typed promotion kind by explicit offer-id/content-class
/// patterns. Unmatched offers become `Unknown` rather than guessing from
/// unrelated fields.
pub(super) fn classify_promotion(offer_id: &str, content_class: &str) -> PromotionKind {
    let offer = offer_id.to_lowercase();
    let class = content_class.to_lowercase();
    let matches = |needle: &str| offer.contains(needle) || class.contains(needle);

    if matches("daily_set") || matches("dailyset") {
        PromotionKind::DailySet
    } else if matches("checkin") || matches("check_in") || matches("sign") {
        PromotionKind::DailyCheckIn
    } else if matches("mobile") || matches("app_bonus") || matches("appbonus") {
        PromotionKind::MobileBonus
    } else if matches("read") || matches("article") {
        PromotionKind::ReadArticle
    } else {
        PromotionKind::Unknown
    }
}

impl PromotionBody {
    pub fn into_promotion(self) -> Promotion {
        let kind = classify_promotion(&self.offer_id, &self.content_class);
        Promotion {
            offer_id: self.offer_id,
            kind,
            progress: self.progress,
            max: self.max,
            points: self.points,
            complete: self.complete,
        }
    }
}
