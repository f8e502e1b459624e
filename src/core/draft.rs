use crate::core::{AIAnalysisResult, Condition, ImagePayload, Listing, User};
use crate::utils::error::{MarketError, Result};
use chrono::Utc;
use uuid::Uuid;

const ANONYMOUS_SELLER_ID: &str = "anonymous";
const ANONYMOUS_SELLER_NAME: &str = "Student";

/// 每次送出分析請求時發出的序號；只有最新的序號可以寫回草稿
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestToken(u64);

impl RequestToken {
    pub fn generation(&self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EnrichmentOutcome {
    /// 結果已合併進草稿
    Applied,
    /// 已有較新的請求，結果被丟棄
    Stale,
    /// 最新的請求失敗；草稿維持可編輯
    Failed(String),
}

/// 刊登表單的草稿狀態
#[derive(Debug, Clone, Default)]
pub struct ListingDraft {
    pub title: String,
    pub description: String,
    pub price: String,
    pub category: String,
    pub condition: Condition,
    image: Option<ImagePayload>,
    generation: u64,
    pending: Option<RequestToken>,
}

impl ListingDraft {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn image(&self) -> Option<&ImagePayload> {
        self.image.as_ref()
    }

    pub fn set_image(&mut self, image: ImagePayload) {
        self.image = Some(image);
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn pending_token(&self) -> Option<RequestToken> {
        self.pending
    }

    /// 覆寫 title/description/category/price，condition 不動
    pub fn apply_enrichment(&mut self, result: &AIAnalysisResult) {
        self.title = result.title.clone();
        self.description = result.description.clone();
        self.category = result.category.clone();
        self.price = result.rounded_price().to_string();
    }

    pub fn begin_enrichment(&mut self) -> RequestToken {
        self.generation += 1;
        let token = RequestToken(self.generation);
        self.pending = Some(token);
        token
    }

    pub fn complete_enrichment(
        &mut self,
        token: RequestToken,
        result: Result<AIAnalysisResult>,
    ) -> EnrichmentOutcome {
        if token.0 != self.generation {
            tracing::debug!(
                "Discarding stale enrichment #{} (current #{})",
                token.0,
                self.generation
            );
            return EnrichmentOutcome::Stale;
        }

        self.pending = None;
        match result {
            Ok(analysis) => {
                self.apply_enrichment(&analysis);
                EnrichmentOutcome::Applied
            }
            Err(e) => {
                tracing::warn!("AI analysis failed, draft left for manual entry: {}", e);
                EnrichmentOutcome::Failed(e.to_string())
            }
        }
    }

    /// 清空草稿；序號持續遞增，先前發出的請求一律視為過期
    pub fn clear(&mut self) {
        *self = Self {
            generation: self.generation + 1,
            ..Self::default()
        };
    }

    pub fn is_submittable(&self) -> bool {
        self.image.is_some() && self.pending.is_none()
    }

    pub fn parsed_price(&self) -> Option<f64> {
        self.price
            .trim()
            .replace(',', "")
            .parse::<f64>()
            .ok()
            .filter(|p| p.is_finite())
    }

    /// 表單層級的檢查：照片優先，其次是必填欄位與價格
    pub fn validate_for_publish(&self) -> Result<()> {
        if self.image.is_none() {
            return Err(MarketError::validation("image", "a photo is required"));
        }
        if self.is_pending() {
            return Err(MarketError::validation(
                "image",
                "AI analysis is still running",
            ));
        }
        if self.title.trim().is_empty() {
            return Err(MarketError::validation("title", "title is required"));
        }
        if self.category.trim().is_empty() {
            return Err(MarketError::validation("category", "category is required"));
        }
        match self.parsed_price() {
            Some(price) if price > 0.0 => Ok(()),
            _ => Err(MarketError::validation(
                "price",
                format!("'{}' is not a positive amount", self.price),
            )),
        }
    }

    /// 只有缺照片時會失敗；無法解析的價格記為 0
    pub fn to_listing(&self, seller: Option<&User>) -> Result<Listing> {
        let image = self
            .image
            .clone()
            .ok_or_else(|| MarketError::validation("image", "a photo is required"))?;

        let (seller_id, seller_name) = match seller {
            Some(user) => (user.id.clone(), user.name.clone()),
            None => (
                ANONYMOUS_SELLER_ID.to_string(),
                ANONYMOUS_SELLER_NAME.to_string(),
            ),
        };

        Ok(Listing {
            id: Uuid::new_v4(),
            title: self.title.trim().to_string(),
            description: self.description.trim().to_string(),
            price: self.parsed_price().unwrap_or(0.0),
            category: self.category.trim().to_string(),
            condition: self.condition,
            image,
            seller_id,
            seller_name,
            created_at: Utc::now(),
        })
    }
}
