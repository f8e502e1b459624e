use crate::utils::error::{MarketError, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

const DATA_URL_PREFIX: &str = "data:";
const BASE64_MARKER: &str = ";base64,";
const FALLBACK_MIME_TYPE: &str = "image/jpeg";

/// 已編碼的影像內容，可直接傳送給推論服務或存放在 listing 上
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImagePayload {
    mime_type: String,
    data: String,
}

impl ImagePayload {
    pub fn from_bytes(mime_type: impl Into<String>, bytes: &[u8]) -> Self {
        Self {
            mime_type: mime_type.into(),
            data: STANDARD.encode(bytes),
        }
    }

    /// 解析 `data:<mime>;base64,<data>`；沒有前綴的字串視為 JPEG 的 base64
    pub fn from_data_url(value: &str) -> Result<Self> {
        let (mime_type, data) = match value.strip_prefix(DATA_URL_PREFIX) {
            Some(rest) => {
                let (mime, data) = rest.split_once(BASE64_MARKER).ok_or_else(|| {
                    MarketError::unsupported("data URL is not base64 encoded")
                })?;
                if !mime.starts_with("image/") {
                    return Err(MarketError::unsupported(format!(
                        "data URL has non-image type '{}'",
                        mime
                    )));
                }
                (mime.to_string(), data)
            }
            None => (FALLBACK_MIME_TYPE.to_string(), value),
        };

        if data.is_empty() {
            return Err(MarketError::unsupported("image data is empty"));
        }
        STANDARD
            .decode(data)
            .map_err(|e| MarketError::unsupported(format!("invalid base64 data: {}", e)))?;

        Ok(Self {
            mime_type,
            data: data.to_string(),
        })
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn base64_data(&self) -> &str {
        &self.data
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn to_data_url(&self) -> String {
        format!(
            "{}{}{}{}",
            DATA_URL_PREFIX, self.mime_type, BASE64_MARKER, self.data
        )
    }

    pub fn decode_bytes(&self) -> Result<Vec<u8>> {
        STANDARD
            .decode(&self.data)
            .map_err(|e| MarketError::unsupported(format!("invalid base64 data: {}", e)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Condition {
    #[serde(rename = "New")]
    New,
    #[serde(rename = "Like New")]
    LikeNew,
    #[serde(rename = "Good")]
    #[default]
    Good,
    #[serde(rename = "Fair")]
    Fair,
}

impl Condition {
    pub const ALL: [Condition; 4] = [Self::New, Self::LikeNew, Self::Good, Self::Fair];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "New",
            Self::LikeNew => "Like New",
            Self::Good => "Good",
            Self::Fair => "Fair",
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Condition {
    type Err = MarketError;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_lowercase().replace(['-', '_'], " ");
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().to_lowercase() == normalized)
            .ok_or_else(|| {
                MarketError::validation(
                    "condition",
                    format!("'{}' is not one of New, Like New, Good, Fair", s),
                )
            })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub price: f64,
    pub category: String,
    pub condition: Condition,
    pub image: ImagePayload,
    pub seller_id: String,
    pub seller_name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

/// 推論服務回傳的結構化結果，只在合併進草稿前短暫存在
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AIAnalysisResult {
    pub title: String,
    pub description: String,
    pub suggested_price: f64,
    pub category: String,
}

impl AIAnalysisResult {
    /// 四捨五入到整數盧比
    pub fn rounded_price(&self) -> u64 {
        let rounded = self.suggested_price.round();
        if rounded.is_finite() && rounded > 0.0 {
            rounded as u64
        } else {
            0
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = MarketError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "light" => Ok(Self::Light),
            "dark" => Ok(Self::Dark),
            other => Err(MarketError::validation(
                "theme",
                format!("'{}' is not light or dark", other),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_url_parsing() {
        let payload = ImagePayload::from_bytes("image/png", &[1, 2, 3, 4]);
        let parsed = ImagePayload::from_data_url(&payload.to_data_url()).unwrap();
        assert_eq!(parsed.mime_type(), "image/png");
        assert_eq!(parsed.decode_bytes().unwrap(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_bare_base64_is_treated_as_jpeg() {
        let parsed = ImagePayload::from_data_url("AQIDBA==").unwrap();
        assert_eq!(parsed.mime_type(), "image/jpeg");
        assert_eq!(parsed.base64_data(), "AQIDBA==");
    }

    #[test]
    fn test_invalid_data_url_rejected() {
        assert!(ImagePayload::from_data_url("").is_err());
        assert!(ImagePayload::from_data_url("data:text/plain;base64,AQID").is_err());
        assert!(ImagePayload::from_data_url("data:image/png,AQID").is_err());
        assert!(ImagePayload::from_data_url("not base64 !!").is_err());
    }

    #[test]
    fn test_condition_parsing() {
        assert_eq!("like new".parse::<Condition>().unwrap(), Condition::LikeNew);
        assert_eq!("Like-New".parse::<Condition>().unwrap(), Condition::LikeNew);
        assert_eq!("FAIR".parse::<Condition>().unwrap(), Condition::Fair);
        assert!("broken".parse::<Condition>().is_err());
        assert_eq!(Condition::default(), Condition::Good);
        assert_eq!(
            serde_json::to_string(&Condition::LikeNew).unwrap(),
            "\"Like New\""
        );
    }

    #[test]
    fn test_rounded_price() {
        let mut result = AIAnalysisResult {
            title: "Kindle".to_string(),
            description: "Paperwhite".to_string(),
            suggested_price: 4499.5,
            category: "E-Readers".to_string(),
        };
        assert_eq!(result.rounded_price(), 4500);

        result.suggested_price = 4499.49;
        assert_eq!(result.rounded_price(), 4499);
    }

    #[test]
    fn test_analysis_result_wire_names() {
        let json = r#"{"title":"A","description":"B","suggestedPrice":1200,"category":"Audio"}"#;
        let result: AIAnalysisResult = serde_json::from_str(json).unwrap();
        assert_eq!(result.suggested_price, 1200.0);

        let missing = r#"{"title":"A","description":"B","category":"Audio"}"#;
        assert!(serde_json::from_str::<AIAnalysisResult>(missing).is_err());
    }

    #[test]
    fn test_theme_round_trip_strings() {
        assert_eq!("dark".parse::<Theme>().unwrap(), Theme::Dark);
        assert_eq!(Theme::Light.toggled(), Theme::Dark);
        assert!("sepia".parse::<Theme>().is_err());
    }
}
